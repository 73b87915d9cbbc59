//! Immutable cache entries and their expiry-aware status.

// self
use crate::{
	_prelude::*,
	auth::{UserInfo, token::secret::TokenSecret},
};

/// Usability of a cache entry at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
	/// The access token is present and outside the expiration buffer.
	Valid,
	/// The access token is missing or (nearly) expired but a refresh token is available.
	RefreshOnly,
	/// Neither a usable access token nor a refresh token is available.
	Unusable,
}

/// Errors produced by [`CacheEntryBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheEntryBuilderError {
	/// Neither an access token nor a refresh token was provided.
	#[error("An access token or a refresh token is required.")]
	MissingToken,
	/// An access token was provided without an expiry.
	#[error("Access tokens require an expiry via expires_on or expires_in.")]
	MissingExpiry,
	/// The relative expiry overflowed the supported date range.
	#[error("The expiry is outside the supported date range.")]
	ExpiryOutOfRange,
}

/// Tokens cached for one (authority, resource, client id, user) key.
#[derive(Clone, Serialize, Deserialize)]
pub struct CacheEntry {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Option<TokenSecret>,
	/// Token type reported by the authority (usually `Bearer`).
	pub token_type: String,
	/// Expiry instant of the access token.
	pub expires_on: Option<OffsetDateTime>,
	/// Refresh token secret, if the authority issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Raw `id_token` returned with the tokens.
	pub id_token: Option<String>,
	/// Identity decoded from the `id_token`.
	pub user_info: Option<UserInfo>,
	/// Instant the entry was produced.
	pub stored_at: OffsetDateTime,
}
impl CacheEntry {
	/// Returns a builder for constructing entries.
	pub fn builder() -> CacheEntryBuilder {
		CacheEntryBuilder::default()
	}

	/// Computes usability at `instant`, treating tokens that expire within `buffer` as expired.
	///
	/// A buffer that reaches past the supported date range counts as expired.
	pub fn status_at(&self, instant: OffsetDateTime, buffer: Duration) -> EntryStatus {
		let access_valid = match (&self.access_token, self.expires_on) {
			(Some(_), Some(expires_on)) =>
				instant.checked_add(buffer).is_some_and(|limit| limit < expires_on),
			_ => false,
		};

		if access_valid {
			EntryStatus::Valid
		} else if self.refresh_token.is_some() {
			EntryStatus::RefreshOnly
		} else {
			EntryStatus::Unusable
		}
	}

	/// Tenant that issued the tokens, if the `id_token` reported one.
	pub fn tenant_id(&self) -> Option<&str> {
		self.user_info.as_ref().and_then(|info| info.tenant_id.as_deref())
	}
}
impl Debug for CacheEntry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheEntry")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("expires_on", &self.expires_on)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
			.field("user_info", &self.user_info)
			.field("stored_at", &self.stored_at)
			.finish()
	}
}

/// Builder for [`CacheEntry`].
#[derive(Clone, Debug, Default)]
pub struct CacheEntryBuilder {
	access_token: Option<TokenSecret>,
	token_type: Option<String>,
	expires_on: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	refresh_token: Option<TokenSecret>,
	id_token: Option<String>,
	user_info: Option<UserInfo>,
	stored_at: Option<OffsetDateTime>,
}
impl CacheEntryBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token type (defaults to `Bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_on(mut self, instant: OffsetDateTime) -> Self {
		self.expires_on = Some(instant);

		self
	}

	/// Sets a relative expiry measured from the stored-at instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Keeps an existing refresh token secret.
	pub fn refresh_secret(mut self, secret: Option<TokenSecret>) -> Self {
		self.refresh_token = secret;

		self
	}

	/// Attaches the raw `id_token` and its decoded identity.
	pub fn id_token(mut self, raw: impl Into<String>, info: Option<UserInfo>) -> Self {
		self.id_token = Some(raw.into());
		self.user_info = info;

		self
	}

	/// Attaches a decoded identity without a raw `id_token`.
	pub fn user_info(mut self, info: UserInfo) -> Self {
		self.user_info = Some(info);

		self
	}

	/// Sets the stored-at instant (defaults to now).
	pub fn stored_at(mut self, instant: OffsetDateTime) -> Self {
		self.stored_at = Some(instant);

		self
	}

	/// Consumes the builder and produces a [`CacheEntry`].
	pub fn build(self) -> Result<CacheEntry, CacheEntryBuilderError> {
		if self.access_token.is_none() && self.refresh_token.is_none() {
			return Err(CacheEntryBuilderError::MissingToken);
		}

		let stored_at = self.stored_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_on = match (self.expires_on, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) =>
				Some(stored_at.checked_add(delta).ok_or(CacheEntryBuilderError::ExpiryOutOfRange)?),
			(None, None) => None,
		};

		if self.access_token.is_some() && expires_on.is_none() {
			return Err(CacheEntryBuilderError::MissingExpiry);
		}

		Ok(CacheEntry {
			access_token: self.access_token,
			token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
			expires_on,
			refresh_token: self.refresh_token,
			id_token: self.id_token,
			user_info: self.user_info,
			stored_at,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn status_honors_expiration_buffer() {
		let stored = macros::datetime!(2025-01-01 00:00 UTC);
		let entry = CacheEntry::builder()
			.access_token("access")
			.refresh_token("refresh")
			.stored_at(stored)
			.expires_in(Duration::hours(1))
			.build()
			.expect("Entry fixture should build.");
		let buffer = Duration::minutes(5);

		assert_eq!(entry.expires_on, Some(macros::datetime!(2025-01-01 01:00 UTC)));
		assert_eq!(entry.status_at(macros::datetime!(2025-01-01 00:30 UTC), buffer), EntryStatus::Valid);
		assert_eq!(
			entry.status_at(macros::datetime!(2025-01-01 00:56 UTC), buffer),
			EntryStatus::RefreshOnly
		);
		assert_eq!(
			entry.status_at(macros::datetime!(2025-01-01 02:00 UTC), Duration::ZERO),
			EntryStatus::RefreshOnly
		);
	}

	#[test]
	fn oversized_buffers_mark_tokens_expired() {
		let entry = CacheEntry::builder()
			.access_token("access")
			.refresh_token("refresh")
			.stored_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::hours(1))
			.build()
			.expect("Entry fixture should build.");

		assert_eq!(
			entry.status_at(macros::datetime!(2025-01-01 00:10 UTC), Duration::MAX),
			EntryStatus::RefreshOnly
		);
	}

	#[test]
	fn expired_entries_without_refresh_are_unusable() {
		let entry = CacheEntry::builder()
			.access_token("access")
			.stored_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::minutes(1))
			.build()
			.expect("Entry fixture should build.");

		assert_eq!(
			entry.status_at(macros::datetime!(2025-01-01 00:10 UTC), Duration::ZERO),
			EntryStatus::Unusable
		);
	}

	#[test]
	fn builder_validates_token_presence_and_expiry() {
		assert_eq!(
			CacheEntry::builder().build().expect_err("Empty entries must be rejected."),
			CacheEntryBuilderError::MissingToken
		);
		assert_eq!(
			CacheEntry::builder()
				.access_token("access")
				.build()
				.expect_err("Access tokens without expiry must be rejected."),
			CacheEntryBuilderError::MissingExpiry
		);

		let refresh_only = CacheEntry::builder()
			.refresh_token("refresh")
			.build()
			.expect("Refresh-only entries should build.");

		assert_eq!(refresh_only.token_type, "Bearer");
		assert_eq!(refresh_only.status_at(OffsetDateTime::now_utc(), Duration::ZERO), EntryStatus::RefreshOnly);
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let entry = CacheEntry::builder()
			.access_token("very-secret-access")
			.refresh_token("very-secret-refresh")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Entry fixture should build.");
		let rendered = format!("{entry:?}");

		assert!(!rendered.contains("very-secret"));
	}
}
