//! Authority strategy hooks that customize token exchanges.
//!
//! Implementations classify token endpoint failures and decorate outgoing form bodies
//! without tying the protocol exchange to any particular HTTP client.

// self
use crate::{_prelude::*, authority::descriptor::GrantType};

/// Strategy hook that lets deployments decorate requests and classify errors.
///
/// Only `classify_token_error` is required; `augment_token_request` defaults to a no-op.
pub trait AuthorityStrategy: Send + Sync {
	/// Maps a failed token endpoint response into an escalation category.
	fn classify_token_error(&self, ctx: &AuthorityErrorContext) -> AuthorityErrorKind;

	/// Adds custom form parameters before dispatch (e.g. `claims`, `slice`).
	fn augment_token_request(&self, _grant: GrantType, _form: &mut BTreeMap<String, String>) {}
}

/// Canonical token endpoint failure categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorityErrorKind {
	/// The user must sign in again; the engine escalates.
	InteractionRequired,
	/// The presented grant is expired or revoked; the engine escalates.
	InvalidGrant,
	/// Client is unknown or not allowed to use the grant.
	UnauthorizedClient,
	/// Failure is temporary; surfaced to the caller without retry.
	Transient,
	/// Any other rejection.
	Fatal,
}

/// Primitive view of a failed token endpoint response handed to strategies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorityErrorContext {
	/// Grant type associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code, when available.
	pub http_status: Option<u16>,
	/// OAuth `error` field.
	pub oauth_error: Option<String>,
	/// OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Authority-specific `suberror` field (e.g. `consent_required`, `bad_token`).
	pub suberror: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
	/// Indicates whether the failure originated from the transport layer.
	pub network_error: bool,
}
impl AuthorityErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self {
			grant_type,
			http_status: None,
			oauth_error: None,
			error_description: None,
			suberror: None,
			body_preview: None,
			network_error: false,
		}
	}

	/// Convenience constructor for transport-level failures.
	pub fn network_failure(grant_type: GrantType) -> Self {
		let mut ctx = Self::new(grant_type);

		ctx.network_error = true;

		ctx
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth `error` code.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds the `suberror` field.
	pub fn with_suberror(mut self, suberror: impl Into<String>) -> Self {
		self.suberror = Some(suberror.into());

		self
	}

	/// Adds a truncated body preview.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default strategy following RFC 6749 §5.2 and OpenID Connect error codes.
///
/// Structured OAuth fields win over the HTTP status; network failures are transient.
#[derive(Debug, Default)]
pub struct DefaultAuthorityStrategy;
impl Display for DefaultAuthorityStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-authority-strategy")
	}
}
impl AuthorityStrategy for DefaultAuthorityStrategy {
	fn classify_token_error(&self, ctx: &AuthorityErrorContext) -> AuthorityErrorKind {
		if ctx.network_error {
			return AuthorityErrorKind::Transient;
		}
		if let Some(kind) = ctx.oauth_error.as_deref().and_then(classify_oauth_error) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= AuthorityErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(AuthorityErrorContext::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn classify_oauth_error(value: &str) -> Option<AuthorityErrorKind> {
	match value.to_ascii_lowercase().as_str() {
		"interaction_required" | "login_required" | "consent_required" =>
			Some(AuthorityErrorKind::InteractionRequired),
		"invalid_grant" => Some(AuthorityErrorKind::InvalidGrant),
		"invalid_client" | "unauthorized_client" => Some(AuthorityErrorKind::UnauthorizedClient),
		"temporarily_unavailable" | "server_error" => Some(AuthorityErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> AuthorityErrorKind {
	match status {
		Some(401) => AuthorityErrorKind::UnauthorizedClient,
		Some(429) => AuthorityErrorKind::Transient,
		Some(code) if code >= 500 => AuthorityErrorKind::Transient,
		_ => AuthorityErrorKind::Fatal,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn classify(ctx: AuthorityErrorContext) -> AuthorityErrorKind {
		DefaultAuthorityStrategy.classify_token_error(&ctx)
	}

	#[test]
	fn oauth_codes_drive_classification() {
		let refresh = || AuthorityErrorContext::new(GrantType::RefreshToken).with_http_status(400);

		assert_eq!(
			classify(refresh().with_oauth_error("interaction_required")),
			AuthorityErrorKind::InteractionRequired
		);
		assert_eq!(classify(refresh().with_oauth_error("Consent_Required")), AuthorityErrorKind::InteractionRequired);
		assert_eq!(classify(refresh().with_oauth_error("invalid_grant")), AuthorityErrorKind::InvalidGrant);
		assert_eq!(
			classify(refresh().with_oauth_error("unauthorized_client")),
			AuthorityErrorKind::UnauthorizedClient
		);
		assert_eq!(classify(refresh().with_oauth_error("invalid_request")), AuthorityErrorKind::Fatal);
	}

	#[test]
	fn status_codes_are_the_fallback() {
		let code = || AuthorityErrorContext::new(GrantType::AuthorizationCode);

		assert_eq!(classify(code().with_http_status(401)), AuthorityErrorKind::UnauthorizedClient);
		assert_eq!(classify(code().with_http_status(429)), AuthorityErrorKind::Transient);
		assert_eq!(classify(code().with_http_status(503)), AuthorityErrorKind::Transient);
		assert_eq!(classify(code().with_http_status(400)), AuthorityErrorKind::Fatal);
		assert_eq!(
			classify(AuthorityErrorContext::network_failure(GrantType::Saml2Bearer)),
			AuthorityErrorKind::Transient
		);
	}

	#[test]
	fn body_previews_are_truncated() {
		let ctx = AuthorityErrorContext::new(GrantType::RefreshToken).with_body_preview("x".repeat(400));
		let preview = ctx.body_preview.expect("Preview should be recorded.");

		assert_eq!(preview.chars().count(), AuthorityErrorContext::BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
