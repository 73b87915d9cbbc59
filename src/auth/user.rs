//! User identity: the identifier a caller asks for and the identity an `id_token` reports.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, auth::UserId};

/// How a [`UserIdentifier`] constrains the acquisition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIdentifierKind {
	/// Displayable sign-in name used as a login hint and cache key; another account may still
	/// sign in.
	#[default]
	OptionalDisplayableId,
	/// Displayable sign-in name the resulting token must belong to.
	RequiredDisplayableId,
	/// Immutable object id (`oid`) matched against cached users.
	UniqueId,
}

/// User a request targets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentifier {
	/// Identifier value.
	pub id: UserId,
	/// Matching policy.
	pub kind: UserIdentifierKind,
}
impl UserIdentifier {
	/// Creates an identifier with an explicit policy.
	pub fn new(id: UserId, kind: UserIdentifierKind) -> Self {
		Self { id, kind }
	}

	/// Displayable sign-in name used as a hint.
	pub fn optional_displayable(id: UserId) -> Self {
		Self::new(id, UserIdentifierKind::OptionalDisplayableId)
	}

	/// Displayable sign-in name that the token must match.
	pub fn required_displayable(id: UserId) -> Self {
		Self::new(id, UserIdentifierKind::RequiredDisplayableId)
	}

	/// Immutable object id.
	pub fn unique(id: UserId) -> Self {
		Self::new(id, UserIdentifierKind::UniqueId)
	}

	/// Returns `true` when the identifier is a sign-in name (and thus a cache key).
	pub fn is_displayable(&self) -> bool {
		!matches!(self.kind, UserIdentifierKind::UniqueId)
	}

	/// Sign-in name forwarded as `login_hint`, if displayable.
	pub fn login_hint(&self) -> Option<&str> {
		self.is_displayable().then_some(self.id.as_ref())
	}

	/// Checks whether a cached or freshly issued identity satisfies this identifier.
	pub fn matches(&self, info: &UserInfo) -> bool {
		let candidate = match self.kind {
			UserIdentifierKind::UniqueId => info.unique_id.as_deref(),
			_ => info.user_id.as_deref(),
		};

		candidate.is_some_and(|value| self.id.matches(value))
	}
}

/// Failures decoding an `id_token`.
#[derive(Debug, ThisError)]
pub enum IdTokenError {
	/// The token does not have a `header.payload[.signature]` shape.
	#[error("The id_token does not contain a payload segment.")]
	MissingPayload,
	/// The payload segment is not base64url.
	#[error("The id_token payload is not valid base64url.")]
	Encoding(#[from] base64::DecodeError),
	/// The payload is not a JSON claims object.
	#[error("The id_token payload is not a valid claims object.")]
	Claims(#[from] serde_json::Error),
}

/// Identity reported by the authority alongside the tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Displayable sign-in name (`upn`, `unique_name`, `email`, or `sub`).
	pub user_id: Option<String>,
	/// Immutable object id (`oid`, falling back to `sub`).
	pub unique_id: Option<String>,
	/// Tenant that issued the token (`tid`).
	pub tenant_id: Option<String>,
	/// Given name claim.
	pub given_name: Option<String>,
	/// Family name claim.
	pub family_name: Option<String>,
	/// Identity provider claim (`idp`), present for guest users.
	pub identity_provider: Option<String>,
}
impl UserInfo {
	/// Decodes the claims of an unverified `id_token`.
	///
	/// Signature validation is the authority's concern for tokens received directly over TLS
	/// from its token endpoint; only the payload is read here.
	pub fn from_id_token(raw: &str) -> Result<Self, IdTokenError> {
		let payload = raw.split('.').nth(1).filter(|segment| !segment.is_empty());
		let payload = payload.ok_or(IdTokenError::MissingPayload)?;
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
		let claims: IdTokenClaims = serde_json::from_slice(&bytes)?;

		Ok(claims.into())
	}
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
	#[serde(default)]
	upn: Option<String>,
	#[serde(default)]
	unique_name: Option<String>,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	sub: Option<String>,
	#[serde(default)]
	oid: Option<String>,
	#[serde(default)]
	tid: Option<String>,
	#[serde(default)]
	given_name: Option<String>,
	#[serde(default)]
	family_name: Option<String>,
	#[serde(default)]
	idp: Option<String>,
}
impl From<IdTokenClaims> for UserInfo {
	fn from(claims: IdTokenClaims) -> Self {
		let user_id = claims
			.upn
			.or(claims.unique_name)
			.or(claims.email)
			.or_else(|| claims.sub.clone());
		let unique_id = claims.oid.or(claims.sub);

		Self {
			user_id,
			unique_id,
			tenant_id: claims.tid,
			given_name: claims.given_name,
			family_name: claims.family_name,
			identity_provider: claims.idp,
		}
	}
}
