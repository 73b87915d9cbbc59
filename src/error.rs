//! Engine-level error taxonomy shared by requests, protocol exchanges, brokers, and stores.

// self
use crate::{_prelude::*, authority::GrantType};

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error carried inside failed authentication results.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Missing or invalid caller input; always detected before any network or UI work.
	#[error(transparent)]
	Parameter(#[from] ParameterError),
	/// Token endpoint rejected the exchange.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Temporary upstream failure; the engine never retries it.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Broker process failed or returned an unusable payload.
	#[error(transparent)]
	Broker(#[from] crate::broker::BrokerError),
	/// Cache storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Login surface failed for a reason other than user cancellation.
	#[error("The login surface failed: {message}.")]
	Presentation {
		/// Presenter-supplied failure description.
		message: String,
	},
	/// Silent acquisition could not complete without showing UI.
	#[error("User interaction is required to acquire a token.")]
	UserInputNeeded,
	/// A required user identity did not match the identity the token was issued for.
	#[error("Token was issued for `{actual}` but `{expected}` was required.")]
	UserMismatch {
		/// User identifier supplied on the request.
		expected: String,
		/// User identifier reported by the token endpoint.
		actual: String,
	},
	/// Several cached users match a request that did not name one.
	#[error("Multiple users are cached for this resource; supply a user identifier.")]
	MultipleUsers,
	/// Authorization redirect carried an unexpected `state` value.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}
impl Error {
	/// Returns `true` when the failure asks for user interaction, meaning the engine may
	/// escalate to the broker or interactive path.
	pub fn requires_interaction(&self) -> bool {
		match self {
			Self::Protocol(err) => err.kind.requires_interaction(),
			Self::UserInputNeeded => true,
			_ => false,
		}
	}
}

/// Caller input problems reported before any collaborator is touched.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ParameterError {
	/// A mandatory field was absent or empty.
	#[error("`{field}` must not be empty.")]
	Missing {
		/// Name of the missing field.
		field: &'static str,
	},
	/// A field was present but malformed.
	#[error("`{field}` is invalid: {reason}.")]
	Invalid {
		/// Name of the malformed field.
		field: &'static str,
		/// Validation failure description.
		reason: String,
	},
}
impl ParameterError {
	/// Name of the offending field.
	pub fn field(&self) -> &'static str {
		match self {
			Self::Missing { field } | Self::Invalid { field, .. } => field,
		}
	}
}

/// Sub-kinds of token endpoint rejections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolErrorKind {
	/// The authority wants the user to sign in again (`interaction_required`, `login_required`,
	/// `consent_required`).
	InteractionRequired,
	/// The presented grant (code, refresh token, assertion) is no longer valid.
	InvalidGrant,
	/// The client is unknown or not allowed to use the grant.
	UnauthorizedClient,
	/// Any other rejection; not recoverable by escalating.
	Fatal,
}
impl ProtocolErrorKind {
	/// Returns `true` when the next acquisition strategy can recover from this rejection.
	pub fn requires_interaction(self) -> bool {
		matches!(self, Self::InteractionRequired | Self::InvalidGrant)
	}
}

/// Token endpoint or authorize endpoint rejection.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ProtocolError {
	/// Classified rejection kind.
	pub kind: ProtocolErrorKind,
	/// Grant that was being exchanged.
	pub grant: GrantType,
	/// OAuth `error` code, when the authority supplied one.
	pub code: Option<String>,
	/// OAuth `error_description`, when the authority supplied one.
	pub description: Option<String>,
	/// HTTP status code, when available.
	pub status: Option<u16>,
	message: String,
}
impl ProtocolError {
	/// Creates a protocol error and renders its human-readable message.
	pub fn new(
		kind: ProtocolErrorKind,
		grant: GrantType,
		code: Option<String>,
		description: Option<String>,
		status: Option<u16>,
	) -> Self {
		let detail = description.as_deref().or(code.as_deref()).unwrap_or("no error details");
		let message = format!("Authority rejected the {grant} grant: {detail}.");

		Self { kind, grant, code, description, status, message }
	}
}

/// Configuration and validation failures raised by the engine.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Authority descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::authority::AuthorityDescriptorError),
	/// Authority does not enable the requested grant.
	#[error("Authority `{authority}` does not enable the {grant} grant.")]
	UnsupportedGrant {
		/// Authority URL.
		authority: String,
		/// Disabled grant label.
		grant: &'static str,
	},
	/// Request scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Cache entry builder validation failed.
	#[error("Unable to build cache entry.")]
	CacheEntryBuild(#[from] crate::auth::CacheEntryBuilderError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// The `id_token` returned with the tokens could not be decoded.
	#[error("The id_token is malformed.")]
	IdToken(#[from] crate::auth::IdTokenError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry at the caller's discretion).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Authority returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
