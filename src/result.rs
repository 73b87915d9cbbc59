//! Terminal acquisition outcomes delivered to callers.

// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CacheEntryBuilderError, CorrelationId, TokenSecret, UserInfo},
	error::{ConfigError, ProtocolErrorKind},
};

/// Exactly one of these is produced by every acquisition.
#[derive(Debug)]
pub enum AuthenticationResult {
	/// Tokens were obtained.
	Succeeded(AuthenticationToken),
	/// The acquisition failed.
	Failed(AuthenticationError),
	/// The user dismissed the login surface or the broker UI.
	Cancelled {
		/// Correlation id of the acquisition.
		correlation_id: CorrelationId,
	},
}
impl AuthenticationResult {
	/// Wraps an engine error with the acquisition's correlation id.
	pub fn failed(correlation_id: CorrelationId, error: impl Into<Error>) -> Self {
		Self::Failed(AuthenticationError { correlation_id, error: error.into() })
	}

	/// Returns `true` for [`Succeeded`](Self::Succeeded).
	pub fn is_succeeded(&self) -> bool {
		matches!(self, Self::Succeeded(_))
	}

	/// Returns `true` for [`Cancelled`](Self::Cancelled).
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled { .. })
	}

	/// Issued token, if the acquisition succeeded.
	pub fn token(&self) -> Option<&AuthenticationToken> {
		match self {
			Self::Succeeded(token) => Some(token),
			_ => None,
		}
	}

	/// Failure, if the acquisition failed.
	pub fn error(&self) -> Option<&AuthenticationError> {
		match self {
			Self::Failed(error) => Some(error),
			_ => None,
		}
	}

	/// Correlation id carried by every variant.
	pub fn correlation_id(&self) -> CorrelationId {
		match self {
			Self::Succeeded(token) => token.correlation_id,
			Self::Failed(error) => error.correlation_id,
			Self::Cancelled { correlation_id } => *correlation_id,
		}
	}
}

/// Where an issued token came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
	/// Served from the cache without a network call.
	Cache,
	/// Obtained by redeeming a refresh token.
	RefreshToken,
	/// Returned by the broker process.
	Broker,
	/// Obtained through the interactive sign-in.
	Interactive,
	/// Obtained by redeeming an assertion.
	Assertion,
}

/// Successful acquisition payload.
#[derive(Clone, Debug)]
pub struct AuthenticationToken {
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Token type (usually `Bearer`).
	pub token_type: String,
	/// Access token expiry.
	pub expires_on: OffsetDateTime,
	/// Whether a refresh token was cached alongside the access token.
	pub refresh_token_present: bool,
	/// Raw id token, if any.
	pub id_token: Option<String>,
	/// User the token was issued for.
	pub user_info: Option<UserInfo>,
	/// Tenant that issued the token.
	pub tenant_id: Option<String>,
	/// Path that produced the token.
	pub source: TokenSource,
	/// Correlation id of the acquisition.
	pub correlation_id: CorrelationId,
}
impl AuthenticationToken {
	/// Builds the caller-facing token from a cache entry holding a usable access token.
	pub fn from_entry(
		entry: CacheEntry,
		source: TokenSource,
		correlation_id: CorrelationId,
	) -> Result<Self> {
		let tenant_id = entry.tenant_id().map(str::to_owned);
		let (Some(access_token), Some(expires_on)) = (entry.access_token, entry.expires_on) else {
			return Err(ConfigError::from(CacheEntryBuilderError::MissingToken).into());
		};

		Ok(Self {
			access_token,
			token_type: entry.token_type,
			expires_on,
			refresh_token_present: entry.refresh_token.is_some(),
			id_token: entry.id_token,
			user_info: entry.user_info,
			tenant_id,
			source,
			correlation_id,
		})
	}
}

/// Caller-facing failure classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Missing or invalid request input.
	Parameter,
	/// The authority requires the user to sign in again.
	InteractionRequired,
	/// Silent acquisition could not proceed without UI.
	UserInputNeeded,
	/// The client is unknown or not allowed to use the grant.
	UnauthorizedClient,
	/// The authority rejected the exchange or is temporarily failing.
	Server,
	/// Network or I/O failure.
	Transport,
	/// Broker failure.
	Broker,
	/// Cache storage failure.
	Cache,
	/// Local configuration problem.
	Configuration,
	/// Login surface failure.
	Presentation,
	/// The token belongs to another user.
	UserMismatch,
	/// Several cached users match.
	MultipleUsers,
	/// Authorization response state mismatch.
	StateMismatch,
}

/// Failure plus the correlation id of the acquisition that produced it.
#[derive(Debug, ThisError)]
#[error("{error} (correlation id {correlation_id})")]
pub struct AuthenticationError {
	/// Correlation id of the acquisition.
	pub correlation_id: CorrelationId,
	/// Underlying engine error.
	#[source]
	pub error: Error,
}
impl AuthenticationError {
	/// Classifies the underlying error.
	pub fn kind(&self) -> ErrorKind {
		match &self.error {
			Error::Parameter(_) => ErrorKind::Parameter,
			Error::Protocol(err) => match err.kind {
				ProtocolErrorKind::InteractionRequired => ErrorKind::InteractionRequired,
				ProtocolErrorKind::UnauthorizedClient => ErrorKind::UnauthorizedClient,
				ProtocolErrorKind::InvalidGrant | ProtocolErrorKind::Fatal => ErrorKind::Server,
			},
			Error::Transient(_) => ErrorKind::Server,
			Error::Transport(_) => ErrorKind::Transport,
			Error::Broker(_) => ErrorKind::Broker,
			Error::Storage(_) => ErrorKind::Cache,
			Error::Config(_) => ErrorKind::Configuration,
			Error::Presentation { .. } => ErrorKind::Presentation,
			Error::UserInputNeeded => ErrorKind::UserInputNeeded,
			Error::UserMismatch { .. } => ErrorKind::UserMismatch,
			Error::MultipleUsers => ErrorKind::MultipleUsers,
			Error::StateMismatch => ErrorKind::StateMismatch,
		}
	}

	/// Human-readable description.
	pub fn detail(&self) -> String {
		self.error.to_string()
	}

	/// OAuth `error` code returned by the authority, if any.
	pub fn protocol_code(&self) -> Option<&str> {
		match &self.error {
			Error::Protocol(err) => err.code.as_deref(),
			Error::Broker(crate::broker::BrokerError::Failed { code, .. }) => code.as_deref(),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		authority::GrantType,
		error::{ParameterError, ProtocolError},
	};

	#[test]
	fn errors_expose_kind_code_and_correlation() {
		let correlation_id = CorrelationId::new_v4();
		let result = AuthenticationResult::failed(
			correlation_id,
			ProtocolError::new(
				ProtocolErrorKind::UnauthorizedClient,
				GrantType::AuthorizationCode,
				Some("unauthorized_client".into()),
				None,
				Some(400),
			),
		);
		let error = result.error().expect("Result should be a failure.");

		assert_eq!(error.kind(), ErrorKind::UnauthorizedClient);
		assert_eq!(error.protocol_code(), Some("unauthorized_client"));
		assert_eq!(result.correlation_id(), correlation_id);
		assert!(error.to_string().contains(&correlation_id.to_string()));
	}

	#[test]
	fn tokens_require_an_access_token() {
		let refresh_only = CacheEntry::builder()
			.refresh_token("R")
			.build()
			.expect("Refresh-only entry should build.");

		assert!(AuthenticationToken::from_entry(refresh_only, TokenSource::Cache, CorrelationId::new_v4()).is_err());

		let parameter = AuthenticationResult::failed(
			CorrelationId::new_v4(),
			ParameterError::Missing { field: "resource" },
		);

		assert_eq!(parameter.error().map(AuthenticationError::kind), Some(ErrorKind::Parameter));
	}
}
