//! Broker bridge: eligibility checks and delegation to a system broker process.
//!
//! The broker is an out-of-process collaborator (an authenticator app, a platform account
//! manager) reached over IPC. The engine describes the request as a [`BrokerInvocation`],
//! the [`BrokerProcess`] implementation carries it across the process boundary, and the
//! broker answers with a serialized [`BrokerPayload`] or a [`BrokerError`].

// self
use crate::{
	_prelude::*,
	auth::{
		CacheEntry, ClientId, CorrelationId, PromptBehavior, ScopeSet, TokenSecret, UserIdentifier,
		UserInfo,
	},
	error::ConfigError,
};

/// Boxed future returned by [`BrokerProcess::invoke`].
pub type BrokerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BrokerError>> + 'a + Send>>;

/// Out-of-process broker collaborator.
pub trait BrokerProcess
where
	Self: Send + Sync,
{
	/// Reports whether the broker is installed on this device.
	fn is_installed(&self) -> bool {
		true
	}

	/// Reports whether the broker accepts this invocation (authority, client, version checks).
	fn can_handle(&self, invocation: &BrokerInvocation) -> bool;

	/// Runs the invocation in the broker process.
	fn invoke(&self, invocation: BrokerInvocation) -> BrokerFuture<'_, BrokerResponse>;
}

/// Broker failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum BrokerError {
	/// No broker is installed or reachable.
	#[error("The broker is unavailable.")]
	Unavailable,
	/// The broker refused the request.
	#[error("The broker declined the request: {reason}.")]
	Declined {
		/// Broker-supplied reason.
		reason: String,
	},
	/// The broker attempted the request and failed.
	#[error("The broker failed: {message}.")]
	Failed {
		/// Broker error code, if any.
		code: Option<String>,
		/// Broker-supplied description.
		message: String,
	},
	/// The broker response could not be decoded.
	#[error("The broker response is malformed: {reason}.")]
	Malformed {
		/// Decoder failure description.
		reason: String,
	},
}
impl BrokerError {
	/// Returns `true` when the engine should continue with the interactive path.
	pub fn falls_through(&self) -> bool {
		matches!(self, Self::Unavailable | Self::Declined { .. })
	}
}

/// Request description sent to the broker process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrokerInvocation {
	/// Authority URL.
	pub authority: Url,
	/// Target resource.
	pub resource: String,
	/// Requesting client.
	pub client_id: ClientId,
	/// Redirect URI the broker answers on.
	pub redirect_uri: Url,
	/// Requested user, if any.
	pub user: Option<UserIdentifier>,
	/// Prompt behavior requested by the caller.
	pub prompt: PromptBehavior,
	/// Additional scopes.
	pub scope: ScopeSet,
	/// Raw extra query parameters for the authorize URL.
	pub extra_query_parameters: Option<String>,
	/// Refresh token the broker should redeem instead of its own.
	pub refresh_token_credential: Option<TokenSecret>,
	/// Correlation id of the acquisition.
	pub correlation_id: CorrelationId,
	/// Caller-supplied component tag.
	pub component: Option<String>,
}

/// Broker answer.
#[derive(Clone, Debug)]
pub enum BrokerResponse {
	/// Tokens issued by the broker.
	Token(BrokerPayload),
	/// The user dismissed the broker UI.
	Cancelled,
}

/// Serialized token payload returned by the broker.
#[derive(Clone, Serialize, Deserialize)]
pub struct BrokerPayload {
	/// Issued access token.
	pub access_token: String,
	/// Token type (defaults to `Bearer`).
	#[serde(default)]
	pub token_type: Option<String>,
	/// Access token expiry as a Unix timestamp.
	#[serde(with = "time::serde::timestamp")]
	pub expires_on: OffsetDateTime,
	/// Issued refresh token.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// OpenID Connect id token.
	#[serde(default)]
	pub id_token: Option<String>,
	/// Correlation id echoed by the broker.
	#[serde(default)]
	pub correlation_id: Option<CorrelationId>,
}
impl BrokerPayload {
	/// Decodes a payload from the broker's JSON wire form.
	pub fn from_json(raw: &str) -> Result<Self, BrokerError> {
		serde_json::from_str(raw).map_err(|e| BrokerError::Malformed { reason: e.to_string() })
	}

	/// Converts the payload into a cache entry stored at `now`.
	pub fn into_entry(self, now: OffsetDateTime) -> Result<CacheEntry> {
		let user_info =
			self.id_token.as_deref().map(UserInfo::from_id_token).transpose().map_err(ConfigError::from)?;
		let mut builder = CacheEntry::builder()
			.access_token(self.access_token)
			.expires_on(self.expires_on)
			.stored_at(now)
			.refresh_secret(self.refresh_token.map(TokenSecret::new));

		if let Some(token_type) = self.token_type {
			builder = builder.token_type(token_type);
		}
		if let Some(raw) = self.id_token {
			builder = builder.id_token(raw, user_info);
		}

		Ok(builder.build().map_err(ConfigError::from)?)
	}
}
impl Debug for BrokerPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BrokerPayload")
			.field("token_type", &self.token_type)
			.field("expires_on", &self.expires_on)
			.field("refresh_token_present", &self.refresh_token.is_some())
			.field("correlation_id", &self.correlation_id)
			.finish()
	}
}

/// Engine-side handle on the optional broker process.
#[derive(Clone, Default)]
pub struct BrokerBridge {
	process: Option<Arc<dyn BrokerProcess>>,
}
impl BrokerBridge {
	/// Bridge backed by a broker process.
	pub fn new(process: Arc<dyn BrokerProcess>) -> Self {
		Self { process: Some(process) }
	}

	/// Returns `true` when a broker process is configured and installed.
	pub fn is_installed(&self) -> bool {
		self.process.as_ref().is_some_and(|process| process.is_installed())
	}

	/// Eligibility: installed, silent broker requests allowed, the request is not silent-only,
	/// and the broker accepts the invocation.
	pub fn is_eligible(
		&self,
		invocation: &BrokerInvocation,
		allow_silent_requests: bool,
		silent: bool,
	) -> bool {
		if !allow_silent_requests || silent {
			return false;
		}

		self.process
			.as_ref()
			.is_some_and(|process| process.is_installed() && process.can_handle(invocation))
	}

	/// Delegates the invocation to the broker process.
	pub async fn invoke(&self, invocation: BrokerInvocation) -> Result<BrokerResponse, BrokerError> {
		match &self.process {
			Some(process) if process.is_installed() => process.invoke(invocation).await,
			_ => Err(BrokerError::Unavailable),
		}
	}
}
impl Debug for BrokerBridge {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BrokerBridge").field("installed", &self.is_installed()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct Declining;
	impl BrokerProcess for Declining {
		fn can_handle(&self, invocation: &BrokerInvocation) -> bool {
			invocation.resource == "https://graph"
		}

		fn invoke(&self, _invocation: BrokerInvocation) -> BrokerFuture<'_, BrokerResponse> {
			Box::pin(async { Err(BrokerError::Declined { reason: "policy".into() }) })
		}
	}

	fn invocation(resource: &str) -> BrokerInvocation {
		BrokerInvocation {
			authority: Url::parse("https://login.example.com/common").expect("URL should parse."),
			resource: resource.into(),
			client_id: ClientId::new("abc").expect("Client fixture should be valid."),
			redirect_uri: Url::parse("https://app/redirect").expect("URL should parse."),
			user: None,
			prompt: PromptBehavior::Auto,
			scope: ScopeSet::default(),
			extra_query_parameters: None,
			refresh_token_credential: None,
			correlation_id: CorrelationId::new_v4(),
			component: None,
		}
	}

	#[test]
	fn eligibility_requires_every_condition() {
		let bridge = BrokerBridge::new(Arc::new(Declining));

		assert!(bridge.is_eligible(&invocation("https://graph"), true, false));
		assert!(!bridge.is_eligible(&invocation("https://graph"), false, false));
		assert!(!bridge.is_eligible(&invocation("https://graph"), true, true));
		assert!(!bridge.is_eligible(&invocation("https://other"), true, false));
		assert!(!BrokerBridge::default().is_eligible(&invocation("https://graph"), true, false));
	}

	#[tokio::test]
	async fn missing_broker_is_unavailable() {
		let outcome = BrokerBridge::default().invoke(invocation("https://graph")).await;

		assert_eq!(outcome.expect_err("No broker must fail."), BrokerError::Unavailable);
		assert!(BrokerError::Unavailable.falls_through());
		assert!(!BrokerError::Failed { code: None, message: "boom".into() }.falls_through());
	}

	#[test]
	fn payloads_decode_unix_expiry() {
		let payload = BrokerPayload::from_json(
			r#"{"access_token":"B1","expires_on":1735693200,"refresh_token":"R1"}"#,
		)
		.expect("Payload fixture should decode.");
		let entry = payload.into_entry(OffsetDateTime::now_utc()).expect("Entry should build.");

		assert_eq!(entry.expires_on.map(OffsetDateTime::unix_timestamp), Some(1_735_693_200));
		assert!(matches!(BrokerPayload::from_json("{"), Err(BrokerError::Malformed { .. })));
	}
}
