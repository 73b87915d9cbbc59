//! Protocol exchange: form-encoded token endpoint POSTs for the authorization-code,
//! refresh-token, and SAML assertion grants, plus response normalization.

pub use oauth2;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpClientError,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, ClientId, CorrelationId, ScopeSet, TokenSecret, UserInfo},
	authority::{
		AuthorityDescriptor, AuthorityErrorContext, AuthorityErrorKind, AuthorityStrategy, GrantType,
	},
	error::{ConfigError, ProtocolError, ProtocolErrorKind, TransientError, TransportError},
	http::{
		CLIENT_REQUEST_ID, RETURN_CLIENT_REQUEST_ID, ResponseMetadata, ResponseMetadataSlot,
		TokenHttpClient,
	},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const OPENID_SCOPE: &str = "openid";

/// Maps HTTP transport failures into engine [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport.
	fn map_transport_error(
		&self,
		strategy: &dyn AuthorityStrategy,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_strategy: &dyn AuthorityStrategy,
		_grant: GrantType,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => transient(
				format!("HTTP client error occurred while calling the token endpoint: {message}"),
				meta,
			),
			_ => transient("HTTP client error occurred while calling the token endpoint", meta),
		}
	}
}

/// SAML assertion flavors accepted by [`ProtocolExchange::exchange_assertion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionType {
	/// SAML 1.1 bearer assertion.
	Saml11,
	/// SAML 2.0 bearer assertion.
	Saml2,
}
impl AssertionType {
	/// Grant redeemed for this assertion type.
	pub const fn grant(self) -> GrantType {
		match self {
			Self::Saml11 => GrantType::Saml11Bearer,
			Self::Saml2 => GrantType::Saml2Bearer,
		}
	}
}

/// Request fields shared by every token endpoint exchange.
#[derive(Clone, Copy, Debug)]
pub struct ExchangeParameters<'a> {
	/// Requesting client.
	pub client_id: &'a ClientId,
	/// Target resource.
	pub resource: &'a str,
	/// Redirect URI registered for the client; sent when redeeming a code.
	pub redirect_uri: &'a Url,
	/// Additional scopes; `openid` is always requested.
	pub scope: &'a ScopeSet,
	/// Correlation id sent as `client-request-id`.
	pub correlation_id: CorrelationId,
}

/// Normalized successful token endpoint response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
	/// Issued access token.
	pub access_token: String,
	/// Token type (usually `Bearer`).
	#[serde(default)]
	pub token_type: Option<String>,
	/// Lifetime in seconds; some authorities send it as a string.
	#[serde(default, deserialize_with = "deserialize_expires_in")]
	pub expires_in: Option<i64>,
	/// Issued refresh token.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// OpenID Connect id token.
	#[serde(default)]
	pub id_token: Option<String>,
	/// Resource the token is scoped to.
	#[serde(default)]
	pub resource: Option<String>,
	/// Granted scopes.
	#[serde(default)]
	pub scope: Option<String>,
	/// `client-request-id` echoed by the authority.
	#[serde(skip)]
	pub correlation_id: Option<String>,
}
impl TokenResponse {
	/// Converts the response into a cache entry issued at `now`.
	///
	/// When the authority omits a new refresh token, `previous_refresh` is carried over.
	pub fn into_entry(
		self,
		now: OffsetDateTime,
		previous_refresh: Option<TokenSecret>,
	) -> Result<CacheEntry> {
		let expires_in = self.expires_in.ok_or(ConfigError::MissingExpiresIn)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		let expires_on =
			now.checked_add(Duration::seconds(expires_in)).ok_or(ConfigError::ExpiresInOutOfRange)?;
		let user_info =
			self.id_token.as_deref().map(UserInfo::from_id_token).transpose().map_err(ConfigError::from)?;
		let mut builder = CacheEntry::builder()
			.access_token(self.access_token)
			.stored_at(now)
			.expires_on(expires_on)
			.refresh_secret(self.refresh_token.map(TokenSecret::new).or(previous_refresh));

		if let Some(token_type) = self.token_type {
			builder = builder.token_type(token_type);
		}
		if let Some(raw) = self.id_token {
			builder = builder.id_token(raw, user_info);
		}

		Ok(builder.build().map_err(ConfigError::from)?)
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("refresh_token_present", &self.refresh_token.is_some())
			.field("id_token_present", &self.id_token.is_some())
			.field("resource", &self.resource)
			.field("scope", &self.scope)
			.field("correlation_id", &self.correlation_id)
			.finish()
	}
}

/// Token endpoint client borrowed from an
/// [`AuthenticationContext`](crate::context::AuthenticationContext).
pub struct ProtocolExchange<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	descriptor: &'a AuthorityDescriptor,
	strategy: &'a dyn AuthorityStrategy,
	http_client: &'a C,
	mapper: &'a M,
}
impl<'a, C, M> ProtocolExchange<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Binds the exchange to an authority and its collaborators.
	pub fn new(
		descriptor: &'a AuthorityDescriptor,
		strategy: &'a dyn AuthorityStrategy,
		http_client: &'a C,
		mapper: &'a M,
	) -> Self {
		Self { descriptor, strategy, http_client, mapper }
	}

	/// Redeems an authorization code returned by the interactive path.
	pub async fn exchange_authorization_code(
		&self,
		code: &str,
		pkce_verifier: Option<&str>,
		params: &ExchangeParameters<'_>,
	) -> Result<TokenResponse> {
		let grant = GrantType::AuthorizationCode;
		let mut form = self.base_form(grant, params)?;

		form.insert("code".into(), code.into());
		form.insert("redirect_uri".into(), params.redirect_uri.to_string());

		if let Some(verifier) = pkce_verifier {
			form.insert("code_verifier".into(), verifier.into());
		}

		self.post_form(grant, form, params.correlation_id).await
	}

	/// Redeems a refresh token.
	pub async fn exchange_refresh_token(
		&self,
		refresh_token: &str,
		params: &ExchangeParameters<'_>,
	) -> Result<TokenResponse> {
		let grant = GrantType::RefreshToken;
		let mut form = self.base_form(grant, params)?;

		form.insert("refresh_token".into(), refresh_token.into());

		self.post_form(grant, form, params.correlation_id).await
	}

	/// Redeems a SAML assertion; the assertion is base64-encoded into the form body.
	pub async fn exchange_assertion(
		&self,
		assertion: &str,
		assertion_type: AssertionType,
		params: &ExchangeParameters<'_>,
	) -> Result<TokenResponse> {
		let grant = assertion_type.grant();
		let mut form = self.base_form(grant, params)?;

		form.insert("assertion".into(), STANDARD.encode(assertion.as_bytes()));

		self.post_form(grant, form, params.correlation_id).await
	}

	fn base_form(
		&self,
		grant: GrantType,
		params: &ExchangeParameters<'_>,
	) -> Result<BTreeMap<String, String>> {
		if !self.descriptor.supports(grant) {
			return Err(ConfigError::UnsupportedGrant {
				authority: self.descriptor.authority.to_string(),
				grant: grant.as_str(),
			}
			.into());
		}

		let mut form = BTreeMap::new();

		form.insert("grant_type".into(), grant.as_str().into());
		form.insert("client_id".into(), params.client_id.to_string());
		form.insert("resource".into(), params.resource.into());
		form.insert(
			"scope".into(),
			scope_parameter(params.scope, self.descriptor.quirks.scope_delimiter),
		);

		Ok(form)
	}

	async fn post_form(
		&self,
		grant: GrantType,
		mut form: BTreeMap<String, String>,
		correlation_id: CorrelationId,
	) -> Result<TokenResponse> {
		self.strategy.augment_token_request(grant, &mut form);

		let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(form.iter()).finish();
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(self.descriptor.endpoints.token.as_str())
			.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
			.header(ACCEPT, "application/json");

		if self.descriptor.quirks.send_client_request_id {
			builder = builder
				.header(CLIENT_REQUEST_ID, correlation_id.to_string())
				.header(RETURN_CLIENT_REQUEST_ID, "true");
		}

		let request = builder.body(body.into_bytes()).map_err(ConfigError::from)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let response = match handle.call(request).await {
			Ok(response) => response,
			Err(e) =>
				return Err(self.mapper.map_transport_error(self.strategy, grant, slot.take().as_ref(), e)),
		};
		let status = response.status().as_u16();
		let mut meta = slot.take().unwrap_or_default();

		meta.status = meta.status.or(Some(status));

		if meta.correlation_id.is_none() {
			meta.correlation_id = response
				.headers()
				.get(CLIENT_REQUEST_ID)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
		}

		if !response.status().is_success() {
			return Err(classify_error_response(self.strategy, grant, &meta, response.body()));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let mut parsed: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TransientError::TokenResponseParse { source, status: meta.status })?;

		parsed.correlation_id = meta.correlation_id;

		Ok(parsed)
	}
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
	#[serde(default)]
	suberror: Option<String>,
}

fn classify_error_response(
	strategy: &dyn AuthorityStrategy,
	grant: GrantType,
	meta: &ResponseMetadata,
	body: &[u8],
) -> Error {
	let parsed = serde_json::from_slice::<ErrorResponse>(body).unwrap_or_default();
	let mut ctx = AuthorityErrorContext::new(grant);

	if let Some(status) = meta.status {
		ctx = ctx.with_http_status(status);
	}
	if let Some(error) = &parsed.error {
		ctx = ctx.with_oauth_error(error.clone());
	} else {
		ctx = ctx.with_body_preview(String::from_utf8_lossy(body));
	}
	if let Some(description) = &parsed.error_description {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(suberror) = &parsed.suberror {
		ctx = ctx.with_suberror(suberror.clone());
	}

	let kind = match strategy.classify_token_error(&ctx) {
		AuthorityErrorKind::InteractionRequired => ProtocolErrorKind::InteractionRequired,
		AuthorityErrorKind::InvalidGrant => ProtocolErrorKind::InvalidGrant,
		AuthorityErrorKind::UnauthorizedClient => ProtocolErrorKind::UnauthorizedClient,
		AuthorityErrorKind::Fatal => ProtocolErrorKind::Fatal,
		AuthorityErrorKind::Transient => {
			let detail = parsed
				.error_description
				.or(parsed.error)
				.or(ctx.body_preview)
				.unwrap_or_else(|| "empty response body".into());

			return TransientError::TokenEndpoint {
				message: detail,
				status: meta.status,
				retry_after: meta.retry_after,
			}
			.into();
		},
	};

	ProtocolError::new(kind, grant, parsed.error, parsed.error_description, meta.status).into()
}

/// Joins scopes with the authority delimiter, always including `openid`.
pub(crate) fn scope_parameter(scope: &ScopeSet, delimiter: char) -> String {
	match scope.joined(delimiter) {
		Some(joined) if scope.contains(OPENID_SCOPE) => joined,
		Some(joined) => format!("{OPENID_SCOPE}{delimiter}{joined}"),
		None => OPENID_SCOPE.into(),
	}
}

fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum NumberOrText {
		Number(i64),
		Text(String),
	}

	match Option::<NumberOrText>::deserialize(deserializer)? {
		None => Ok(None),
		Some(NumberOrText::Number(value)) => Ok(Some(value)),
		Some(NumberOrText::Text(text)) => text
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| DeError::custom(format!("expires_in `{text}` is not an integer"))),
	}
}

#[cfg(feature = "reqwest")]
fn transient(message: impl Into<String>, meta: Option<&ResponseMetadata>) -> Error {
	TransientError::TokenEndpoint {
		message: message.into(),
		status: meta.and_then(|value| value.status),
		retry_after: meta.and_then(|value| value.retry_after),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return transient("Request timed out while calling the token endpoint", meta);
	}

	TransportError::from(err).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::authority::DefaultAuthorityStrategy;

	#[test]
	fn token_responses_accept_textual_expiry() {
		let response: TokenResponse = serde_json::from_str(
			r#"{"access_token":"T1","token_type":"Bearer","expires_in":"3600","refresh_token":"R1"}"#,
		)
		.expect("Response fixture should parse.");

		assert_eq!(response.expires_in, Some(3600));
		assert!(!format!("{response:?}").contains("T1"));

		let broken = serde_json::from_str::<TokenResponse>(r#"{"access_token":"T1","expires_in":"soon"}"#);

		assert!(broken.is_err());
	}

	#[test]
	fn entries_keep_previous_refresh_tokens() {
		let now = OffsetDateTime::now_utc();
		let response: TokenResponse = serde_json::from_str(r#"{"access_token":"T2","expires_in":60}"#)
			.expect("Response fixture should parse.");
		let entry = response
			.into_entry(now, Some(TokenSecret::new("R-old")))
			.expect("Entry should build from response.");

		assert_eq!(entry.refresh_token.as_ref().map(TokenSecret::expose), Some("R-old"));
		assert_eq!(entry.expires_on, Some(now + Duration::seconds(60)));
		assert_eq!(entry.token_type, "Bearer");
	}

	#[test]
	fn invalid_expiry_is_a_configuration_error() {
		let missing: TokenResponse =
			serde_json::from_str(r#"{"access_token":"T"}"#).expect("Response fixture should parse.");
		let negative: TokenResponse = serde_json::from_str(r#"{"access_token":"T","expires_in":0}"#)
			.expect("Response fixture should parse.");
		let now = OffsetDateTime::now_utc();

		assert!(matches!(
			missing.into_entry(now, None),
			Err(Error::Config(ConfigError::MissingExpiresIn))
		));
		assert!(matches!(
			negative.into_entry(now, None),
			Err(Error::Config(ConfigError::NonPositiveExpiresIn))
		));
	}

	#[test]
	fn openid_is_always_requested() {
		let empty = ScopeSet::default();
		let custom = ScopeSet::new(["offline_access"]).expect("Scope fixture should be valid.");
		let explicit = ScopeSet::new(["openid", "profile"]).expect("Scope fixture should be valid.");

		assert_eq!(scope_parameter(&empty, ' '), "openid");
		assert_eq!(scope_parameter(&custom, ' '), "openid offline_access");
		assert_eq!(scope_parameter(&explicit, ','), "openid,profile");
	}

	#[test]
	fn error_bodies_are_classified_by_the_strategy() {
		let meta = ResponseMetadata { status: Some(400), ..Default::default() };
		let interaction = classify_error_response(
			&DefaultAuthorityStrategy,
			GrantType::RefreshToken,
			&meta,
			br#"{"error":"interaction_required","error_description":"AADSTS50076"}"#,
		);

		assert!(interaction.requires_interaction());

		let unavailable = classify_error_response(
			&DefaultAuthorityStrategy,
			GrantType::RefreshToken,
			&ResponseMetadata { status: Some(503), ..Default::default() },
			b"<html>maintenance</html>",
		);

		assert!(matches!(unavailable, Error::Transient(TransientError::TokenEndpoint { status: Some(503), .. })));

		let fatal = classify_error_response(
			&DefaultAuthorityStrategy,
			GrantType::AuthorizationCode,
			&meta,
			br#"{"error":"invalid_request"}"#,
		);

		assert!(matches!(fatal, Error::Protocol(ProtocolError { kind: ProtocolErrorKind::Fatal, .. })));
	}
}
