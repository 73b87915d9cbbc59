//! The engine's request object: configure, seal, acquire.
//!
//! An [`AuthenticationRequest`] is the mutable, unsealed form. Its setters return
//! `&mut Self` (or a [`ParameterError`] for malformed input) and exist only on this type.
//! [`AuthenticationRequest::ensure_request`] consumes it and yields a [`SealedRequest`],
//! which exposes read-only accessors and the acquisition entry points. Mutating a sealed
//! request is therefore a compile error rather than a runtime rejection, and because every
//! entry point consumes the request, one request can only ever drive one acquisition.

pub mod validate;
pub mod variant;

pub use variant::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, CorrelationId, PromptBehavior, ScopeSet, TokenSecret, UserIdentifier},
	broker::BrokerInvocation,
	cache::CacheQuery,
	context::AuthenticationContext,
	error::ParameterError,
	flows,
	http::TokenHttpClient,
	oauth::{AssertionType, ExchangeParameters, TransportErrorMapper},
	result::AuthenticationResult,
};

/// Configuration carried by a request.
#[derive(Clone, Debug)]
pub struct RequestParameters {
	pub(crate) redirect_uri: Url,
	pub(crate) client_id: ClientId,
	pub(crate) resource: String,
	pub(crate) user: Option<UserIdentifier>,
	pub(crate) prompt: PromptBehavior,
	pub(crate) scope: ScopeSet,
	pub(crate) extra_query_parameters: Option<String>,
	pub(crate) refresh_token_credential: Option<TokenSecret>,
	pub(crate) silent: bool,
	pub(crate) allow_silent_requests: bool,
	pub(crate) correlation_id: Option<CorrelationId>,
	pub(crate) component: Option<String>,
}
impl RequestParameters {
	pub(crate) fn new(fields: validate::MandatoryFields) -> Self {
		Self {
			redirect_uri: fields.redirect_uri,
			client_id: fields.client_id,
			resource: fields.resource,
			user: None,
			prompt: PromptBehavior::default(),
			scope: ScopeSet::default(),
			extra_query_parameters: None,
			refresh_token_credential: None,
			silent: false,
			allow_silent_requests: false,
			correlation_id: None,
			component: None,
		}
	}

	/// Redirect URI the authorization response is delivered to.
	pub fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}

	/// Requesting client.
	pub fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	/// Target resource.
	pub fn resource(&self) -> &str {
		&self.resource
	}

	/// Requested user, if any.
	pub fn user(&self) -> Option<&UserIdentifier> {
		self.user.as_ref()
	}

	/// Prompt behavior.
	pub fn prompt(&self) -> PromptBehavior {
		self.prompt
	}

	/// Additional scopes.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	/// Raw extra query parameters appended to the authorize URL.
	pub fn extra_query_parameters(&self) -> Option<&str> {
		self.extra_query_parameters.as_deref()
	}

	/// Refresh token the broker relay path redeems, if set.
	pub fn refresh_token_credential(&self) -> Option<&TokenSecret> {
		self.refresh_token_credential.as_ref()
	}

	/// `true` when no UI may be shown.
	pub fn silent(&self) -> bool {
		self.silent
	}

	/// `true` when the broker may serve the request.
	pub fn allow_silent_requests(&self) -> bool {
		self.allow_silent_requests
	}

	/// Correlation id; always set once the request is sealed.
	pub fn correlation_id(&self) -> Option<CorrelationId> {
		self.correlation_id
	}

	/// Caller-supplied component tag.
	pub fn component(&self) -> Option<&str> {
		self.component.as_deref()
	}
}

/// Unsealed, configurable request.
pub struct AuthenticationRequest<C, M, V = Standard>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) context: Arc<AuthenticationContext<C, M>>,
	pub(crate) params: RequestParameters,
	variant: PhantomData<V>,
}
impl<C, M> AuthenticationRequest<C, M, Standard>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an in-process request.
	///
	/// Mandatory fields are checked for presence left to right (`redirect_uri`, `client_id`,
	/// `resource`) and then for validity; the first failure is returned and nothing else
	/// happens.
	pub fn new(
		context: &Arc<AuthenticationContext<C, M>>,
		redirect_uri: &str,
		client_id: &str,
		resource: &str,
	) -> Result<Self, ParameterError> {
		Self::with_variant(context, redirect_uri, client_id, resource)
	}
}
impl<C, M> AuthenticationRequest<C, M, Brokered>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker-capable request; validation matches [`AuthenticationRequest::new`].
	pub fn brokered(
		context: &Arc<AuthenticationContext<C, M>>,
		redirect_uri: &str,
		client_id: &str,
		resource: &str,
	) -> Result<Self, ParameterError> {
		Self::with_variant(context, redirect_uri, client_id, resource)
	}

	/// Seals the request and runs the broker relay path.
	pub async fn acquire_token_for_broker(self) -> AuthenticationResult {
		self.ensure_request().acquire_token_for_broker().await
	}
}
impl<C, M, V> AuthenticationRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	V: RequestVariant,
{
	fn with_variant(
		context: &Arc<AuthenticationContext<C, M>>,
		redirect_uri: &str,
		client_id: &str,
		resource: &str,
	) -> Result<Self, ParameterError> {
		let fields = validate::mandatory_fields(redirect_uri, client_id, resource)?;

		Ok(Self {
			context: context.clone(),
			params: RequestParameters::new(fields),
			variant: PhantomData,
		})
	}

	/// Current configuration.
	pub fn parameters(&self) -> &RequestParameters {
		&self.params
	}

	/// Context the request was created against.
	pub fn context(&self) -> &Arc<AuthenticationContext<C, M>> {
		&self.context
	}

	/// Replaces the additional scopes (whitespace separated; blank clears them).
	pub fn set_scope(&mut self, scope: &str) -> Result<&mut Self, ParameterError> {
		self.params.scope = validate::scope_from(scope)?;

		Ok(self)
	}

	/// Sets raw query parameters appended to the authorize URL.
	pub fn set_extra_query_parameters(&mut self, parameters: &str) -> &mut Self {
		self.params.extra_query_parameters = validate::extra_query_parameters_from(parameters);

		self
	}

	/// Sets or clears the requested user.
	pub fn set_user_identifier(&mut self, user: Option<UserIdentifier>) -> &mut Self {
		self.params.user = user;

		self
	}

	/// Requests a user by sign-in name (optional displayable id).
	pub fn set_user_id(&mut self, user_id: &str) -> Result<&mut Self, ParameterError> {
		let id = validate::user_id_from(user_id)?;

		self.params.user = Some(UserIdentifier::optional_displayable(id));

		Ok(self)
	}

	/// Sets the prompt behavior.
	pub fn set_prompt_behavior(&mut self, prompt: PromptBehavior) -> &mut Self {
		self.params.prompt = prompt;

		self
	}

	/// Disallows any UI when `true`.
	pub fn set_silent(&mut self, silent: bool) -> &mut Self {
		self.params.silent = silent;

		self
	}

	/// Overrides the correlation id; unset requests use the context default.
	pub fn set_correlation_id(&mut self, correlation_id: CorrelationId) -> &mut Self {
		self.params.correlation_id = Some(correlation_id);

		self
	}

	/// Tags the request for diagnostics.
	pub fn set_component(&mut self, component: impl Into<String>) -> &mut Self {
		self.params.component = Some(component.into());

		self
	}

	/// Seals the request, filling the correlation id from the context when unset.
	pub fn ensure_request(self) -> SealedRequest<C, M, V> {
		let Self { context, mut params, .. } = self;
		let correlation_id = params.correlation_id.unwrap_or_else(|| context.default_correlation_id());

		params.correlation_id = Some(correlation_id);

		SealedRequest { context, params, correlation_id, variant: PhantomData }
	}

	/// Seals the request and acquires a token, escalating as the prompt behavior allows.
	pub async fn acquire_token(self) -> AuthenticationResult {
		self.ensure_request().acquire_token().await
	}

	/// Seals the request and acquires a token without showing any UI.
	pub async fn acquire_token_silent(self) -> AuthenticationResult {
		self.ensure_request().acquire_token_silent().await
	}

	/// Seals the request and redeems a SAML assertion.
	///
	/// A blank assertion fails with a parameter error before the request is sealed.
	pub async fn acquire_token_by_assertion(
		self,
		assertion: &str,
		assertion_type: AssertionType,
	) -> AuthenticationResult {
		if let Err(e) = validate::require("assertion", assertion) {
			let correlation_id =
				self.params.correlation_id.unwrap_or_else(|| self.context.default_correlation_id());

			return AuthenticationResult::failed(correlation_id, e);
		}

		self.ensure_request().acquire_token_by_assertion(assertion, assertion_type).await
	}

	/// Runs [`acquire_token`](Self::acquire_token) and hands the result to `completion`.
	pub async fn acquire_token_with<F>(self, completion: F)
	where
		F: FnOnce(AuthenticationResult),
	{
		flows::with_completion(self.acquire_token(), completion).await
	}
}
impl<C, M, V> Debug for AuthenticationRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticationRequest").field("params", &self.params).finish()
	}
}

/// Sealed, read-only request.
pub struct SealedRequest<C, M, V = Standard>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) context: Arc<AuthenticationContext<C, M>>,
	pub(crate) params: RequestParameters,
	pub(crate) correlation_id: CorrelationId,
	variant: PhantomData<V>,
}
impl<C, M, V> SealedRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	V: RequestVariant,
{
	/// Sealing is idempotent.
	pub fn ensure_request(self) -> Self {
		self
	}

	/// Frozen configuration.
	pub fn parameters(&self) -> &RequestParameters {
		&self.params
	}

	/// Context the request was created against.
	pub fn context(&self) -> &Arc<AuthenticationContext<C, M>> {
		&self.context
	}

	/// Correlation id propagated to every collaborator.
	pub fn correlation_id(&self) -> CorrelationId {
		self.correlation_id
	}

	/// Runs [`acquire_token`](Self::acquire_token) and hands the result to `completion`.
	pub async fn acquire_token_with<F>(self, completion: F)
	where
		F: FnOnce(AuthenticationResult),
	{
		flows::with_completion(self.acquire_token(), completion).await
	}

	pub(crate) fn exchange_parameters(&self) -> ExchangeParameters<'_> {
		ExchangeParameters {
			client_id: &self.params.client_id,
			resource: &self.params.resource,
			redirect_uri: &self.params.redirect_uri,
			scope: &self.params.scope,
			correlation_id: self.correlation_id,
		}
	}

	pub(crate) fn cache_query(&self) -> CacheQuery<'_> {
		CacheQuery {
			authority: &self.context.descriptor.authority,
			resource: &self.params.resource,
			client_id: &self.params.client_id,
			user: self.params.user.as_ref(),
		}
	}

	pub(crate) fn broker_invocation(&self) -> BrokerInvocation {
		BrokerInvocation {
			authority: self.context.descriptor.authority.clone(),
			resource: self.params.resource.clone(),
			client_id: self.params.client_id.clone(),
			redirect_uri: self.params.redirect_uri.clone(),
			user: self.params.user.clone(),
			prompt: self.params.prompt,
			scope: self.params.scope.clone(),
			extra_query_parameters: self.params.extra_query_parameters.clone(),
			refresh_token_credential: self.params.refresh_token_credential.clone(),
			correlation_id: self.correlation_id,
			component: self.params.component.clone(),
		}
	}
}
impl<C, M, V> Debug for SealedRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SealedRequest")
			.field("params", &self.params)
			.field("correlation_id", &self.correlation_id)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{ReqwestTestContext, build_reqwest_test_context},
		auth::{UserId, UserIdentifierKind},
		authority::{AuthorityDescriptor, GrantType},
	};

	fn context() -> Arc<ReqwestTestContext> {
		let descriptor = AuthorityDescriptor::builder(
			Url::parse("https://login.example.com/common").expect("Authority fixture should parse."),
		)
		.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
		.build()
		.expect("Descriptor fixture should build.");
		let (context, _) = build_reqwest_test_context(descriptor);

		Arc::new(context.with_correlation_id(CorrelationId::from_uuid(Uuid::nil())))
	}

	#[test]
	fn construction_reports_the_first_missing_field() {
		let context = context();
		let err = AuthenticationRequest::new(&context, "", "abc", "https://graph")
			.expect_err("Missing redirect URI must fail.");

		assert_eq!(err, ParameterError::Missing { field: "redirect_uri" });

		let err = AuthenticationRequest::brokered(&context, "https://app/redirect", "abc", "")
			.expect_err("Missing resource must fail.");

		assert_eq!(err, ParameterError::Missing { field: "resource" });
	}

	#[test]
	fn setters_configure_the_unsealed_request() {
		let context = context();
		let mut request =
			AuthenticationRequest::new(&context, "https://app/redirect", "abc", "https://graph")
				.expect("Request fixture should build.");

		request
			.set_scope("profile email")
			.expect("Scope should be accepted.")
			.set_user_id("alice@contoso.com")
			.expect("User id should be accepted.")
			.set_prompt_behavior(PromptBehavior::RefreshSession)
			.set_extra_query_parameters("&slice=test")
			.set_component("settings");

		let params = request.parameters();

		assert_eq!(params.scope().to_string(), "email profile");
		assert_eq!(params.user().map(|user| user.kind), Some(UserIdentifierKind::OptionalDisplayableId));
		assert_eq!(params.prompt(), PromptBehavior::RefreshSession);
		assert_eq!(params.extra_query_parameters(), Some("slice=test"));
		assert_eq!(params.component(), Some("settings"));
		assert!(request.set_user_id(" ").is_err());
		assert_eq!(
			request.parameters().user().map(|user| user.id.clone()),
			Some(UserId::new("alice@contoso.com").expect("User fixture should be valid.")),
			"A rejected setter must leave the previous value in place."
		);
	}

	#[test]
	fn sealing_fills_the_default_correlation_id_once() {
		let context = context();
		let sealed =
			AuthenticationRequest::new(&context, "https://app/redirect", "abc", "https://graph")
				.expect("Request fixture should build.")
				.ensure_request()
				.ensure_request();

		assert_eq!(sealed.correlation_id(), CorrelationId::from_uuid(Uuid::nil()));
		assert_eq!(sealed.parameters().correlation_id(), Some(sealed.correlation_id()));

		let explicit = CorrelationId::new_v4();
		let mut request =
			AuthenticationRequest::new(&context, "https://app/redirect", "abc", "https://graph")
				.expect("Request fixture should build.");

		request.set_correlation_id(explicit);

		assert_eq!(request.ensure_request().correlation_id(), explicit);
	}

	#[test]
	fn broker_capability_is_limited_to_brokered_requests() {
		let context = context();
		let mut request =
			AuthenticationRequest::brokered(&context, "https://app/redirect", "abc", "https://graph")
				.expect("Request fixture should build.");

		request
			.set_redirect_uri("msauth.com.contoso.app://auth")
			.expect("Custom scheme redirect should be accepted.")
			.set_allow_silent_requests(true)
			.set_refresh_token_credential("relay-refresh");

		assert_eq!(BrokerCapability::redirect_uri(&request).scheme(), "msauth.com.contoso.app");
		assert!(request.parameters().allow_silent_requests());
		assert!(request.parameters().refresh_token_credential().is_some());
		assert!(request.set_redirect_uri("").is_err());

		let invocation = request.ensure_request().broker_invocation();

		assert_eq!(invocation.correlation_id, CorrelationId::from_uuid(Uuid::nil()));
		assert_eq!(invocation.resource, "https://graph");
	}
}
