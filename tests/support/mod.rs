//! Fixtures shared by the integration tests: a mock authority, spy collaborators, and
//! cache seeding helpers.

#![allow(dead_code)]

// std
use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
// self
use oauth2_native::{
	auth::{CacheEntry, ClientId},
	authority::{AuthorityDescriptor, GrantType},
	broker::{
		BrokerError, BrokerFuture, BrokerInvocation, BrokerPayload, BrokerProcess, BrokerResponse,
	},
	context::{AuthenticationContext, ReqwestAuthenticationContext},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	presenter::{AuthorizationPresenter, PresentationError, PresenterFuture},
	reqwest,
	store::{CacheKey, MemoryStore, StoreError, StoreFuture, TokenStore},
	url::Url,
};

pub const CLIENT_ID: &str = "abc";
pub const REDIRECT_URI: &str = "https://app/redirect";
pub const RESOURCE: &str = "https://graph";
pub const TOKEN_PATH: &str = "/common/oauth2/token";

pub fn descriptor(server: &MockServer) -> AuthorityDescriptor {
	AuthorityDescriptor::builder(
		Url::parse(&server.url("/common")).expect("Mock authority URL should parse."),
	)
	.support_grants([
		GrantType::AuthorizationCode,
		GrantType::RefreshToken,
		GrantType::Saml11Bearer,
		GrantType::Saml2Bearer,
	])
	.build()
	.expect("Mock authority descriptor should build.")
}

/// Context backed by an in-memory store and a client that trusts the mock server's
/// self-signed certificate.
pub fn context(server: &MockServer) -> (ReqwestAuthenticationContext, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::default());

	(context_with_store(server, store.clone()), store)
}

/// Same as [`context`] over an arbitrary store backend.
pub fn context_with_store(
	server: &MockServer,
	backend: Arc<dyn TokenStore>,
) -> ReqwestAuthenticationContext {
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(reqwest::redirect::Policy::none())
		.build()
		.expect("Insecure test client should build.");

	AuthenticationContext::with_http_client(
		descriptor(server),
		backend,
		Arc::new(oauth2_native::authority::DefaultAuthorityStrategy),
		ReqwestHttpClient::with_client(client),
		Arc::new(ReqwestTransportErrorMapper),
	)
}

/// Memory store whose removals always fail, as a locked keychain would.
#[derive(Debug, Default)]
pub struct PinnedStore {
	pub inner: MemoryStore,
}
impl TokenStore for PinnedStore {
	fn load<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<CacheEntry>> {
		self.inner.load(key)
	}

	fn save(&self, key: CacheKey, entry: CacheEntry) -> StoreFuture<'_, ()> {
		self.inner.save(key, entry)
	}

	fn remove<'a>(&'a self, _key: &'a CacheKey) -> StoreFuture<'a, Option<CacheEntry>> {
		Box::pin(async { Err(StoreError::Backend { message: "keychain locked".into() }) })
	}

	fn keys(&self) -> StoreFuture<'_, Vec<CacheKey>> {
		self.inner.keys()
	}
}

/// Unsigned `id_token` reporting `upn` with object id `o-1` in tenant `t-1`.
pub fn id_token(upn: &str) -> String {
	let claims = format!("{{\"upn\":\"{upn}\",\"oid\":\"o-1\",\"tid\":\"t-1\"}}");

	format!("eyJhbGciOiJub25lIn0.{}.", URL_SAFE_NO_PAD.encode(claims))
}

pub fn client_id() -> ClientId {
	ClientId::new(CLIENT_ID).expect("Client fixture should be valid.")
}

pub fn key(context: &ReqwestAuthenticationContext, user_id: Option<&str>) -> CacheKey {
	CacheKey::new(&context.descriptor.authority, RESOURCE, &client_id(), user_id)
}

pub async fn seed(store: &MemoryStore, key: CacheKey, entry: CacheEntry) {
	store.save(key, entry).await.expect("Seeding the store should succeed.");
}

pub fn valid_entry(access: &str) -> CacheEntry {
	CacheEntry::builder()
		.access_token(access)
		.refresh_token("R-cached")
		.expires_in(time::Duration::hours(1))
		.build()
		.expect("Valid entry fixture should build.")
}

pub fn refresh_only_entry(refresh: &str) -> CacheEntry {
	CacheEntry::builder()
		.access_token("expired")
		.refresh_token(refresh)
		.expires_on(time::OffsetDateTime::now_utc() - time::Duration::minutes(1))
		.build()
		.expect("Refresh-only entry fixture should build.")
}

pub fn token_body(access: &str, refresh: Option<&str>) -> String {
	match refresh {
		Some(refresh) => format!(
			"{{\"access_token\":\"{access}\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"refresh_token\":\"{refresh}\"}}"
		),
		None => format!("{{\"access_token\":\"{access}\",\"token_type\":\"Bearer\",\"expires_in\":\"3600\"}}"),
	}
}

/// What the spy login surface does when shown.
#[derive(Clone, Debug)]
pub enum SignIn {
	/// Redirects with `code` and the `state` taken from the start URL.
	Code(&'static str),
	/// Redirects with the given `state` instead of the real one.
	ForgedState(&'static str),
	/// The user closes the surface.
	Cancel,
	/// The surface cannot be shown.
	Fail(&'static str),
}

pub struct SpyPresenter {
	sign_in: SignIn,
	pub shows: AtomicUsize,
	pub dismissals: AtomicUsize,
	pub start_urls: Mutex<Vec<Url>>,
}
impl SpyPresenter {
	pub fn new(sign_in: SignIn) -> Arc<Self> {
		Arc::new(Self {
			sign_in,
			shows: AtomicUsize::new(0),
			dismissals: AtomicUsize::new(0),
			start_urls: Mutex::new(Vec::new()),
		})
	}

	pub fn shows(&self) -> usize {
		self.shows.load(Ordering::SeqCst)
	}

	pub fn dismissals(&self) -> usize {
		self.dismissals.load(Ordering::SeqCst)
	}

	pub fn last_query(&self, name: &str) -> Option<String> {
		let urls = self.start_urls.lock().expect("Start URL lock should not be poisoned.");

		urls.last()?.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
	}
}
impl AuthorizationPresenter for SpyPresenter {
	fn show(&self, start: Url, end: Url) -> PresenterFuture<'_> {
		self.shows.fetch_add(1, Ordering::SeqCst);

		let state = start
			.query_pairs()
			.find(|(key, _)| key == "state")
			.map(|(_, value)| value.into_owned())
			.unwrap_or_default();

		self.start_urls.lock().expect("Start URL lock should not be poisoned.").push(start);

		let outcome = match &self.sign_in {
			SignIn::Code(code) => redirect(&end, code, &state),
			SignIn::ForgedState(forged) => redirect(&end, "XYZ", forged),
			SignIn::Cancel => Err(PresentationError::Cancelled),
			SignIn::Fail(message) => Err(PresentationError::Unavailable { message: (*message).into() }),
		};

		Box::pin(async move { outcome })
	}

	fn dismiss(&self, _animated: bool) {
		self.dismissals.fetch_add(1, Ordering::SeqCst);
	}
}

fn redirect(end: &Url, code: &str, state: &str) -> Result<Url, PresentationError> {
	let mut url = end.clone();

	url.query_pairs_mut().append_pair("code", code).append_pair("state", state);

	Ok(url)
}

/// What the spy broker answers.
#[derive(Clone, Debug)]
pub enum BrokerAnswer {
	Token(&'static str),
	Decline,
	Fail,
	Cancel,
}

pub struct SpyBroker {
	answer: BrokerAnswer,
	pub invocations: Mutex<Vec<BrokerInvocation>>,
}
impl SpyBroker {
	pub fn new(answer: BrokerAnswer) -> Arc<Self> {
		Arc::new(Self { answer, invocations: Mutex::new(Vec::new()) })
	}

	pub fn calls(&self) -> usize {
		self.invocations.lock().expect("Invocation lock should not be poisoned.").len()
	}
}
impl BrokerProcess for SpyBroker {
	fn can_handle(&self, _invocation: &BrokerInvocation) -> bool {
		true
	}

	fn invoke(&self, invocation: BrokerInvocation) -> BrokerFuture<'_, BrokerResponse> {
		self.invocations.lock().expect("Invocation lock should not be poisoned.").push(invocation);

		let answer = match self.answer {
			BrokerAnswer::Token(access) => {
				let expires_on = time::OffsetDateTime::now_utc().unix_timestamp() + 3600;

				BrokerPayload::from_json(&format!(
					"{{\"access_token\":\"{access}\",\"expires_on\":{expires_on},\"refresh_token\":\"RB\"}}"
				))
				.map(BrokerResponse::Token)
			},
			BrokerAnswer::Decline => Err(BrokerError::Declined { reason: "policy".into() }),
			BrokerAnswer::Fail =>
				Err(BrokerError::Failed { code: Some("broker_failure".into()), message: "boom".into() }),
			BrokerAnswer::Cancel => Ok(BrokerResponse::Cancelled),
		};

		Box::pin(async move { answer })
	}
}
