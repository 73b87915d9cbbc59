//! Authentication context: one authority plus the collaborators every request shares.

// self
use crate::{
	_prelude::*,
	auth::CorrelationId,
	authority::{AuthorityDescriptor, AuthorityStrategy},
	broker::{BrokerBridge, BrokerProcess},
	cache::TokenCache,
	flows::AcquisitionMetrics,
	http::TokenHttpClient,
	oauth::{ProtocolExchange, TransportErrorMapper},
	presenter::AuthorizationPresenter,
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::{authority::DefaultAuthorityStrategy, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Context specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestAuthenticationContext =
	AuthenticationContext<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Shared configuration for every request created against one authority.
///
/// The context owns the transport, the token cache façade, the optional presenter and broker,
/// and the default correlation id used by requests that do not set their own. Requests hold it
/// behind an [`Arc`], so one context can serve any number of concurrent acquisitions.
pub struct AuthenticationContext<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for every token endpoint call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport failures.
	pub transport_mapper: Arc<M>,
	/// Authority descriptor defining endpoints, grants, and quirks.
	pub descriptor: AuthorityDescriptor,
	/// Strategy classifying token endpoint failures.
	pub strategy: Arc<dyn AuthorityStrategy>,
	cache: TokenCache,
	presenter: Option<Arc<dyn AuthorizationPresenter>>,
	broker: BrokerBridge,
	default_correlation_id: CorrelationId,
	metrics: Arc<AcquisitionMetrics>,
}
impl<C, M> AuthenticationContext<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a context that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: AuthorityDescriptor,
		store: Arc<dyn TokenStore>,
		strategy: Arc<dyn AuthorityStrategy>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy,
			cache: TokenCache::new(store),
			presenter: None,
			broker: BrokerBridge::default(),
			default_correlation_id: CorrelationId::new_v4(),
			metrics: Default::default(),
		}
	}

	/// Installs the login surface used by the interactive path.
	pub fn with_presenter(mut self, presenter: Arc<dyn AuthorizationPresenter>) -> Self {
		self.presenter = Some(presenter);

		self
	}

	/// Installs a broker process for brokered requests.
	pub fn with_broker(mut self, process: Arc<dyn BrokerProcess>) -> Self {
		self.broker = BrokerBridge::new(process);

		self
	}

	/// Overrides the correlation id applied to requests that do not set one.
	pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
		self.default_correlation_id = correlation_id;

		self
	}

	/// Overrides the window before expiry in which cached access tokens count as expired.
	pub fn with_expiration_buffer(mut self, buffer: Duration) -> Self {
		self.cache = self.cache.with_expiration_buffer(buffer);

		self
	}

	/// Token cache façade.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}

	/// Configured login surface, if any.
	pub fn presenter(&self) -> Option<&Arc<dyn AuthorizationPresenter>> {
		self.presenter.as_ref()
	}

	/// Broker bridge (possibly without a process).
	pub fn broker(&self) -> &BrokerBridge {
		&self.broker
	}

	/// Correlation id used when a request does not set its own.
	pub fn default_correlation_id(&self) -> CorrelationId {
		self.default_correlation_id
	}

	/// Path counters shared by every request created from this context.
	pub fn metrics(&self) -> &Arc<AcquisitionMetrics> {
		&self.metrics
	}

	/// Token endpoint client bound to this context's authority and transport.
	pub fn protocol(&self) -> ProtocolExchange<'_, C, M> {
		ProtocolExchange::new(
			&self.descriptor,
			self.strategy.as_ref(),
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
		)
	}
}
#[cfg(feature = "reqwest")]
impl AuthenticationContext<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a context with the default reqwest transport and authority strategy.
	pub fn new(descriptor: AuthorityDescriptor, store: Arc<dyn TokenStore>) -> Self {
		Self::with_http_client(
			descriptor,
			store,
			Arc::new(DefaultAuthorityStrategy),
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for AuthenticationContext<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticationContext")
			.field("descriptor", &self.descriptor)
			.field("cache", &self.cache)
			.field("presenter_set", &self.presenter.is_some())
			.field("broker", &self.broker)
			.field("default_correlation_id", &self.default_correlation_id)
			.finish()
	}
}
