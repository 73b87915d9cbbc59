//! Silent paths: cached access tokens and refresh token redemption.

// self
use crate::{
	_prelude::*,
	auth::EntryStatus,
	cache::{CacheHit, CacheLookup},
	flows::common,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome},
	request::{RequestVariant, SealedRequest},
	result::{AuthenticationToken, TokenSource},
};

impl<C, M, V> SealedRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	V: RequestVariant,
{
	/// Serves the request from the cache, redeeming a refresh token when allowed.
	///
	/// `Ok(None)` means nothing usable is cached.
	pub(crate) async fn try_silent(&self, use_refresh: bool) -> Result<Option<AuthenticationToken>> {
		let cache = self.context.cache();

		match cache.lookup(&self.cache_query(), OffsetDateTime::now_utc()).await? {
			CacheLookup::Valid(hit) => self.serve_cached(hit).map(Some),
			CacheLookup::RefreshOnly(hit) if use_refresh => self.refresh(hit).await,
			CacheLookup::RefreshOnly(_) | CacheLookup::Miss => Ok(None),
		}
	}

	fn serve_cached(&self, hit: CacheHit) -> Result<AuthenticationToken> {
		self.context.metrics().record_cache_hit();

		AuthenticationToken::from_entry(hit.entry, TokenSource::Cache, self.correlation_id)
	}

	/// Redeems the refresh token of `hit` under the slot's singleflight guard.
	///
	/// The slot is re-read once the guard is held; a concurrent acquisition may already have
	/// refreshed or removed it. A rejection that asks for interaction removes the stale entry.
	async fn refresh(&self, hit: CacheHit) -> Result<Option<AuthenticationToken>> {
		const KIND: FlowKind = FlowKind::Refresh;

		let cache = self.context.cache();
		let _singleflight = cache.refresh_lease(&hit.key).await;
		let now = OffsetDateTime::now_utc();
		let Some(current) = cache.load(&hit.key).await? else {
			return Ok(None);
		};
		let refresh_token = match current.status_at(now, cache.expiration_buffer()) {
			EntryStatus::Valid =>
				return self.serve_cached(CacheHit { key: hit.key, entry: current }).map(Some),
			EntryStatus::Unusable => return Ok(None),
			EntryStatus::RefreshOnly => match current.refresh_token.clone() {
				Some(secret) => secret,
				None => return Ok(None),
			},
		};

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.context.metrics().record_refresh_attempt();

		let outcome = async {
			let response = match self
				.context
				.protocol()
				.exchange_refresh_token(refresh_token.expose(), &self.exchange_parameters())
				.await
			{
				Ok(response) => response,
				Err(e) => {
					if e.requires_interaction() {
						if let Err(evict_error) = cache.remove(&hit.key).await {
							obs::trace_stale_entry_retained(KIND, &evict_error);
						}
					}

					return Err(e);
				},
			};
			let mut entry = response.into_entry(now, Some(refresh_token))?;

			if entry.user_info.is_none() {
				entry.user_info = current.user_info;
				entry.id_token = entry.id_token.or(current.id_token);
			}

			self.commit(entry, TokenSource::RefreshToken, Some(hit.key)).await.map(Some)
		}
		.await;

		common::record(KIND, &outcome);

		outcome
	}
}
