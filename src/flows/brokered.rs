//! Broker delegation and the broker relay entry point.

// self
use crate::{
	_prelude::*,
	broker::BrokerResponse,
	flows::common::{self, Outcome},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome},
	request::{Brokered, RequestVariant, SealedRequest},
	result::{AuthenticationResult, TokenSource},
};

impl<C, M, V> SealedRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	V: RequestVariant,
{
	/// `true` when this request may be delegated to the broker.
	pub(crate) fn broker_eligible(&self, silent: bool) -> bool {
		V::BROKER_CAPABLE
			&& self.context.broker().is_eligible(
				&self.broker_invocation(),
				self.params.allow_silent_requests,
				silent,
			)
	}

	/// Hands the request to the broker process and caches what it returns.
	pub(crate) async fn delegate_to_broker(&self) -> Result<Outcome> {
		const KIND: FlowKind = FlowKind::Broker;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.context.metrics().record_broker_invocation();

		let outcome = async {
			match self.context.broker().invoke(self.broker_invocation()).await? {
				BrokerResponse::Cancelled => Ok(Outcome::Cancelled),
				BrokerResponse::Token(payload) => {
					let entry = payload.into_entry(OffsetDateTime::now_utc())?;

					self.commit(entry, TokenSource::Broker, None).await.map(Outcome::Token)
				},
			}
		}
		.await;

		common::record(KIND, &outcome);

		outcome
	}
}

impl<C, M> SealedRequest<C, M, Brokered>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Relay path run on behalf of the broker.
	///
	/// A configured refresh token credential is redeemed directly. Otherwise the request runs
	/// the regular policy with broker delegation disabled, so the relay never calls back into
	/// the broker.
	pub async fn acquire_token_for_broker(self) -> AuthenticationResult {
		let correlation_id = self.correlation_id;

		common::finish(FlowKind::Broker, "acquire_token_for_broker", correlation_id, async {
			match self.params.refresh_token_credential.clone() {
				Some(credential) => {
					self.context.metrics().record_refresh_attempt();

					let response = self
						.context
						.protocol()
						.exchange_refresh_token(credential.expose(), &self.exchange_parameters())
						.await?;
					let entry = response.into_entry(OffsetDateTime::now_utc(), Some(credential))?;

					self.commit(entry, TokenSource::RefreshToken, None).await.map(Outcome::Token)
				},
				None => self.drive(self.params.silent, false).await,
			}
		})
		.await
	}
}
