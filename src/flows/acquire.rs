//! The acquisition driver: cache, refresh, broker, interactive, in that order.

// self
use crate::{
	_prelude::*,
	flows::{
		common::{self, Outcome},
		plan::{AcquisitionPlan, Escalation},
	},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind},
	request::{RequestVariant, SealedRequest},
	result::AuthenticationResult,
};

impl<C, M, V> SealedRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	V: RequestVariant,
{
	/// Acquires a token, escalating as the request's prompt behavior and silent flag allow.
	pub async fn acquire_token(self) -> AuthenticationResult {
		let silent = self.params.silent;
		let correlation_id = self.correlation_id;

		common::finish(FlowKind::Acquire, "acquire_token", correlation_id, self.drive(silent, true)).await
	}

	/// Acquires a token from the cache or a refresh token only; never shows UI or calls the
	/// broker. Fails with [`Error::UserInputNeeded`] when nothing usable is cached.
	pub async fn acquire_token_silent(self) -> AuthenticationResult {
		let correlation_id = self.correlation_id;

		common::finish(FlowKind::Silent, "acquire_token_silent", correlation_id, self.drive(true, true))
			.await
	}

	/// Runs the policy resolved for this request.
	///
	/// With `silent` set, any failure of the silent paths is terminal. Otherwise a rejection
	/// asking for interaction escalates to the broker or the login surface, and a broker that is
	/// unavailable or declines falls through to the login surface.
	pub(crate) async fn drive(&self, silent: bool, broker_allowed: bool) -> Result<Outcome> {
		let broker_eligible = broker_allowed && !silent && self.broker_eligible(silent);
		let plan = AcquisitionPlan::resolve(self.params.prompt, silent, broker_eligible);

		if plan.use_cache {
			match self.try_silent(plan.use_refresh).await {
				Ok(Some(token)) => return Ok(Outcome::Token(token)),
				Ok(None) => {},
				Err(e) if plan.may_interact() && e.requires_interaction() => {
					let target = escalation_target(plan.escalation);

					obs::trace_escalation(FlowKind::Refresh, target, "interaction_required");
				},
				Err(e) => return Err(e),
			}
		}

		match plan.escalation {
			Escalation::None => Err(Error::UserInputNeeded),
			Escalation::Interactive => self.sign_in_interactively().await,
			Escalation::BrokerThenInteractive => match self.delegate_to_broker().await {
				Err(Error::Broker(e)) if e.falls_through() => {
					obs::trace_escalation(FlowKind::Broker, FlowKind::Interactive, &e.to_string());

					self.sign_in_interactively().await
				},
				outcome => outcome,
			},
		}
	}
}

fn escalation_target(escalation: Escalation) -> FlowKind {
	match escalation {
		Escalation::BrokerThenInteractive => FlowKind::Broker,
		Escalation::None | Escalation::Interactive => FlowKind::Interactive,
	}
}
