//! Interactive sign-in through the login surface and authorization code redemption.

// self
use crate::{
	_prelude::*,
	flows::{
		common::{self, Outcome},
		session::{AuthorizationSession, RedirectOutcome},
	},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome},
	presenter::{PresentationError, PresentationGuard},
	request::{RequestVariant, SealedRequest},
	result::TokenSource,
};

impl<C, M, V> SealedRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	V: RequestVariant,
{
	/// Shows the authorize URL, then redeems the returned code.
	///
	/// The login surface is dismissed before the code is redeemed, and exactly once on every
	/// exit path.
	pub(crate) async fn sign_in_interactively(&self) -> Result<Outcome> {
		const KIND: FlowKind = FlowKind::Interactive;

		let Some(presenter) = self.context.presenter() else {
			return Err(Error::Presentation { message: "no login surface is configured".into() });
		};

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.context.metrics().record_interactive_prompt();

		let outcome = async {
			let descriptor = &self.context.descriptor;
			let session = AuthorizationSession::new(descriptor, &self.params, self.correlation_id);
			let redirect = {
				let mut guard = PresentationGuard::new(presenter.as_ref());

				guard.show(session.authorize_url().clone(), self.params.redirect_uri.clone()).await
			};
			let redirect = match redirect {
				Ok(url) => url,
				Err(PresentationError::Cancelled) => return Ok(Outcome::Cancelled),
				Err(e) => return Err(Error::Presentation { message: e.to_string() }),
			};
			let code = match session.parse_redirect(self.context.strategy.as_ref(), &redirect)? {
				RedirectOutcome::Code(code) => code,
				RedirectOutcome::Cancelled => return Ok(Outcome::Cancelled),
			};
			let response = self
				.context
				.protocol()
				.exchange_authorization_code(
					&code,
					session.pkce_verifier(),
					&self.exchange_parameters(),
				)
				.await?;
			let entry = response.into_entry(OffsetDateTime::now_utc(), None)?;

			self.commit(entry, TokenSource::Interactive, None).await.map(Outcome::Token)
		}
		.await;

		common::record(KIND, &outcome);

		outcome
	}
}
