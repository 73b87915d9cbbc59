//! Assertion grant entry point.

// self
use crate::{
	_prelude::*,
	flows::common::{self, Outcome},
	http::TokenHttpClient,
	oauth::{AssertionType, TransportErrorMapper},
	obs::FlowKind,
	request::{RequestVariant, SealedRequest, validate},
	result::{AuthenticationResult, TokenSource},
};

impl<C, M, V> SealedRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	V: RequestVariant,
{
	/// Redeems a SAML assertion for tokens.
	///
	/// A blank assertion fails with a parameter error before anything else runs. Cached tokens
	/// (including a refresh) are preferred; when they are missing or the authority asks for
	/// interaction, the assertion is exchanged. The prompt behavior and silent flag do not
	/// apply since this path never shows UI.
	pub async fn acquire_token_by_assertion(
		self,
		assertion: &str,
		assertion_type: AssertionType,
	) -> AuthenticationResult {
		let correlation_id = self.correlation_id;

		if let Err(e) = validate::require("assertion", assertion) {
			return AuthenticationResult::failed(correlation_id, e);
		}

		common::finish(FlowKind::Assertion, "acquire_token_by_assertion", correlation_id, async {
			match self.try_silent(true).await {
				Ok(Some(token)) => return Ok(Outcome::Token(token)),
				Ok(None) => {},
				Err(e) if e.requires_interaction() => {},
				Err(e) => return Err(e),
			}

			self.context.metrics().record_assertion_exchange();

			let response = self
				.context
				.protocol()
				.exchange_assertion(assertion, assertion_type, &self.exchange_parameters())
				.await?;
			let entry = response.into_entry(OffsetDateTime::now_utc(), None)?;

			self.commit(entry, TokenSource::Assertion, None).await.map(Outcome::Token)
		})
		.await
	}
}
