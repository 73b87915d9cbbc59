//! Request variants and the broker-only capability surface.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ParameterError,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	request::{AuthenticationRequest, validate},
};

mod sealed {
	pub trait Sealed {}
}

/// Marker selecting whether a request may be delegated to the broker.
pub trait RequestVariant
where
	Self: sealed::Sealed + 'static + Send + Sync,
{
	/// `true` when the broker may serve this request.
	const BROKER_CAPABLE: bool;
}

/// In-process request; the broker is never consulted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Standard;
impl sealed::Sealed for Standard {}
impl RequestVariant for Standard {
	const BROKER_CAPABLE: bool = false;
}

/// Broker-capable request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Brokered;
impl sealed::Sealed for Brokered {}
impl RequestVariant for Brokered {
	const BROKER_CAPABLE: bool = true;
}

/// Setters available only on unsealed [`Brokered`] requests.
pub trait BrokerCapability {
	/// Replaces the redirect URI the broker answers on.
	fn set_redirect_uri(&mut self, redirect_uri: &str) -> Result<&mut Self, ParameterError>;

	/// Allows the broker to serve this request.
	fn set_allow_silent_requests(&mut self, allow: bool) -> &mut Self;

	/// Refresh token redeemed by the broker relay path; blank input clears it.
	fn set_refresh_token_credential(&mut self, credential: &str) -> &mut Self;

	/// Current redirect URI.
	fn redirect_uri(&self) -> &Url;
}
impl<C, M> BrokerCapability for AuthenticationRequest<C, M, Brokered>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn set_redirect_uri(&mut self, redirect_uri: &str) -> Result<&mut Self, ParameterError> {
		let raw = validate::require("redirect_uri", redirect_uri)?;

		self.params.redirect_uri = validate::redirect_uri_from(raw)?;

		Ok(self)
	}

	fn set_allow_silent_requests(&mut self, allow: bool) -> &mut Self {
		self.params.allow_silent_requests = allow;

		self
	}

	fn set_refresh_token_credential(&mut self, credential: &str) -> &mut Self {
		let credential = credential.trim();

		self.params.refresh_token_credential =
			(!credential.is_empty()).then(|| TokenSecret::new(credential));

		self
	}

	fn redirect_uri(&self) -> &Url {
		&self.params.redirect_uri
	}
}
