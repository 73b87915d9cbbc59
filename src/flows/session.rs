//! Authorization session for the interactive path: PKCE, `state`, the authorize URL, and
//! redirect parsing.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::CorrelationId,
	authority::{
		AuthorityDescriptor, AuthorityErrorContext, AuthorityErrorKind, AuthorityStrategy, GrantType,
	},
	error::{ProtocolError, ProtocolErrorKind},
	http::CLIENT_REQUEST_ID,
	oauth,
	request::RequestParameters,
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;
const CANCEL_SUBCODE: &str = "cancel";

/// PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// What the redirect delivered.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RedirectOutcome {
	Code(String),
	Cancelled,
}

/// One interactive sign-in attempt.
pub(crate) struct AuthorizationSession {
	state: String,
	pkce: Option<PkcePair>,
	authorize_url: Url,
}
impl AuthorizationSession {
	pub(crate) fn new(
		descriptor: &AuthorityDescriptor,
		params: &RequestParameters,
		correlation_id: CorrelationId,
	) -> Self {
		let state = random_string(STATE_LEN);
		let pkce = descriptor.quirks.pkce_required.then(PkcePair::generate);
		let authorize_url =
			build_authorize_url(descriptor, params, correlation_id, &state, pkce.as_ref());

		Self { state, pkce, authorize_url }
	}

	pub(crate) fn authorize_url(&self) -> &Url {
		&self.authorize_url
	}

	pub(crate) fn pkce_verifier(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pair| pair.verifier.as_str())
	}

	/// Extracts the authorization code from the URL the presenter stopped at.
	pub(crate) fn parse_redirect(
		&self,
		strategy: &dyn AuthorityStrategy,
		redirect: &Url,
	) -> Result<RedirectOutcome> {
		let mut code = None;
		let mut state = None;
		let mut error = None;
		let mut description = None;
		let mut subcode = None;

		for (name, value) in redirect.query_pairs() {
			match name.as_ref() {
				"code" => code = Some(value.into_owned()),
				"state" => state = Some(value.into_owned()),
				"error" => error = Some(value.into_owned()),
				"error_description" => description = Some(value.into_owned()),
				"error_subcode" => subcode = Some(value.into_owned()),
				_ => {},
			}
		}

		if let Some(error) = error {
			if error == "access_denied" && subcode.as_deref() == Some(CANCEL_SUBCODE) {
				return Ok(RedirectOutcome::Cancelled);
			}

			return Err(authorize_error(strategy, error, description).into());
		}
		if state.as_deref() != Some(self.state.as_str()) {
			return Err(Error::StateMismatch);
		}

		match code.filter(|code| !code.is_empty()) {
			Some(code) => Ok(RedirectOutcome::Code(code)),
			None => Err(ProtocolError::new(
				ProtocolErrorKind::Fatal,
				GrantType::AuthorizationCode,
				None,
				Some("The authorization response did not include a code".into()),
				None,
			)
			.into()),
		}
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("state", &self.state)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.pkce.as_ref().map(|pair| &pair.challenge))
			.field("code_challenge_method", &self.pkce.as_ref().map(|pair| pair.method))
			.finish()
	}
}

#[derive(Clone)]
struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

fn build_authorize_url(
	descriptor: &AuthorityDescriptor,
	params: &RequestParameters,
	correlation_id: CorrelationId,
	state: &str,
	pkce: Option<&PkcePair>,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", params.client_id());
	pairs.append_pair("redirect_uri", params.redirect_uri().as_str());
	pairs.append_pair("resource", params.resource());
	pairs.append_pair(
		"scope",
		&oauth::scope_parameter(params.scope(), descriptor.quirks.scope_delimiter),
	);
	pairs.append_pair("state", state);

	if let Some(pkce) = pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", pkce.method.as_str());
	}
	if let Some(hint) = params.user().and_then(|user| user.login_hint()) {
		pairs.append_pair("login_hint", hint);
	}
	if let Some(prompt) = params.prompt().prompt_parameter() {
		pairs.append_pair("prompt", prompt);
	}
	if descriptor.quirks.send_client_request_id {
		pairs.append_pair(CLIENT_REQUEST_ID, &correlation_id.to_string());
	}

	drop(pairs);

	if let Some(extra) = params.extra_query_parameters() {
		let query = format!("{}&{extra}", url.query().unwrap_or_default());

		url.set_query(Some(&query));
	}

	url
}

fn authorize_error(
	strategy: &dyn AuthorityStrategy,
	error: String,
	description: Option<String>,
) -> ProtocolError {
	let mut ctx =
		AuthorityErrorContext::new(GrantType::AuthorizationCode).with_oauth_error(error.clone());

	if let Some(description) = &description {
		ctx = ctx.with_error_description(description.clone());
	}

	let kind = match strategy.classify_token_error(&ctx) {
		AuthorityErrorKind::InteractionRequired => ProtocolErrorKind::InteractionRequired,
		AuthorityErrorKind::InvalidGrant => ProtocolErrorKind::InvalidGrant,
		AuthorityErrorKind::UnauthorizedClient => ProtocolErrorKind::UnauthorizedClient,
		AuthorityErrorKind::Transient | AuthorityErrorKind::Fatal => ProtocolErrorKind::Fatal,
	};

	ProtocolError::new(kind, GrantType::AuthorizationCode, Some(error), description, None)
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}
