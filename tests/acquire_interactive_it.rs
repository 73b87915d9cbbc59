#![cfg(feature = "reqwest")]

mod support;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use oauth2_native::{
	auth::{CorrelationId, PromptBehavior, UserId, UserIdentifier},
	error::Error,
	request::AuthenticationRequest,
	result::{AuthenticationResult, ErrorKind, TokenSource},
};
use support::*;

#[tokio::test]
async fn empty_cache_signs_in_and_caches_the_token() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "XYZ")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("redirect_uri", REDIRECT_URI)
				.form_urlencoded_tuple("resource", RESOURCE);
			then.status(200).header("content-type", "application/json").body(token_body("T1", Some("R1")));
		})
		.await;
	let presenter = SpyPresenter::new(SignIn::Code("XYZ"));
	let (context, store) = context(&server);
	let context = Arc::new(context.with_presenter(presenter.clone()));
	let request = AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
		.expect("Request should build.");
	let result = request.acquire_token().await;
	let issued = result.token().expect("Interactive acquisition should succeed.");

	assert_eq!(issued.access_token.expose(), "T1");
	assert_eq!(issued.source, TokenSource::Interactive);
	assert!(issued.refresh_token_present);
	token.assert_calls_async(1).await;
	assert_eq!(presenter.shows(), 1);
	assert_eq!(presenter.dismissals(), 1);
	assert_eq!(presenter.last_query("client_id").as_deref(), Some(CLIENT_ID));
	assert_eq!(presenter.last_query("resource").as_deref(), Some(RESOURCE));
	assert_eq!(presenter.last_query("code_challenge_method").as_deref(), Some("S256"));

	let stored = store.get(&key(&context, None)).expect("The token should be cached.");

	assert_eq!(stored.access_token.as_ref().map(|secret| secret.expose()), Some("T1"));
	assert_eq!(context.metrics().interactive_prompts(), 1);
}

#[tokio::test]
async fn cancellation_is_not_a_failure_and_dismisses_once() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(token_body("T1", None));
		})
		.await;
	let presenter = SpyPresenter::new(SignIn::Cancel);
	let (context, store) = context(&server);
	let context = Arc::new(context.with_presenter(presenter.clone()));
	let correlation_id = CorrelationId::new_v4();
	let mut request = AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
		.expect("Request should build.");

	request.set_correlation_id(correlation_id);

	let result = request.acquire_token().await;

	assert!(matches!(result, AuthenticationResult::Cancelled { correlation_id: id } if id == correlation_id));
	assert_eq!(presenter.dismissals(), 1);
	token.assert_calls_async(0).await;
	assert!(store.is_empty());
}

#[tokio::test]
async fn presenter_failures_and_state_mismatches_fail_with_one_dismissal() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(token_body("T1", None));
		})
		.await;

	for (sign_in, kind) in [
		(SignIn::Fail("headless session"), ErrorKind::Presentation),
		(SignIn::ForgedState("forged"), ErrorKind::StateMismatch),
	] {
		let presenter = SpyPresenter::new(sign_in);
		let (context, _) = context(&server);
		let context = Arc::new(context.with_presenter(presenter.clone()));
		let result = AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
			.expect("Request should build.")
			.acquire_token()
			.await;

		assert_eq!(result.error().map(|error| error.kind()), Some(kind));
		assert_eq!(presenter.dismissals(), 1);
	}

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn required_users_reject_tokens_issued_to_someone_else() {
	let server = MockServer::start_async().await;
	let body = format!(
		"{{\"access_token\":\"T-bob\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"id_token\":\"{}\"}}",
		id_token("bob@contoso.com")
	);
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await;
	let alice = UserId::new("alice@contoso.com").expect("User fixture should be valid.");
	let presenter = SpyPresenter::new(SignIn::Code("XYZ"));
	let (context, store) = context(&server);
	let context = Arc::new(context.with_presenter(presenter.clone()));
	let mut request = AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
		.expect("Request should build.");

	request.set_user_identifier(Some(UserIdentifier::required_displayable(alice.clone())));

	let result = request.acquire_token().await;
	let error = result.error().expect("A token for another user must be rejected.");

	assert_eq!(error.kind(), ErrorKind::UserMismatch);
	assert!(matches!(
		&error.error,
		Error::UserMismatch { expected, actual }
			if expected == "alice@contoso.com" && actual == "bob@contoso.com"
	));
	assert_eq!(presenter.last_query("login_hint").as_deref(), Some("alice@contoso.com"));
	assert!(store.is_empty(), "Mismatched tokens must not be cached.");

	let mut request = AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
		.expect("Request should build.");

	request.set_user_identifier(Some(UserIdentifier::optional_displayable(alice)));

	let issued = request.acquire_token().await;

	assert_eq!(issued.token().map(|token| token.access_token.expose()), Some("T-bob"));
	assert!(store.get(&key(&context, Some("bob@contoso.com"))).is_some());
	assert!(store.get(&key(&context, Some("alice@contoso.com"))).is_none());
	token.assert_calls_async(2).await;
}

#[tokio::test]
async fn code_redemption_errors_keep_their_kind() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"unauthorized_client\",\"error_description\":\"Client is disabled\"}");
		})
		.await;
	let presenter = SpyPresenter::new(SignIn::Code("XYZ"));
	let (context, store) = context(&server);
	let context = Arc::new(context.with_presenter(presenter.clone()));
	let result = AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
		.expect("Request should build.")
		.acquire_token()
		.await;
	let error = result.error().expect("Rejected codes must fail.");

	assert_eq!(error.kind(), ErrorKind::UnauthorizedClient);
	assert_eq!(error.protocol_code(), Some("unauthorized_client"));
	assert_eq!(presenter.dismissals(), 1);
	assert!(store.is_empty());
}

#[tokio::test]
async fn prompt_behavior_and_hints_reach_the_authorize_url() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(token_body("T2", None));
		})
		.await;
	let presenter = SpyPresenter::new(SignIn::Code("XYZ"));
	let (context, store) = context(&server);
	let context = Arc::new(context.with_presenter(presenter.clone()));

	seed(&store, key(&context, Some("alice@contoso.com")), valid_entry("cached")).await;

	let mut request = AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
		.expect("Request should build.");

	request
		.set_user_id("alice@contoso.com")
		.expect("User id should be accepted.")
		.set_prompt_behavior(PromptBehavior::Always)
		.set_extra_query_parameters("&domain_hint=contoso.com");

	let issued = request.acquire_token().await;

	assert_eq!(
		issued.token().map(|token| token.access_token.expose().to_owned()).as_deref(),
		Some("T2"),
		"Always must skip the valid cached token."
	);
	assert_eq!(presenter.last_query("prompt").as_deref(), Some("login"));
	assert_eq!(presenter.last_query("login_hint").as_deref(), Some("alice@contoso.com"));
	assert_eq!(presenter.last_query("domain_hint").as_deref(), Some("contoso.com"));
	assert_eq!(context.metrics().cache_hits(), 0);
}

#[tokio::test]
async fn missing_presenter_is_a_presentation_failure() {
	let server = MockServer::start_async().await;
	let (context, _) = context(&server);
	let context = Arc::new(context);
	let result = AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
		.expect("Request should build.")
		.acquire_token()
		.await;

	assert!(matches!(result.error().map(|error| &error.error), Some(Error::Presentation { .. })));
}

#[tokio::test]
async fn completion_callbacks_receive_exactly_one_result() {
	let server = MockServer::start_async().await;
	let presenter = SpyPresenter::new(SignIn::Cancel);
	let (context, _) = context(&server);
	let context = Arc::new(context.with_presenter(presenter));
	let mut delivered = Vec::new();

	AuthenticationRequest::new(&context, REDIRECT_URI, CLIENT_ID, RESOURCE)
		.expect("Request should build.")
		.acquire_token_with(|result| delivered.push(result))
		.await;

	assert_eq!(delivered.len(), 1);
	assert!(delivered[0].is_cancelled());
}
