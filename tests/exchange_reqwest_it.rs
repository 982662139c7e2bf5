#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use authkit::{
	exchange::{CodeExchanger, ExchangeError, ReqwestCodeExchanger},
	url::Url,
};

fn exchanger(server: &MockServer) -> ReqwestCodeExchanger {
	ReqwestCodeExchanger::new(server.url("/token"))
		.expect("Mock endpoint URL should be valid.")
		.with_client_id("client-it")
		.with_redirect_uri(
			Url::parse("https://app.example.com/callback")
				.expect("Redirect fixture should be valid."),
		)
}

#[tokio::test]
async fn exchange_posts_the_authorization_code_form() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"a1","refresh_token":"r1","token_type":"Bearer","expires_in":3600,"scope":"openid profile"}"#,
			);
		})
		.await;
	let response = exchanger(&server)
		.exchange_code("code-1")
		.await
		.expect("Exchange should resolve against the mock endpoint.");

	assert_eq!(response.access_token.as_deref(), Some("a1"));
	assert_eq!(response.refresh_token.as_deref(), Some("r1"));
	assert_eq!(response.token_type.as_deref(), Some("Bearer"));
	assert_eq!(response.expires_in, Some(3600));
	assert_eq!(response.scope.as_deref(), Some("openid profile"));
	assert!(response.error.is_none());

	mock.assert_async().await;
}

#[tokio::test]
async fn error_payloads_resolve_instead_of_failing() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant","error_description":"expired"}"#);
		})
		.await;
	let response = exchanger(&server)
		.exchange_code("stale")
		.await
		.expect("A structured rejection should resolve.");

	assert_eq!(response.error.as_deref(), Some("invalid_grant"));
	assert_eq!(response.error_description.as_deref(), Some("expired"));
	assert!(response.access_token.is_none());

	mock.assert_async().await;
}

#[tokio::test]
async fn unexpected_statuses_surface_the_body() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(502).body("bad gateway");
		})
		.await;
	let error = exchanger(&server)
		.exchange_code("code-1")
		.await
		.expect_err("An unstructured failure should be reported.");

	let ExchangeError::Endpoint { status, message } = error else {
		panic!("Unstructured failures should carry the HTTP status.");
	};

	assert_eq!(status, 502);
	assert_eq!(message, "bad gateway");
}

#[tokio::test]
async fn malformed_success_bodies_fail_to_parse() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("not json");
		})
		.await;
	let error = exchanger(&server)
		.exchange_code("code-1")
		.await
		.expect_err("A malformed body should be rejected.");

	assert!(matches!(error, ExchangeError::Parse { .. }));
}
