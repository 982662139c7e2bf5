//! Walks through one interactive authorization-code flow end to end: a scripted login surface
//! stands in for the user, and a mock token endpoint answers the code exchange.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use authkit::{
	exchange::ReqwestCodeExchanger,
	flows::{AuthorizationCoordinator, AuthorizationSettings, FlowKind, RedirectParams},
	surface::{LoginSurface, SurfaceFuture, SurfacePrompt},
	tokens::TokenOutcome,
};

/// Surface that prints the authorization URL and fabricates the provider's redirect, standing in
/// for a real browser session.
struct PrintingSurface;
impl LoginSurface for PrintingSurface {
	fn open<'a>(
		&'a self,
		url: &'a Url,
		prompt: &'a SurfacePrompt,
	) -> SurfaceFuture<'a, RedirectParams> {
		println!("Send your user to {url}.");
		println!("Waiting for the redirect back to {}.", &prompt.redirect_uri);

		let params = RedirectParams::new().with("state", &prompt.state).with("code", "demo-code");

		Box::pin(async move { Ok(params) })
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let settings = AuthorizationSettings::builder(FlowKind::OAuth2)
		.authorization_uri(server.url("/authorize"))
		.client_id("demo-client")
		.redirect_uri("https://app.example.com/oauth/callback")
		.scopes(["openid", "profile"])
		.grant_type("authorization_code")
		.build()?;
	let exchanger = ReqwestCodeExchanger::new(server.url("/token"))?
		.with_client_id("demo-client")
		.with_redirect_uri(Url::parse("https://app.example.com/oauth/callback")?);
	let coordinator =
		AuthorizationCoordinator::new(settings, Arc::new(PrintingSurface), Arc::new(exchanger));

	for outcome in coordinator.authorize().await? {
		match outcome {
			TokenOutcome::Token(token) => println!(
				"Issued a {} token: {}.",
				token.token_type.as_deref().unwrap_or("unknown"),
				token.access_token.as_deref().unwrap_or("<none>")
			),
			TokenOutcome::Error(error) => eprintln!("One slot failed with `{}`.", &error.error),
		}
	}

	token_mock.assert_async().await;

	Ok(())
}
