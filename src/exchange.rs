//! Code-exchange contract: the backend endpoint swapping authorization codes for tokens.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Future alias returned by [`CodeExchanger`] implementations.
pub type ExchangeFuture<'a> =
	Pin<Box<dyn Future<Output = Result<CodeExchangeResponse, ExchangeError>> + 'a + Send>>;

/// Backend collaborator exchanging an authorization code for tokens.
pub trait CodeExchanger
where
	Self: Send + Sync,
{
	/// Submits `code` and resolves with the endpoint's response.
	fn exchange_code<'a>(&'a self, code: &'a str) -> ExchangeFuture<'a>;
}

/// Token payload returned by a code-exchange endpoint.
///
/// Field names serialize camelCase for the embedding application; deserialization also accepts
/// the snake_case names token endpoints emit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExchangeResponse {
	/// Access token issued for the code.
	#[serde(default, alias = "access_token", skip_serializing_if = "Option::is_none")]
	pub access_token: Option<String>,
	/// Refresh token, when the endpoint issues one.
	#[serde(default, alias = "refresh_token", skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// OpenID Connect ID token, when the endpoint issues one.
	#[serde(default, alias = "id_token", skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Token type reported by the endpoint.
	#[serde(default, alias = "token_type", skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Token lifetime in seconds.
	#[serde(default, alias = "expires_in", skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	/// Granted scope string.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Error code, when the endpoint rejected the grant.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Human-readable error detail.
	#[serde(default, alias = "error_description", skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
}
impl CodeExchangeResponse {
	/// Parses a JSON body, reporting the failing path on malformed payloads.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ExchangeError> {
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ExchangeError::Parse { source })
	}
}

type BoxError = Box<dyn StdError + Send + Sync>;

/// Failures produced by [`CodeExchanger`] implementations.
///
/// The coordinator never propagates these; they collapse into the failing slot's
/// [`TokenError`](crate::tokens::TokenError).
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Transport-level failure reaching the exchange endpoint.
	#[error("Code-exchange transport failed.")]
	Transport {
		/// Underlying transport failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint answered with an unexpected HTTP status.
	#[error("Code-exchange endpoint returned HTTP {status}: {message}.")]
	Endpoint {
		/// HTTP status code.
		status: u16,
		/// Response body or reason phrase.
		message: String,
	},
	/// Response body could not be parsed.
	#[error("Code-exchange response is malformed JSON.")]
	Parse {
		/// Structured parsing failure naming the failing path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
}
impl ExchangeError {
	/// Wraps a transport-specific failure.
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Box::new(src) }
	}
}

/// [`CodeExchanger`] backed by a reqwest client POSTing the standard
/// `grant_type=authorization_code` form.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestCodeExchanger {
	client: ReqwestClient,
	endpoint: Url,
	client_id: Option<String>,
	redirect_uri: Option<Url>,
}
#[cfg(feature = "reqwest")]
impl ReqwestCodeExchanger {
	/// Builds an exchanger with a fresh reqwest client.
	pub fn new(endpoint: impl AsRef<str>) -> Result<Self, ConfigError> {
		let endpoint = Url::parse(endpoint.as_ref())
			.map_err(|source| ConfigError::InvalidExchangeEndpoint { source })?;
		let client = ReqwestClient::builder().build()?;

		Ok(Self::with_client(client, endpoint))
	}

	/// Builds an exchanger around an existing reqwest client.
	pub fn with_client(client: ReqwestClient, endpoint: Url) -> Self {
		Self { client, endpoint, client_id: None, redirect_uri: None }
	}

	/// Adds a `client_id` form field to every exchange.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Adds a `redirect_uri` form field to every exchange.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	async fn post_code(&self, code: &str) -> Result<CodeExchangeResponse, ExchangeError> {
		let mut form = vec![("grant_type", "authorization_code"), ("code", code)];

		if let Some(client_id) = &self.client_id {
			form.push(("client_id", client_id.as_str()));
		}
		if let Some(redirect_uri) = &self.redirect_uri {
			form.push(("redirect_uri", redirect_uri.as_str()));
		}

		let response = self
			.client
			.post(self.endpoint.clone())
			.form(&form)
			.send()
			.await
			.map_err(ExchangeError::transport)?;
		let status = response.status();
		let body = response.bytes().await.map_err(ExchangeError::transport)?;

		if !status.is_success() {
			// Error payloads still parse; anything else is reported verbatim.
			if let Ok(parsed) = CodeExchangeResponse::from_json_slice(&body)
				&& parsed.error.is_some()
			{
				return Ok(parsed);
			}

			return Err(ExchangeError::Endpoint {
				status: status.as_u16(),
				message: String::from_utf8_lossy(&body).into_owned(),
			});
		}

		CodeExchangeResponse::from_json_slice(&body)
	}
}
#[cfg(feature = "reqwest")]
impl CodeExchanger for ReqwestCodeExchanger {
	fn exchange_code<'a>(&'a self, code: &'a str) -> ExchangeFuture<'a> {
		Box::pin(self.post_code(code))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn response_accepts_snake_case_endpoint_fields() {
		let response = CodeExchangeResponse::from_json_slice(
			br#"{"access_token":"a1","token_type":"Bearer","expires_in":3600,"scope":"a b"}"#,
		)
		.expect("Token endpoint payload should parse.");

		assert_eq!(response.access_token.as_deref(), Some("a1"));
		assert_eq!(response.token_type.as_deref(), Some("Bearer"));
		assert_eq!(response.expires_in, Some(3600));
		assert_eq!(response.scope.as_deref(), Some("a b"));
	}

	#[test]
	fn response_serializes_camel_case() {
		let response = CodeExchangeResponse {
			access_token: Some("a1".into()),
			id_token: Some("i1".into()),
			..Default::default()
		};
		let json = serde_json::to_string(&response).expect("Response should serialize.");

		assert!(json.contains(r#""accessToken":"a1""#));
		assert!(json.contains(r#""idToken":"i1""#));
	}

	#[test]
	fn parse_failures_name_the_failing_path() {
		let error = CodeExchangeResponse::from_json_slice(br#"{"expires_in":"soon"}"#)
			.expect_err("Malformed payload should fail to parse.");

		let ExchangeError::Parse { source } = error else {
			panic!("Parse failures should carry the structured source.");
		};

		assert_eq!(source.path().to_string(), "expires_in");
	}
}
