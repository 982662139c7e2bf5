//! Validated configuration for one interactive authorization.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, FlowError},
	flows::FlowKind,
};

/// Everything a coordinator needs to know before starting a flow.
///
/// Built through [`builder`](Self::builder); URLs are parsed and the client id checked during
/// [`build`](AuthorizationSettingsBuilder::build), so a constructed value is always usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationSettings {
	flow: FlowKind,
	authorization_uri: Url,
	client_id: String,
	redirect_uri: Url,
	scopes: Vec<String>,
	response_type: Option<String>,
	grant_type: Option<String>,
	timeout: Option<Duration>,
}
impl AuthorizationSettings {
	/// Starts a builder for the given flow kind.
	pub fn builder(flow: FlowKind) -> AuthorizationSettingsBuilder {
		AuthorizationSettingsBuilder {
			flow,
			authorization_uri: String::new(),
			client_id: String::new(),
			redirect_uri: String::new(),
			scopes: Vec::new(),
			response_type: None,
			grant_type: None,
			timeout: None,
		}
	}

	/// Flow kind these settings drive.
	pub fn flow(&self) -> FlowKind {
		self.flow
	}

	/// Authorization endpoint.
	pub fn authorization_uri(&self) -> &Url {
		&self.authorization_uri
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Redirect URI the server sends the user back to.
	pub fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}

	/// Scopes requested from the server.
	pub fn scopes(&self) -> &[String] {
		&self.scopes
	}

	/// Explicit response-type configuration, when one was supplied.
	pub fn response_type(&self) -> Option<&str> {
		self.response_type.as_deref()
	}

	/// Grant-type label used when no explicit response type is configured.
	pub fn grant_type(&self) -> Option<&str> {
		self.grant_type.as_deref()
	}

	/// Upper bound on how long the login surface may stay open.
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout
	}

	/// Resolves the response-type string for an attempt.
	///
	/// An explicit configuration wins; otherwise `authorization_code` maps to `code` and
	/// `implicit` to the flow's implicit form. Any other grant label fails with the
	/// `unknown_state` code.
	pub(crate) fn resolve_response_type(&self) -> Result<String, FlowError> {
		if let Some(explicit) = &self.response_type {
			return Ok(explicit.clone());
		}

		match self.grant_type.as_deref() {
			Some("authorization_code") => Ok("code".into()),
			Some("implicit") => Ok(self.flow.implicit_response_type().into()),
			other => Err(FlowError::UnknownResponseType {
				configured: other.unwrap_or_default().into(),
			}),
		}
	}
}

/// Builder collecting raw settings; validation happens in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct AuthorizationSettingsBuilder {
	flow: FlowKind,
	authorization_uri: String,
	client_id: String,
	redirect_uri: String,
	scopes: Vec<String>,
	response_type: Option<String>,
	grant_type: Option<String>,
	timeout: Option<Duration>,
}
impl AuthorizationSettingsBuilder {
	/// Sets the authorization endpoint.
	pub fn authorization_uri(mut self, uri: impl Into<String>) -> Self {
		self.authorization_uri = uri.into();

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
		self.redirect_uri = uri.into();

		self
	}

	/// Replaces the requested scopes.
	pub fn scopes<S>(mut self, scopes: impl IntoIterator<Item = S>) -> Self
	where
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets an explicit response-type configuration, e.g. `"code id_token"`.
	pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
		self.response_type = Some(response_type.into());

		self
	}

	/// Sets the grant-type label the response type is derived from.
	pub fn grant_type(mut self, grant_type: impl Into<String>) -> Self {
		self.grant_type = Some(grant_type.into());

		self
	}

	/// Bounds how long the login surface may stay open.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Validates the collected values and produces usable settings.
	pub fn build(self) -> Result<AuthorizationSettings, ConfigError> {
		let authorization_uri = Url::parse(&self.authorization_uri)
			.map_err(|source| ConfigError::InvalidAuthorizationUri { source })?;
		let redirect_uri = Url::parse(&self.redirect_uri)
			.map_err(|source| ConfigError::InvalidRedirect { source })?;

		if self.client_id.is_empty() {
			return Err(ConfigError::MissingClientId);
		}

		Ok(AuthorizationSettings {
			flow: self.flow,
			authorization_uri,
			client_id: self.client_id,
			redirect_uri,
			scopes: self.scopes,
			response_type: self.response_type,
			grant_type: self.grant_type,
			timeout: self.timeout,
		})
	}
}
