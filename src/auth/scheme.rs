//! Credential scheme labels and the per-scheme configuration records attached to requests.

// crates.io
use serde_json::Value as JsonValue;
// self
use crate::{_prelude::*, tokens::TokenOutcome};

/// Record marker carried by serialized authorization entries.
pub const AUTHORIZATION_KIND: &str = "Request#Authorization";

/// Credential schemes understood by the request decorators.
///
/// Labels parse case-insensitively from the UI-facing strings (`"oauth 2"`, `"open id"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthorizationKind {
	/// HTTP Basic credentials.
	Basic,
	/// Static bearer token.
	Bearer,
	/// OAuth 2.0 access token.
	OAuth2,
	/// OpenID Connect token set.
	OpenId,
	/// NTLM handshake credentials.
	Ntlm,
	/// Client certificate reference resolved by the transport engine.
	ClientCertificate,
}
impl AuthorizationKind {
	/// Returns the canonical lower-case label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Basic => "basic",
			Self::Bearer => "bearer",
			Self::OAuth2 => "oauth 2",
			Self::OpenId => "open id",
			Self::Ntlm => "ntlm",
			Self::ClientCertificate => "client certificate",
		}
	}
}
impl FromStr for AuthorizationKind {
	type Err = SchemeParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"basic" => Ok(Self::Basic),
			"bearer" => Ok(Self::Bearer),
			"oauth 2" => Ok(Self::OAuth2),
			"open id" => Ok(Self::OpenId),
			"ntlm" => Ok(Self::Ntlm),
			"client certificate" => Ok(Self::ClientCertificate),
			_ => Err(SchemeParseError::UnknownKind { label: s.to_owned() }),
		}
	}
}
impl TryFrom<String> for AuthorizationKind {
	type Error = SchemeParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<AuthorizationKind> for String {
	fn from(value: AuthorizationKind) -> Self {
		value.as_str().to_owned()
	}
}
impl Display for AuthorizationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failures raised while parsing authorization entries.
#[derive(Debug, ThisError)]
pub enum SchemeParseError {
	/// Scheme label is not one of the supported kinds.
	#[error("Unknown authorization kind `{label}`.")]
	UnknownKind {
		/// Label as it appeared in the input.
		label: String,
	},
	/// Scheme configuration does not match the declared kind.
	#[error("Authorization config does not match its declared kind.")]
	Config(#[from] serde_json::Error),
}

/// HTTP Basic credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicConfig {
	/// Account name; an empty value disables the entry.
	#[serde(default)]
	pub username: String,
	/// Optional password, treated as empty when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
}

/// Static bearer token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearerConfig {
	/// Token appended verbatim after the `Bearer` prefix.
	#[serde(default)]
	pub token: String,
}

/// Transport position for an OAuth 2.0 token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
	/// Deliver through a request header.
	#[default]
	Header,
	/// Deliver through a URL query parameter.
	Query,
}

/// OAuth 2.0 token delivery configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Config {
	/// Access token to deliver; an absent or empty value disables the entry.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<String>,
	/// Token type prefixed to the delivered value.
	#[serde(default = "default_token_type")]
	pub token_type: String,
	/// Whether the token travels in a header or a query parameter.
	#[serde(default)]
	pub delivery_method: DeliveryMethod,
	/// Header name or query parameter name receiving the token.
	#[serde(default = "default_delivery_name")]
	pub delivery_name: String,
}
impl Default for OAuth2Config {
	fn default() -> Self {
		Self {
			access_token: None,
			token_type: default_token_type(),
			delivery_method: DeliveryMethod::default(),
			delivery_name: default_delivery_name(),
		}
	}
}

/// OpenID Connect configuration: OAuth 2.0 delivery plus the token set obtained interactively.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcConfig {
	/// Token delivery settings shared with the OAuth 2.0 handler.
	#[serde(flatten)]
	pub oauth2: OAuth2Config,
	/// Token records produced by the last interactive authorization.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tokens: Option<Vec<TokenOutcome>>,
	/// Index into [`tokens`](Self::tokens) selecting the active record.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_in_use: Option<usize>,
}

/// NTLM handshake credentials; never persisted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NtlmConfig {
	/// Windows domain, resolved from the server challenge when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
	/// Account name.
	#[serde(default)]
	pub username: String,
	/// Account password.
	#[serde(default)]
	pub password: String,
}
impl Debug for NtlmConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NtlmConfig")
			.field("domain", &self.domain)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Opaque client certificate reference; the transport engine resolves it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateConfig {
	/// Certificate identifier in the transport engine's store.
	pub id: String,
}

/// Scheme-specific configuration attached to an authorization entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthConfig {
	/// Basic credentials.
	Basic(BasicConfig),
	/// Bearer token.
	Bearer(BearerConfig),
	/// OAuth 2.0 delivery settings.
	OAuth2(OAuth2Config),
	/// OpenID Connect settings.
	OpenId(OidcConfig),
	/// NTLM credentials.
	Ntlm(NtlmConfig),
	/// Client certificate reference.
	ClientCertificate(CertificateConfig),
}
impl AuthConfig {
	/// Returns the Basic credentials when this config carries them.
	pub fn basic(&self) -> Option<&BasicConfig> {
		match self {
			Self::Basic(c) => Some(c),
			_ => None,
		}
	}

	/// Returns the bearer token config when this config carries it.
	pub fn bearer(&self) -> Option<&BearerConfig> {
		match self {
			Self::Bearer(c) => Some(c),
			_ => None,
		}
	}

	/// Returns the OAuth 2.0 config when this config carries it.
	pub fn oauth2(&self) -> Option<&OAuth2Config> {
		match self {
			Self::OAuth2(c) => Some(c),
			_ => None,
		}
	}

	/// Returns the OpenID Connect config when this config carries it.
	pub fn open_id(&self) -> Option<&OidcConfig> {
		match self {
			Self::OpenId(c) => Some(c),
			_ => None,
		}
	}

	/// Returns the NTLM credentials when this config carries them.
	pub fn ntlm(&self) -> Option<&NtlmConfig> {
		match self {
			Self::Ntlm(c) => Some(c),
			_ => None,
		}
	}

	/// Returns the certificate reference when this config carries it.
	pub fn client_certificate(&self) -> Option<&CertificateConfig> {
		match self {
			Self::ClientCertificate(c) => Some(c),
			_ => None,
		}
	}
}

/// One credential entry attached to a request.
///
/// Serialization resolves [`config`](Self::config) against the sibling `type` field, so a record
/// declaring `"type": "basic"` always round-trips into [`AuthConfig::Basic`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRequestAuthorization", into = "RawRequestAuthorization")]
pub struct RequestAuthorization {
	/// Record marker, [`AUTHORIZATION_KIND`] unless the source supplied its own.
	pub kind: String,
	/// Credential scheme this entry configures.
	pub auth_type: AuthorizationKind,
	/// Whether the next decoration pass applies this entry.
	pub enabled: bool,
	/// Editor-side validity marker; carried but never consulted by the decorators.
	pub valid: bool,
	/// Scheme configuration, absent for bare placeholder entries.
	pub config: Option<AuthConfig>,
}
impl RequestAuthorization {
	/// Builds an enabled, valid entry for the given scheme.
	pub fn new(auth_type: AuthorizationKind, config: Option<AuthConfig>) -> Self {
		Self { kind: AUTHORIZATION_KIND.to_owned(), auth_type, enabled: true, valid: true, config }
	}

	/// Flips the `enabled` flag, consuming and returning the entry.
	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;

		self
	}
}
impl TryFrom<RawRequestAuthorization> for RequestAuthorization {
	type Error = SchemeParseError;

	fn try_from(raw: RawRequestAuthorization) -> Result<Self, Self::Error> {
		let auth_type = raw.auth_type.parse::<AuthorizationKind>()?;
		let config = raw.config.map(|value| parse_config(auth_type, value)).transpose()?;

		Ok(Self { kind: raw.kind, auth_type, enabled: raw.enabled, valid: raw.valid, config })
	}
}
impl From<RequestAuthorization> for RawRequestAuthorization {
	fn from(auth: RequestAuthorization) -> Self {
		Self {
			kind: auth.kind,
			auth_type: auth.auth_type.as_str().to_owned(),
			enabled: auth.enabled,
			valid: auth.valid,
			config: auth.config.and_then(|config| serde_json::to_value(config).ok()),
		}
	}
}

/// Wire-shaped authorization entry; `config` stays untyped until the kind is known.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequestAuthorization {
	#[serde(default = "default_kind")]
	kind: String,
	#[serde(rename = "type")]
	auth_type: String,
	#[serde(default = "default_true")]
	enabled: bool,
	#[serde(default = "default_true")]
	valid: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	config: Option<JsonValue>,
}

fn parse_config(kind: AuthorizationKind, value: JsonValue) -> Result<AuthConfig, SchemeParseError> {
	let config = match kind {
		AuthorizationKind::Basic => AuthConfig::Basic(serde_json::from_value(value)?),
		AuthorizationKind::Bearer => AuthConfig::Bearer(serde_json::from_value(value)?),
		AuthorizationKind::OAuth2 => AuthConfig::OAuth2(serde_json::from_value(value)?),
		AuthorizationKind::OpenId => AuthConfig::OpenId(serde_json::from_value(value)?),
		AuthorizationKind::Ntlm => AuthConfig::Ntlm(serde_json::from_value(value)?),
		AuthorizationKind::ClientCertificate =>
			AuthConfig::ClientCertificate(serde_json::from_value(value)?),
	};

	Ok(config)
}

fn default_kind() -> String {
	AUTHORIZATION_KIND.to_owned()
}

fn default_true() -> bool {
	true
}

fn default_token_type() -> String {
	"Bearer".into()
}

fn default_delivery_name() -> String {
	"authorization".into()
}
