//! Request decoration: applies enabled credential configurations to outgoing requests.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	auth::{
		AuthConfig, AuthorizationKind, BasicConfig, BearerConfig, CertificateConfig,
		DeliveryMethod, NtlmConfig, OAuth2Config, OidcConfig, RequestAuthorization,
	},
	cache::{AuthCache, CachedAuthData},
	request::OutgoingRequest,
};

/// Options controlling one decoration pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyOptions {
	/// Leaves every `enabled` flag untouched when set; the default pass disarms each entry it
	/// handled so credentials apply exactly once until re-armed.
	pub immutable: bool,
}

/// Applies credential configurations to outgoing requests and pairs them with the cache.
///
/// Cloning shares the injected [`AuthCache`], so one processor per worker is cheap.
#[derive(Clone, Debug, Default)]
pub struct SecurityProcessor {
	cache: AuthCache,
}
impl SecurityProcessor {
	/// Builds a processor over an injected cache.
	pub fn new(cache: AuthCache) -> Self {
		Self { cache }
	}

	/// Returns the cache this processor consults.
	pub fn cache(&self) -> &AuthCache {
		&self.cache
	}

	/// Applies every enabled header-delivered credential to `request`, in list order.
	///
	/// Basic, Bearer, OAuth 2 and OpenID entries are header handlers; NTLM and client-certificate
	/// entries belong to the transport layer and pass through untouched, keeping their `enabled`
	/// flag armed for the handshake. Handled entries are disarmed unless
	/// [`immutable`](ApplyOptions::immutable) is set, whether or not they produced output.
	pub fn apply_authorization(
		&self,
		request: &mut OutgoingRequest,
		authorizations: &mut [RequestAuthorization],
		options: &ApplyOptions,
	) {
		for auth in authorizations.iter_mut() {
			if !auth.enabled {
				continue;
			}

			let Some(config) = &auth.config else {
				continue;
			};
			let handled = match auth.auth_type {
				AuthorizationKind::Basic => {
					if let Some(basic) = config.basic() {
						Self::apply_basic(request, basic);
					}

					true
				},
				AuthorizationKind::Bearer => {
					if let Some(bearer) = config.bearer() {
						Self::apply_bearer(request, bearer);
					}

					true
				},
				AuthorizationKind::OAuth2 => {
					if let Some(oauth2) = config.oauth2() {
						Self::apply_oauth2(request, oauth2);
					}

					true
				},
				AuthorizationKind::OpenId => {
					if let Some(oidc) = config.open_id() {
						Self::apply_open_id(request, oidc);
					}

					true
				},
				AuthorizationKind::Ntlm | AuthorizationKind::ClientCertificate => false,
			};

			if handled && !options.immutable {
				auth.enabled = false;
			}
		}
	}

	/// Returns the first enabled, configured client-certificate reference for the transport
	/// engine. Never mutates the list.
	pub fn client_certificate<'a>(
		&self,
		authorizations: &'a [RequestAuthorization],
	) -> Option<&'a CertificateConfig> {
		authorizations
			.iter()
			.filter(|auth| auth.enabled && auth.auth_type == AuthorizationKind::ClientCertificate)
			.find_map(|auth| auth.config.as_ref().and_then(AuthConfig::client_certificate))
	}

	/// Replays cached credentials for the request's canonical URL before any user prompt.
	///
	/// A cached Basic credential decorates the request directly. A cached NTLM credential is
	/// injected into the authorization list as an enabled entry instead, ready for the
	/// transport-level handshake; an existing NTLM entry that already carries a username wins
	/// over the cache. Returns whether anything was applied or injected.
	pub fn apply_cached_auth_data(
		&self,
		request: &mut OutgoingRequest,
		authorizations: &mut Vec<RequestAuthorization>,
	) -> bool {
		let mut touched = false;

		if let Some(data) = self.cache.find(AuthorizationKind::Basic, &request.url) {
			let basic = BasicConfig { username: data.username, password: data.password };

			if !basic.username.is_empty() {
				Self::apply_basic(request, &basic);

				touched = true;
			}
		}
		if let Some(data) = self.cache.find(AuthorizationKind::Ntlm, &request.url) {
			touched |= Self::inject_ntlm(authorizations, data);
		}

		touched
	}

	fn inject_ntlm(authorizations: &mut Vec<RequestAuthorization>, data: CachedAuthData) -> bool {
		let occupied = authorizations.iter().any(|auth| {
			auth.auth_type == AuthorizationKind::Ntlm
				&& auth
					.config
					.as_ref()
					.and_then(AuthConfig::ntlm)
					.is_some_and(|ntlm| !ntlm.username.is_empty())
		});

		if occupied {
			return false;
		}

		let config = AuthConfig::Ntlm(NtlmConfig {
			domain: data.domain,
			username: data.username,
			password: data.password.unwrap_or_default(),
		});

		if let Some(existing) =
			authorizations.iter_mut().find(|auth| auth.auth_type == AuthorizationKind::Ntlm)
		{
			existing.enabled = true;
			existing.config = Some(config);
		} else {
			authorizations.push(RequestAuthorization::new(AuthorizationKind::Ntlm, Some(config)));
		}

		true
	}

	fn apply_basic(request: &mut OutgoingRequest, config: &BasicConfig) {
		if config.username.is_empty() {
			return;
		}

		let credentials =
			format!("{}:{}", config.username, config.password.as_deref().unwrap_or_default());

		request.append_header("authorization", &format!("Basic {}", STANDARD.encode(credentials)));
	}

	// Applies even an empty token; only Basic and OAuth 2 guard their inputs.
	fn apply_bearer(request: &mut OutgoingRequest, config: &BearerConfig) {
		request.append_header("authorization", &format!("Bearer {}", config.token));
	}

	fn apply_oauth2(request: &mut OutgoingRequest, config: &OAuth2Config) {
		let token = match config.access_token.as_deref() {
			None | Some("") => return,
			Some(token) => token,
		};
		let value = format!("{} {}", config.token_type, token);

		match config.delivery_method {
			DeliveryMethod::Header => request.append_header(&config.delivery_name, &value),
			DeliveryMethod::Query => {
				// A URL that does not parse leaves the request untouched.
				let _ = request.append_query_parameter(&config.delivery_name, &value);
			},
		}
	}

	fn apply_open_id(request: &mut OutgoingRequest, config: &OidcConfig) {
		if config.oauth2.access_token.as_deref().is_some_and(|token| !token.is_empty()) {
			Self::apply_oauth2(request, &config.oauth2);

			return;
		}

		let Some(tokens) = &config.tokens else {
			return;
		};
		let Some(index) = config.token_in_use else {
			return;
		};
		let Some(token) = tokens
			.get(index)
			.and_then(|outcome| outcome.access_token())
			.filter(|token| !token.is_empty())
		else {
			return;
		};
		let mut delegated = config.oauth2.clone();

		delegated.access_token = Some(token.to_owned());

		Self::apply_oauth2(request, &delegated);
	}
}
