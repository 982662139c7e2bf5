//! Interactive OAuth 2.0 / OpenID Connect authorization flows.
//!
//! The coordinator exposes [`AuthorizationCoordinator::authorize`] so callers can run the whole
//! interactive handshake in one call: build the authorization URL, present it through the
//! configured [`LoginSurface`], validate the redirect it resolves with, fan the response type out
//! into token records, and exchange any authorization code through the configured
//! [`CodeExchanger`]. Embedders that own their own redirect listener drive the same lifecycle
//! through the split [`begin`](AuthorizationCoordinator::begin) /
//! [`finish_with`](AuthorizationCoordinator::finish_with) /
//! [`cancel`](AuthorizationCoordinator::cancel) entry points instead.

pub mod redirect;
pub mod session;
pub mod settings;

pub use redirect::*;
pub use session::*;
pub use settings::*;

// self
use crate::{
	_prelude::*,
	error::FlowError,
	exchange::{CodeExchangeResponse, CodeExchanger},
	obs::{self, FlowOutcome, FlowSpan},
	surface::{LoginSurface, SurfacePrompt},
	tokens::{ResponseType, TokenError, TokenInfo, TokenOutcome, compute_token_info_scopes},
};

/// Interactive flow families driven by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Plain OAuth 2.0 authorization.
	OAuth2,
	/// OpenID Connect authorization.
	Oidc,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::OAuth2 => "oauth2",
			FlowKind::Oidc => "oidc",
		}
	}

	/// Returns `true` when a navigation to the redirect URI carries an authorization response.
	///
	/// The base rule accepts `code`, `access_token`, or `error`; OIDC additionally accepts a bare
	/// `id_token`. Surface implementations use this to skip unrelated navigations while watching
	/// for the redirect.
	pub fn recognizes_redirect(self, params: &RedirectParams) -> bool {
		let base =
			params.code().is_some() || params.access_token().is_some() || params.error().is_some();

		match self {
			FlowKind::OAuth2 => base,
			FlowKind::Oidc => base || params.id_token().is_some(),
		}
	}

	/// Response type requested when the grant configuration says `implicit`.
	pub(crate) const fn implicit_response_type(self) -> &'static str {
		match self {
			FlowKind::OAuth2 => "token",
			FlowKind::Oidc => "id_token token",
		}
	}

	/// Whether an attempt with this response type carries a replay nonce.
	pub(crate) fn wants_nonce(self, response_type: &str) -> bool {
		matches!(self, FlowKind::Oidc)
			&& ResponseType::split_configuration(response_type).contains(&ResponseType::IdToken)
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Prepared attempt returned by [`AuthorizationCoordinator::begin`].
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Fully assembled authorization-endpoint URL to present to the user.
	pub url: Url,
	/// CSRF token embedded in the URL; the redirect must echo it.
	pub state: String,
	/// OIDC replay nonce, present when the response type requests an ID token.
	pub nonce: Option<String>,
	/// Resolved response-type configuration.
	pub response_type: String,
}

/// Coordinates one interactive authorization at a time against a single provider.
///
/// The coordinator owns the validated settings, the login surface presenting authorization URLs,
/// and the backend exchanging authorization codes. At most one attempt is pending per coordinator;
/// settlement takes the attempt out of its slot before the first await, so every redirect resolves
/// a flow exactly once and a late duplicate finds nothing to corrupt. Clones share the pending
/// slot.
#[derive(Clone)]
pub struct AuthorizationCoordinator {
	settings: AuthorizationSettings,
	surface: Arc<dyn LoginSurface>,
	exchanger: Arc<dyn CodeExchanger>,
	pending: Arc<Mutex<Option<PendingAuthorization>>>,
}
impl AuthorizationCoordinator {
	/// Wires a coordinator to its login surface and code-exchange backend.
	pub fn new(
		settings: AuthorizationSettings,
		surface: Arc<dyn LoginSurface>,
		exchanger: Arc<dyn CodeExchanger>,
	) -> Self {
		Self { settings, surface, exchanger, pending: Default::default() }
	}

	/// Settings this coordinator drives.
	pub fn settings(&self) -> &AuthorizationSettings {
		&self.settings
	}

	/// Returns `true` while an attempt is awaiting its redirect.
	pub fn is_pending(&self) -> bool {
		self.pending.lock().is_some()
	}

	/// Starts an attempt: resolves the response type, generates the `state` (plus a `nonce` for
	/// OIDC ID-token requests), assembles the authorization URL, and registers the pending
	/// attempt.
	///
	/// Fails with [`FlowError::AuthorizationPending`] while another attempt is registered.
	pub fn begin(&self) -> Result<AuthorizationRequest> {
		let flow = self.settings.flow();
		let _guard = FlowSpan::new(flow.as_str(), "begin").entered();

		obs::record_flow_outcome(flow.as_str(), FlowOutcome::Attempt);

		let mut pending = self.pending.lock();

		if pending.is_some() {
			return Err(FlowError::AuthorizationPending.into());
		}

		let response_type = self.settings.resolve_response_type()?;
		let state = session::random_string(session::STATE_LEN);
		let nonce =
			flow.wants_nonce(&response_type).then(|| session::random_string(session::STATE_LEN));
		let attempt = PendingAuthorization {
			state: state.clone(),
			nonce: nonce.clone(),
			response_type: response_type.clone(),
			started_at: OffsetDateTime::now_utc(),
		};
		let url = session::build_authorize_url(&self.settings, &attempt);

		*pending = Some(attempt);

		Ok(AuthorizationRequest { url, state, nonce, response_type })
	}

	/// Runs the whole flow: [`begin`](Self::begin), present the login surface, then settle the
	/// redirect it resolves with.
	///
	/// Surface failures clear the pending attempt before rejecting, so the coordinator is ready
	/// for the next attempt.
	pub async fn authorize(&self) -> Result<Vec<TokenOutcome>> {
		let flow = self.settings.flow();
		let request = self.begin()?;
		let prompt = SurfacePrompt {
			flow,
			redirect_uri: self.settings.redirect_uri().clone(),
			state: request.state.clone(),
			timeout: self.settings.timeout(),
		};
		let span = FlowSpan::new(flow.as_str(), "await_redirect");
		let params = match span.instrument(self.surface.open(&request.url, &prompt)).await {
			Ok(params) => params,
			Err(e) => {
				self.cancel();
				obs::record_flow_outcome(flow.as_str(), FlowOutcome::Failure);

				return Err(FlowError::from(e).into());
			},
		};

		self.finish_with(params).await
	}

	/// Settles the pending attempt with redirect parameters delivered out-of-band.
	///
	/// Validation order: missing `state`, mismatching `state`, then a server `error` parameter.
	/// The response-type configuration fans out into one token record per atomic type, all sharing
	/// the same issuance instant; `code` slots are exchanged through the backend, and an exchange
	/// failure downgrades only its own slot to a [`TokenError`].
	pub async fn finish_with(&self, params: RedirectParams) -> Result<Vec<TokenOutcome>> {
		let flow = self.settings.flow();
		let span = FlowSpan::new(flow.as_str(), "finish");
		let result = span.instrument(self.settle(params)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(flow.as_str(), FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(flow.as_str(), FlowOutcome::Failure),
		}

		result
	}

	/// Drops the pending attempt. Idempotent; returns whether an attempt was dropped.
	pub fn cancel(&self) -> bool {
		self.pending.lock().take().is_some()
	}

	async fn settle(&self, params: RedirectParams) -> Result<Vec<TokenOutcome>> {
		let Some(pending) = self.pending.lock().take() else {
			return Err(FlowError::NoAuthorizationPending.into());
		};

		session::validate_state(&pending, &params)?;

		if let Some(error) = params.error() {
			return Err(FlowError::Server {
				error: error.to_owned(),
				description: params.error_description().map(str::to_owned),
			}
			.into());
		}

		let atoms = ResponseType::split_configuration(&pending.response_type);

		if atoms.is_empty() {
			return Err(FlowError::UnknownResponseType { configured: pending.response_type }.into());
		}

		let time = OffsetDateTime::now_utc();
		let mut outcomes = Vec::with_capacity(atoms.len());

		for atom in atoms {
			let info =
				TokenInfo::for_response_type(atom, &params, time, Some(self.settings.scopes()));
			// Only `code` records carry a code; the others resolve as-is.
			let outcome = match info.code.clone() {
				Some(code) => self.exchange(info, &code).await,
				None => TokenOutcome::Token(info),
			};

			outcomes.push(outcome);
		}

		Ok(outcomes)
	}

	async fn exchange(&self, mut info: TokenInfo, code: &str) -> TokenOutcome {
		let span = FlowSpan::new(self.settings.flow().as_str(), "exchange_code");

		match span.instrument(self.exchanger.exchange_code(code)).await {
			Ok(response) if response.error.is_none() => {
				self.merge_exchange(&mut info, response);

				TokenOutcome::Token(info)
			},
			Ok(response) => TokenOutcome::Error(TokenError {
				response_type: info.response_type,
				state: info.state,
				error: "unknown_state".into(),
				error_description: response.error_description.or(response.error),
			}),
			Err(e) => TokenOutcome::Error(TokenError {
				response_type: info.response_type,
				state: info.state,
				error: "unknown_state".into(),
				error_description: Some(e.to_string()),
			}),
		}
	}

	fn merge_exchange(&self, info: &mut TokenInfo, response: CodeExchangeResponse) {
		if response.access_token.is_some() {
			info.access_token = response.access_token;
		}
		if response.refresh_token.is_some() {
			info.refresh_token = response.refresh_token;
		}
		if response.id_token.is_some() {
			info.id_token = response.id_token;
		}
		if response.token_type.is_some() {
			info.token_type = response.token_type;
		}
		if response.expires_in.is_some() {
			info.expires_in = response.expires_in;
		}
		if let Some(scope) = response.scope.as_deref() {
			info.scope =
				Some(compute_token_info_scopes(Some(self.settings.scopes()), Some(scope)));
		}
	}
}
impl Debug for AuthorizationCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCoordinator")
			.field("settings", &self.settings)
			.field("pending", &*self.pending.lock())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{CannedExchanger, EchoSurface, QueueSurface, build_test_coordinator, test_settings},
		surface::SurfaceError,
	};

	#[test]
	fn begin_registers_exactly_one_attempt() {
		let coordinator = build_test_coordinator(
			test_settings(FlowKind::OAuth2),
			Arc::new(QueueSurface::default()),
			CannedExchanger::failing("unused"),
		);
		let request = coordinator.begin().expect("First begin should register an attempt.");

		assert_eq!(request.response_type, "code");
		assert_eq!(request.state.len(), 32);
		assert!(request.nonce.is_none());
		assert!(request.url.query_pairs().any(|(n, v)| n == "state" && v == request.state.as_str()));
		assert!(coordinator.is_pending());

		let error = coordinator.begin().expect_err("Second begin should be rejected.");

		assert_eq!(error.flow_code(), Some("authorization_pending"));
		assert!(coordinator.cancel());
		assert!(!coordinator.cancel());
		assert!(!coordinator.is_pending());
	}

	#[test]
	fn redirect_recognition_accepts_oidc_bare_id_tokens() {
		let with_id_token = RedirectParams::new().with("id_token", "i1");
		let with_code = RedirectParams::new().with("code", "c1");

		assert!(!FlowKind::OAuth2.recognizes_redirect(&with_id_token));
		assert!(FlowKind::Oidc.recognizes_redirect(&with_id_token));
		assert!(FlowKind::OAuth2.recognizes_redirect(&with_code));
		assert!(!FlowKind::OAuth2.recognizes_redirect(&RedirectParams::new()));
	}

	#[tokio::test]
	async fn authorize_settles_the_implicit_flow() {
		let settings = AuthorizationSettings::builder(FlowKind::OAuth2)
			.authorization_uri("https://login.example/authorize")
			.client_id("client-1")
			.redirect_uri("https://app.example/callback")
			.scopes(["profile"])
			.grant_type("implicit")
			.build()
			.expect("Settings fixture should be valid.");
		let coordinator = build_test_coordinator(
			settings,
			EchoSurface::new([
				("access_token", "a1"),
				("token_type", "Bearer"),
				("expires_in", "3600"),
			]),
			CannedExchanger::failing("unused"),
		);
		let outcomes = coordinator.authorize().await.expect("Implicit flow should settle.");

		assert_eq!(outcomes.len(), 1);

		let token = outcomes[0].as_token().expect("Slot should hold a token.");

		assert_eq!(token.response_type, Some(ResponseType::Token));
		assert_eq!(token.access_token.as_deref(), Some("a1"));
		assert_eq!(token.expires_in, Some(3600));
		assert_eq!(token.scope.as_deref(), Some(["profile".to_owned()].as_slice()));
		assert!(!coordinator.is_pending());
	}

	#[tokio::test]
	async fn hybrid_response_exchanges_only_the_code_slot() {
		let settings = AuthorizationSettings::builder(FlowKind::Oidc)
			.authorization_uri("https://login.example/authorize")
			.client_id("client-1")
			.redirect_uri("https://app.example/callback")
			.scopes(["openid"])
			.response_type("code id_token")
			.build()
			.expect("Settings fixture should be valid.");
		let exchanger = CannedExchanger::succeeding(CodeExchangeResponse {
			access_token: Some("a2".into()),
			refresh_token: Some("r2".into()),
			scope: Some("granted".into()),
			..Default::default()
		});
		let coordinator = build_test_coordinator(
			settings,
			Arc::new(QueueSurface::default()),
			exchanger.clone(),
		);
		let request = coordinator.begin().expect("Begin should register the hybrid attempt.");

		assert!(request.nonce.is_some());

		let params = RedirectParams::new()
			.with("state", &request.state)
			.with("code", "c1")
			.with("id_token", "i1")
			.with("access_token", "a1");
		let outcomes = coordinator.finish_with(params).await.expect("Hybrid flow should settle.");

		assert_eq!(outcomes.len(), 2);

		let code_slot = outcomes[0].as_token().expect("Code slot should hold a token.");

		assert_eq!(code_slot.response_type, Some(ResponseType::Code));
		assert_eq!(code_slot.code.as_deref(), Some("c1"));
		assert_eq!(code_slot.access_token.as_deref(), Some("a2"));
		assert_eq!(code_slot.refresh_token.as_deref(), Some("r2"));
		assert_eq!(code_slot.scope.as_deref(), Some(["granted".to_owned()].as_slice()));

		let id_slot = outcomes[1].as_token().expect("Id-token slot should hold a token.");

		assert_eq!(id_slot.response_type, Some(ResponseType::IdToken));
		assert_eq!(id_slot.id_token.as_deref(), Some("i1"));
		assert_eq!(id_slot.access_token.as_deref(), Some("a1"));
		assert_eq!(exchanger.codes(), ["c1"]);
	}

	#[tokio::test]
	async fn surface_cancellation_clears_the_attempt() {
		let coordinator = build_test_coordinator(
			test_settings(FlowKind::OAuth2),
			QueueSurface::with_outcome(Err(SurfaceError::Cancelled)),
			CannedExchanger::failing("unused"),
		);
		let error = coordinator.authorize().await.expect_err("Cancelled surface should reject.");

		assert_eq!(error.flow_code(), Some("user_cancelled"));
		assert!(!coordinator.is_pending());
	}

	#[tokio::test]
	async fn finish_without_a_pending_attempt_is_rejected() {
		let coordinator = build_test_coordinator(
			test_settings(FlowKind::OAuth2),
			Arc::new(QueueSurface::default()),
			CannedExchanger::failing("unused"),
		);
		let error = coordinator
			.finish_with(RedirectParams::new().with("state", "s1"))
			.await
			.expect_err("Settling without a pending attempt should be rejected.");

		assert_eq!(error.flow_code(), Some("no_authorization_pending"));
	}
}
