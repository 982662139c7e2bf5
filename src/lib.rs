//! Client-side HTTP authorization toolkit - interactive OAuth 2.0/OIDC flows, request decoration
//! for Basic/Bearer/OAuth2/OIDC/NTLM schemes, and a process-wide credential cache in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod error;
pub mod exchange;
pub mod flows;
pub mod ntlm;
pub mod obs;
pub mod processor;
pub mod request;
pub mod surface;
pub mod tokens;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		exchange::{CodeExchangeResponse, CodeExchanger, ExchangeError, ExchangeFuture},
		flows::{AuthorizationCoordinator, AuthorizationSettings, FlowKind, RedirectParams},
		surface::{LoginSurface, SurfaceError, SurfaceFuture, SurfacePrompt},
	};

	/// Login surface that echoes the prompted `state` back together with canned redirect pairs,
	/// emulating a provider that accepts every login.
	pub struct EchoSurface {
		pairs: Vec<(String, String)>,
	}
	impl EchoSurface {
		/// Builds a surface that will answer with the provided redirect parameters.
		pub fn new<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Arc<Self>
		where
			N: Into<String>,
			V: Into<String>,
		{
			let pairs = pairs.into_iter().map(|(n, v)| (n.into(), v.into())).collect();

			Arc::new(Self { pairs })
		}
	}
	impl LoginSurface for EchoSurface {
		fn open<'a>(
			&'a self,
			_url: &'a Url,
			prompt: &'a SurfacePrompt,
		) -> SurfaceFuture<'a, RedirectParams> {
			let mut params = RedirectParams::new();

			params.insert("state", &prompt.state);

			for (name, value) in &self.pairs {
				params.insert(name, value);
			}

			Box::pin(async move { Ok(params) })
		}
	}

	/// Login surface that resolves each `open` call with the next queued outcome and records the
	/// prompts it received.
	#[derive(Default)]
	pub struct QueueSurface {
		outcomes: Mutex<VecDeque<Result<RedirectParams, SurfaceError>>>,
		opened: Mutex<Vec<SurfacePrompt>>,
	}
	impl QueueSurface {
		/// Builds a surface preloaded with a single outcome.
		pub fn with_outcome(outcome: Result<RedirectParams, SurfaceError>) -> Arc<Self> {
			let surface = Self::default();

			surface.push(outcome);

			Arc::new(surface)
		}

		/// Queues another outcome for a later `open` call.
		pub fn push(&self, outcome: Result<RedirectParams, SurfaceError>) {
			self.outcomes.lock().push_back(outcome);
		}

		/// Returns the prompts observed so far.
		pub fn prompts(&self) -> Vec<SurfacePrompt> {
			self.opened.lock().clone()
		}
	}
	impl LoginSurface for QueueSurface {
		fn open<'a>(
			&'a self,
			_url: &'a Url,
			prompt: &'a SurfacePrompt,
		) -> SurfaceFuture<'a, RedirectParams> {
			self.opened.lock().push(prompt.clone());

			let outcome =
				self.outcomes.lock().pop_front().unwrap_or(Err(SurfaceError::Cancelled));

			Box::pin(async move { outcome })
		}
	}

	/// Code exchanger that answers every call with a canned outcome and records the codes it saw.
	pub struct CannedExchanger {
		outcome: Result<CodeExchangeResponse, String>,
		codes: Mutex<Vec<String>>,
	}
	impl CannedExchanger {
		/// Builds an exchanger that resolves every call with the provided response.
		pub fn succeeding(response: CodeExchangeResponse) -> Arc<Self> {
			Arc::new(Self { outcome: Ok(response), codes: Mutex::new(Vec::new()) })
		}

		/// Builds an exchanger that fails every call with an endpoint error.
		pub fn failing(message: impl Into<String>) -> Arc<Self> {
			Arc::new(Self { outcome: Err(message.into()), codes: Mutex::new(Vec::new()) })
		}

		/// Returns the authorization codes submitted so far.
		pub fn codes(&self) -> Vec<String> {
			self.codes.lock().clone()
		}
	}
	impl CodeExchanger for CannedExchanger {
		fn exchange_code<'a>(&'a self, code: &'a str) -> ExchangeFuture<'a> {
			self.codes.lock().push(code.to_owned());

			let outcome = self.outcome.clone();

			Box::pin(async move {
				outcome.map_err(|message| ExchangeError::Endpoint { status: 500, message })
			})
		}
	}

	/// Builds validated coordinator settings against example endpoints.
	pub fn test_settings(flow: FlowKind) -> AuthorizationSettings {
		AuthorizationSettings::builder(flow)
			.authorization_uri("https://login.example/authorize")
			.client_id("client-1")
			.redirect_uri("https://app.example/callback")
			.scopes(["openid", "profile"])
			.grant_type("authorization_code")
			.build()
			.expect("Test settings fixture should be valid.")
	}

	/// Wires a coordinator to the provided canned collaborators.
	pub fn build_test_coordinator(
		settings: AuthorizationSettings,
		surface: Arc<dyn LoginSurface>,
		exchanger: Arc<dyn CodeExchanger>,
	) -> AuthorizationCoordinator {
		AuthorizationCoordinator::new(settings, surface, exchanger)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
