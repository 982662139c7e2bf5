//! Toolkit-level error types shared across flows, request decoration, and the NTLM handshake.

// self
use crate::_prelude::*;

/// Toolkit-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(feature = "reqwest")]
type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical toolkit error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Interactive authorization failure.
	#[error(transparent)]
	Flow(#[from] FlowError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// NTLM handshake failure.
	#[error(transparent)]
	Ntlm(#[from] crate::ntlm::NtlmError),
}
impl Error {
	/// Returns the stable protocol code when the error originated in a flow.
	pub fn flow_code(&self) -> Option<&str> {
		match self {
			Self::Flow(e) => Some(e.code()),
			_ => None,
		}
	}
}

/// Interactive authorization failures, each mapped to a stable protocol code.
#[derive(Debug, ThisError)]
pub enum FlowError {
	/// Redirect arrived without a `state` parameter.
	#[error("Redirect did not carry a state parameter.")]
	MissingState,
	/// Redirect `state` does not match the pending authorization.
	#[error("Redirect state does not match the pending authorization.")]
	StateMismatch,
	/// No usable response type could be derived from the configuration.
	#[error("No usable response type could be derived from `{configured}`.")]
	UnknownResponseType {
		/// Grant label or response-type string that failed to resolve.
		configured: String,
	},
	/// Authorization server reported an error through the redirect.
	#[error("Authorization server reported `{error}`.")]
	Server {
		/// Error code delivered in the `error` parameter.
		error: String,
		/// Optional `error_description` parameter.
		description: Option<String>,
	},
	/// User dismissed the login surface before completing authorization.
	#[error("User dismissed the login surface.")]
	Cancelled,
	/// Login surface exceeded the configured timeout.
	#[error("Login surface timed out before delivering a redirect.")]
	TimedOut,
	/// Login surface failed for a surface-specific reason.
	#[error("Login surface failed: {message}.")]
	Surface {
		/// Surface-supplied failure summary.
		message: String,
	},
	/// `begin` was called while another attempt is still pending.
	#[error("Another authorization attempt is already pending.")]
	AuthorizationPending,
	/// A redirect was delivered while no attempt is pending.
	#[error("No authorization attempt is pending.")]
	NoAuthorizationPending,
}
impl FlowError {
	/// Returns the stable string code for this failure.
	///
	/// Redirect validation failures reuse the wire-level codes (`no_state`, `invalid_state`,
	/// `unknown_state`); server rejections surface the server's own `error` code.
	pub fn code(&self) -> &str {
		match self {
			Self::MissingState => "no_state",
			Self::StateMismatch => "invalid_state",
			Self::UnknownResponseType { .. } => "unknown_state",
			Self::Server { error, .. } => error,
			Self::Cancelled => "user_cancelled",
			Self::TimedOut => "timeout",
			Self::Surface { .. } => "surface_error",
			Self::AuthorizationPending => "authorization_pending",
			Self::NoAuthorizationPending => "no_authorization_pending",
		}
	}
}
impl From<crate::surface::SurfaceError> for FlowError {
	fn from(e: crate::surface::SurfaceError) -> Self {
		use crate::surface::SurfaceError;

		match e {
			SurfaceError::Cancelled => Self::Cancelled,
			SurfaceError::TimedOut => Self::TimedOut,
			SurfaceError::Failed { message } => Self::Surface { message },
		}
	}
}

/// Configuration and validation failures raised before any flow starts.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Authorization endpoint URL cannot be parsed.
	#[error("Authorization endpoint URL is invalid.")]
	InvalidAuthorizationUri {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Client identifier is empty.
	#[error("Client id must not be empty.")]
	MissingClientId,
	/// Code-exchange endpoint URL cannot be parsed.
	#[error("Code-exchange endpoint URL is invalid.")]
	InvalidExchangeEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[cfg(feature = "reqwest")]
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
#[cfg(feature = "reqwest")]
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
