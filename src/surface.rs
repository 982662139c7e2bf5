//! Login surface contract: the popup, iframe, or system browser presenting the authorization URL.

// self
use crate::{
	_prelude::*,
	flows::{FlowKind, RedirectParams},
};

/// Future alias returned by [`LoginSurface`] implementations.
pub type SurfaceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SurfaceError>> + 'a + Send>>;

/// Context handed to the surface alongside the authorization URL.
///
/// The surface owns timeout enforcement: when [`timeout`](Self::timeout) is set and elapses
/// before a redirect arrives, the surface resolves with [`SurfaceError::TimedOut`].
#[derive(Clone, Debug)]
pub struct SurfacePrompt {
	/// Flow kind driving the attempt; [`FlowKind::recognizes_redirect`] tells a surface which
	/// navigations count as authorization responses.
	pub flow: FlowKind,
	/// Redirect URI the server will send the user back to.
	pub redirect_uri: Url,
	/// CSRF token embedded in the authorization URL.
	pub state: String,
	/// Upper bound on how long the surface may stay open.
	pub timeout: Option<Duration>,
}

/// External login surface consumed by the authorization coordinator.
///
/// Implementations present `url` to the user, watch for a navigation back to the redirect URI,
/// and resolve with the parameters carried by that navigation.
pub trait LoginSurface
where
	Self: Send + Sync,
{
	/// Presents the authorization URL and resolves with the redirect parameters.
	fn open<'a>(
		&'a self,
		url: &'a Url,
		prompt: &'a SurfacePrompt,
	) -> SurfaceFuture<'a, RedirectParams>;
}

/// Terminal surface failures; each clears the pending attempt.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SurfaceError {
	/// User dismissed the surface before completing authorization.
	#[error("Login surface was dismissed before completing authorization.")]
	Cancelled,
	/// Configured timeout elapsed before a redirect arrived.
	#[error("Login surface timed out before delivering a redirect.")]
	TimedOut,
	/// Surface-specific failure, e.g. the popup could not be opened.
	#[error("Login surface failed: {message}.")]
	Failed {
		/// Surface-supplied failure summary.
		message: String,
	},
}
