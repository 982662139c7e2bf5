//! State handling for one in-flight authorization attempt.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	error::FlowError,
	flows::{AuthorizationSettings, RedirectParams},
};

pub(crate) const STATE_LEN: usize = 32;

/// Attempt registered between [`begin`](crate::flows::AuthorizationCoordinator::begin) and
/// settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAuthorization {
	/// CSRF token embedded in the authorization URL.
	pub state: String,
	/// OIDC replay token, generated when the response type requests an ID token.
	pub nonce: Option<String>,
	/// Resolved response-type configuration.
	pub response_type: String,
	/// Instant the attempt was registered.
	pub started_at: OffsetDateTime,
}

/// Generates a cryptographically unpredictable alphanumeric string.
pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

/// Assembles the authorization-endpoint URL for a pending attempt.
pub(crate) fn build_authorize_url(
	settings: &AuthorizationSettings,
	pending: &PendingAuthorization,
) -> Url {
	let mut url = settings.authorization_uri().clone();

	{
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", &pending.response_type);
		pairs.append_pair("client_id", settings.client_id());
		pairs.append_pair("redirect_uri", settings.redirect_uri().as_str());

		if !settings.scopes().is_empty() {
			pairs.append_pair("scope", &settings.scopes().join(" "));
		}

		pairs.append_pair("state", &pending.state);

		if let Some(nonce) = &pending.nonce {
			pairs.append_pair("nonce", nonce);
		}
	}

	url
}

/// Checks the redirect `state` against the pending attempt.
///
/// A missing parameter and a mismatching one are distinct failures so callers can surface the
/// `no_state`/`invalid_state` codes separately.
pub(crate) fn validate_state(
	pending: &PendingAuthorization,
	params: &RedirectParams,
) -> Result<(), FlowError> {
	match params.state() {
		None => Err(FlowError::MissingState),
		Some(state) if state != pending.state => Err(FlowError::StateMismatch),
		Some(_) => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::test_settings, flows::FlowKind};

	fn pending(state: &str, nonce: Option<&str>, response_type: &str) -> PendingAuthorization {
		PendingAuthorization {
			state: state.into(),
			nonce: nonce.map(Into::into),
			response_type: response_type.into(),
			started_at: OffsetDateTime::now_utc(),
		}
	}

	#[test]
	fn random_string_is_alphanumeric_of_requested_length() {
		let value = random_string(STATE_LEN);

		assert_eq!(value.len(), STATE_LEN);
		assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(value, random_string(STATE_LEN));
	}

	#[test]
	fn authorize_url_carries_the_standard_parameters() {
		let settings = test_settings(FlowKind::OAuth2);
		let url = build_authorize_url(&settings, &pending("s1", None, "code"));
		let pairs: Vec<_> =
			url.query_pairs().map(|(n, v)| (n.into_owned(), v.into_owned())).collect();

		assert_eq!(url.host_str(), Some("login.example"));
		assert_eq!(pairs, vec![
			("response_type".to_owned(), "code".to_owned()),
			("client_id".to_owned(), "client-1".to_owned()),
			("redirect_uri".to_owned(), "https://app.example/callback".to_owned()),
			("scope".to_owned(), "openid profile".to_owned()),
			("state".to_owned(), "s1".to_owned()),
		]);
	}

	#[test]
	fn authorize_url_appends_the_nonce_when_present() {
		let settings = test_settings(FlowKind::Oidc);
		let url = build_authorize_url(&settings, &pending("s1", Some("n1"), "id_token token"));

		assert!(url.query_pairs().any(|(n, v)| n == "nonce" && v == "n1"));
		assert!(url.query_pairs().any(|(n, v)| n == "response_type" && v == "id_token token"));
	}

	#[test]
	fn state_validation_distinguishes_missing_from_mismatching() {
		let pending = pending("s1", None, "code");

		assert!(matches!(
			validate_state(&pending, &RedirectParams::new()),
			Err(FlowError::MissingState)
		));
		assert!(matches!(
			validate_state(&pending, &RedirectParams::new().with("state", "other")),
			Err(FlowError::StateMismatch)
		));
		assert!(validate_state(&pending, &RedirectParams::new().with("state", "s1")).is_ok());
	}
}
