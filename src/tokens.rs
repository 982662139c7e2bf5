//! Token records assembled from authorization redirects.

// self
use crate::{_prelude::*, flows::RedirectParams};

/// Atomic response types recognized in a response-type configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseType {
	/// Authorization code awaiting a backend exchange.
	#[serde(rename = "code")]
	Code,
	/// Access token delivered directly on the redirect.
	#[serde(rename = "token")]
	Token,
	/// OpenID Connect ID token.
	#[serde(rename = "id_token")]
	IdToken,
}
impl ResponseType {
	/// Returns the wire-level atom.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Code => "code",
			Self::Token => "token",
			Self::IdToken => "id_token",
		}
	}

	/// Fans a space-separated response-type configuration out into its recognized atoms.
	///
	/// Unknown atoms produce nothing; `"code id_token"` yields one slot per atom.
	pub fn split_configuration(configuration: &str) -> Vec<Self> {
		configuration.split_whitespace().filter_map(|atom| atom.parse().ok()).collect()
	}
}
impl FromStr for ResponseType {
	type Err = ResponseTypeParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"code" => Ok(Self::Code),
			"token" => Ok(Self::Token),
			"id_token" => Ok(Self::IdToken),
			_ => Err(ResponseTypeParseError),
		}
	}
}
impl Display for ResponseType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error returned when a response-type atom is not recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Unrecognized response-type atom.")]
pub struct ResponseTypeParseError;

/// Scopes recorded on a token record.
///
/// A `scope` parameter on the redirect replaces the requested list outright, split on single
/// spaces; without one the requested scopes stand, an absent request reading as empty.
pub fn compute_token_info_scopes(
	requested: Option<&[String]>,
	param: Option<&str>,
) -> Vec<String> {
	match param {
		Some(raw) => raw.split(' ').map(str::to_owned).collect(),
		None => requested.map(<[String]>::to_vec).unwrap_or_default(),
	}
}

/// One issued token record.
///
/// A redirect carrying several response types produces one record per atomic type; siblings share
/// `state` and `time`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
	/// Atomic response type this record was assembled for.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response_type: Option<ResponseType>,
	/// CSRF token the record was issued under.
	pub state: String,
	/// Issuance instant, serialized as epoch milliseconds.
	#[serde(with = "time::serde::timestamp::milliseconds")]
	pub time: OffsetDateTime,
	/// Token lifetime in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	/// Token type reported by the server.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Granted scopes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<Vec<String>>,
	/// Authorization code awaiting exchange.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// Access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<String>,
	/// Refresh token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// OpenID Connect ID token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
}
impl TokenInfo {
	/// Assembles the fields shared by every response type: `state`, issuance time, lifetime,
	/// token type, and the reconciled scopes.
	pub fn base(
		params: &RedirectParams,
		time: OffsetDateTime,
		requested_scopes: Option<&[String]>,
	) -> Self {
		Self {
			response_type: None,
			state: params.state().unwrap_or_default().to_owned(),
			time,
			expires_in: params.expires_in(),
			token_type: params.token_type().map(str::to_owned),
			scope: Some(compute_token_info_scopes(requested_scopes, params.scope())),
			code: None,
			access_token: None,
			refresh_token: None,
			id_token: None,
		}
	}

	/// Assembles a `code` record.
	pub fn for_code(
		params: &RedirectParams,
		time: OffsetDateTime,
		requested_scopes: Option<&[String]>,
	) -> Self {
		let mut token = Self::base(params, time, requested_scopes);

		token.response_type = Some(ResponseType::Code);
		token.code = params.code().map(str::to_owned);

		token
	}

	/// Assembles a `token` record.
	pub fn for_access_token(
		params: &RedirectParams,
		time: OffsetDateTime,
		requested_scopes: Option<&[String]>,
	) -> Self {
		let mut token = Self::base(params, time, requested_scopes);

		token.response_type = Some(ResponseType::Token);
		token.access_token = params.access_token().map(str::to_owned);
		token.refresh_token = params.refresh_token().map(str::to_owned);

		token
	}

	/// Assembles an `id_token` record.
	pub fn for_id_token(
		params: &RedirectParams,
		time: OffsetDateTime,
		requested_scopes: Option<&[String]>,
	) -> Self {
		let mut token = Self::for_access_token(params, time, requested_scopes);

		token.response_type = Some(ResponseType::IdToken);
		token.id_token = params.id_token().map(str::to_owned);

		token
	}

	/// Assembles the record matching `response_type`.
	pub fn for_response_type(
		response_type: ResponseType,
		params: &RedirectParams,
		time: OffsetDateTime,
		requested_scopes: Option<&[String]>,
	) -> Self {
		match response_type {
			ResponseType::Code => Self::for_code(params, time, requested_scopes),
			ResponseType::Token => Self::for_access_token(params, time, requested_scopes),
			ResponseType::IdToken => Self::for_id_token(params, time, requested_scopes),
		}
	}
}

/// Failure recorded in place of a token when one slot of an authorization could not resolve.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenError {
	/// Atomic response type the failed slot was assembled for.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response_type: Option<ResponseType>,
	/// CSRF token the attempt ran under.
	#[serde(default)]
	pub state: String,
	/// Stable error code.
	pub error: String,
	/// Human-readable error detail.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
}

/// One resolved slot of an authorization outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenOutcome {
	/// Successfully issued token record.
	Token(TokenInfo),
	/// Slot-local failure record.
	Error(TokenError),
}
impl TokenOutcome {
	/// Returns the access token when this slot resolved to one.
	pub fn access_token(&self) -> Option<&str> {
		match self {
			Self::Token(info) => info.access_token.as_deref(),
			Self::Error(_) => None,
		}
	}

	/// Returns the token record when this slot succeeded.
	pub fn as_token(&self) -> Option<&TokenInfo> {
		match self {
			Self::Token(info) => Some(info),
			Self::Error(_) => None,
		}
	}

	/// Returns the failure record when this slot failed.
	pub fn as_error(&self) -> Option<&TokenError> {
		match self {
			Self::Token(_) => None,
			Self::Error(error) => Some(error),
		}
	}

	/// Returns `true` when this slot failed.
	pub fn is_error(&self) -> bool {
		matches!(self, Self::Error(_))
	}

	/// Returns the `state` the slot was issued under.
	pub fn state(&self) -> &str {
		match self {
			Self::Token(info) => &info.state,
			Self::Error(error) => &error.state,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn fixture_time() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_700_000_000)
			.expect("Fixture timestamp should be valid.")
	}

	#[test]
	fn split_configuration_skips_unknown_atoms() {
		assert_eq!(
			ResponseType::split_configuration("code id_token"),
			vec![ResponseType::Code, ResponseType::IdToken]
		);
		assert_eq!(ResponseType::split_configuration("code noise"), vec![ResponseType::Code]);
		assert!(ResponseType::split_configuration("password").is_empty());
		assert!(ResponseType::split_configuration("").is_empty());
	}

	#[test]
	fn redirect_scope_replaces_the_requested_list() {
		let requested = vec!["alpha".to_owned(), "beta".to_owned()];

		assert_eq!(
			compute_token_info_scopes(Some(&requested), Some("gamma delta")),
			vec!["gamma", "delta"]
		);
		assert_eq!(compute_token_info_scopes(Some(&requested), None), requested);
		assert!(compute_token_info_scopes(None, None).is_empty());
	}

	#[test]
	fn code_record_copies_the_shared_fields() {
		let params = RedirectParams::new()
			.with("state", "s1")
			.with("code", "c1")
			.with("token_type", "Bearer")
			.with("expires_in", "3600");
		let token = TokenInfo::for_code(&params, fixture_time(), None);

		assert_eq!(token.response_type, Some(ResponseType::Code));
		assert_eq!(token.state, "s1");
		assert_eq!(token.code.as_deref(), Some("c1"));
		assert_eq!(token.token_type.as_deref(), Some("Bearer"));
		assert_eq!(token.expires_in, Some(3600));
		assert!(token.access_token.is_none());
	}

	#[test]
	fn id_token_record_carries_every_token_field() {
		let params = RedirectParams::new()
			.with("state", "s1")
			.with("access_token", "a1")
			.with("refresh_token", "r1")
			.with("id_token", "i1");
		let token = TokenInfo::for_id_token(&params, fixture_time(), None);

		assert_eq!(token.response_type, Some(ResponseType::IdToken));
		assert_eq!(token.access_token.as_deref(), Some("a1"));
		assert_eq!(token.refresh_token.as_deref(), Some("r1"));
		assert_eq!(token.id_token.as_deref(), Some("i1"));
	}

	#[test]
	fn time_serializes_as_epoch_milliseconds() {
		let params = RedirectParams::new().with("state", "s1");
		let token = TokenInfo::base(&params, fixture_time(), None);
		let json = serde_json::to_value(&token).expect("Token record should serialize.");

		assert_eq!(json["time"], serde_json::json!(1_700_000_000_000_i64));
	}

	#[test]
	fn outcome_discriminates_tokens_from_errors() {
		let token = TokenOutcome::Token(TokenInfo::base(
			&RedirectParams::new().with("state", "s1").with("access_token", "a1"),
			fixture_time(),
			None,
		));
		let error = TokenOutcome::Error(TokenError {
			state: "s1".into(),
			error: "unknown_state".into(),
			..Default::default()
		});

		assert!(!token.is_error());
		assert!(error.is_error());
		assert_eq!(error.state(), "s1");

		let json = serde_json::to_string(&error).expect("Error outcome should serialize.");
		let back: TokenOutcome =
			serde_json::from_str(&json).expect("Serialized outcome should deserialize.");

		assert_eq!(back, error);
	}
}
