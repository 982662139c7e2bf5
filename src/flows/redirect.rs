//! Redirect parameter contract delivered back by the authorization server.

// crates.io
use url::form_urlencoded;
// self
use crate::_prelude::*;

/// Ordered parameter multimap extracted from an authorization redirect.
///
/// Authorization-code responses deliver in the query string, implicit and hybrid responses in the
/// fragment; [`from_redirect_url`](Self::from_redirect_url) handles both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RedirectParams {
	pairs: Vec<(String, String)>,
}
impl RedirectParams {
	/// Builds an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a `application/x-www-form-urlencoded` query or fragment string.
	pub fn from_encoded(encoded: &str) -> Self {
		let pairs = form_urlencoded::parse(encoded.as_bytes())
			.map(|(n, v)| (n.into_owned(), v.into_owned()))
			.collect();

		Self { pairs }
	}

	/// Extracts the parameters from a full redirect URL, preferring the query string and falling
	/// back to the fragment.
	pub fn from_redirect_url(url: &Url) -> Self {
		let from_query = url.query().map(Self::from_encoded).unwrap_or_default();

		if !from_query.is_empty() {
			return from_query;
		}

		url.fragment().map(Self::from_encoded).unwrap_or_default()
	}

	/// Appends one parameter, keeping earlier values for the same name.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.pairs.push((name.into(), value.into()));
	}

	/// Appends one parameter, consuming and returning the set.
	pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(name, value);

		self
	}

	/// Returns the first value recorded for `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
	}

	/// Returns `true` when a value is recorded for `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Renders the parameters back into `application/x-www-form-urlencoded` form.
	pub fn to_encoded(&self) -> String {
		let mut serializer = form_urlencoded::Serializer::new(String::new());

		for (name, value) in &self.pairs {
			serializer.append_pair(name, value);
		}

		serializer.finish()
	}

	/// Returns the number of recorded parameters.
	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	/// Returns `true` when no parameter is recorded.
	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	/// CSRF token echoed by the server.
	pub fn state(&self) -> Option<&str> {
		self.get("state")
	}

	/// Authorization code awaiting exchange.
	pub fn code(&self) -> Option<&str> {
		self.get("code")
	}

	/// Access token delivered by an implicit or hybrid response.
	pub fn access_token(&self) -> Option<&str> {
		self.get("access_token")
	}

	/// ID token delivered by an OpenID Connect response.
	pub fn id_token(&self) -> Option<&str> {
		self.get("id_token")
	}

	/// Refresh token, rarely present on redirects.
	pub fn refresh_token(&self) -> Option<&str> {
		self.get("refresh_token")
	}

	/// Token type reported by the server.
	pub fn token_type(&self) -> Option<&str> {
		self.get("token_type")
	}

	/// Granted scope string reported by the server.
	pub fn scope(&self) -> Option<&str> {
		self.get("scope")
	}

	/// Token lifetime in seconds; unparseable values read as absent.
	pub fn expires_in(&self) -> Option<u64> {
		self.get("expires_in").and_then(|v| v.parse().ok())
	}

	/// Error code reported by the server.
	pub fn error(&self) -> Option<&str> {
		self.get("error")
	}

	/// Human-readable error detail reported by the server.
	pub fn error_description(&self) -> Option<&str> {
		self.get("error_description")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_an_encoded_fragment() {
		let params = RedirectParams::from_encoded("access_token=abc&state=s1&expires_in=3600");

		assert_eq!(params.access_token(), Some("abc"));
		assert_eq!(params.state(), Some("s1"));
		assert_eq!(params.expires_in(), Some(3600));
		assert_eq!(params.len(), 3);
	}

	#[test]
	fn redirect_url_prefers_the_query_over_the_fragment() {
		let url = Url::parse("https://app.example/cb?code=c1&state=s1#ignored=1")
			.expect("Redirect URL fixture should parse.");
		let params = RedirectParams::from_redirect_url(&url);

		assert_eq!(params.code(), Some("c1"));
		assert!(!params.contains("ignored"));
	}

	#[test]
	fn redirect_url_falls_back_to_the_fragment() {
		let url = Url::parse("https://app.example/cb#id_token=t1&state=s1")
			.expect("Redirect URL fixture should parse.");
		let params = RedirectParams::from_redirect_url(&url);

		assert_eq!(params.id_token(), Some("t1"));
		assert_eq!(params.state(), Some("s1"));
	}

	#[test]
	fn first_value_wins_for_duplicate_names() {
		let params = RedirectParams::from_encoded("scope=a&scope=b");

		assert_eq!(params.scope(), Some("a"));
		assert_eq!(params.len(), 2);
	}

	#[test]
	fn encodes_back_to_form_urlencoded() {
		let params = RedirectParams::new().with("state", "s 1").with("code", "c1");

		assert_eq!(params.to_encoded(), "state=s+1&code=c1");
	}

	#[test]
	fn unparseable_expires_in_reads_as_absent() {
		let params = RedirectParams::from_encoded("expires_in=soon");

		assert_eq!(params.expires_in(), None);
	}
}
