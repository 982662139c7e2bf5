//! Mutable outgoing-request representation consumed by the request decorators.

// self
use crate::_prelude::*;

/// Outgoing HTTP request as seen by the authorization subsystem.
///
/// Headers travel as a newline-joined `name: value` string, matching the transport engine's wire
/// format; the decorators only ever append to it. The request is borrowed for the duration of one
/// decoration pass and never retained.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRequest {
	/// Absolute request URL.
	pub url: String,
	/// HTTP method verb.
	#[serde(default = "default_method")]
	pub method: String,
	/// Newline-joined `name: value` header lines.
	#[serde(default)]
	pub headers: String,
	/// Optional request body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payload: Option<String>,
}
impl OutgoingRequest {
	/// Builds a request without headers or payload.
	pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
		Self { url: url.into(), method: method.into(), headers: String::new(), payload: None }
	}

	/// Appends one header line, preserving the lines already present.
	pub fn append_header(&mut self, name: &str, value: &str) {
		if !self.headers.is_empty() {
			self.headers.push('\n');
		}

		self.headers.push_str(name);
		self.headers.push_str(": ");
		self.headers.push_str(value);
	}

	/// Returns the first header value matching `name`, compared case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.lines().find_map(|line| {
			let (n, v) = line.split_once(':')?;

			n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
		})
	}

	/// Appends a query parameter to the request URL.
	///
	/// Returns `false` without touching the request when the URL cannot be parsed.
	pub fn append_query_parameter(&mut self, name: &str, value: &str) -> bool {
		let Ok(mut url) = Url::parse(&self.url) else {
			return false;
		};

		url.query_pairs_mut().append_pair(name, value);

		self.url = url.into();

		true
	}
}

fn default_method() -> String {
	"GET".into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn append_header_joins_lines_with_newlines() {
		let mut request = OutgoingRequest::new("https://api.example/data", "GET");

		request.append_header("x-one", "1");
		request.append_header("x-two", "2");

		assert_eq!(request.headers, "x-one: 1\nx-two: 2");
		assert_eq!(request.header("X-TWO"), Some("2"));
		assert_eq!(request.header("missing"), None);
	}

	#[test]
	fn append_query_parameter_extends_the_url() {
		let mut request = OutgoingRequest::new("https://api.example/data?x=1", "GET");

		assert!(request.append_query_parameter("authorization", "Bearer test123"));
		assert_eq!(request.url, "https://api.example/data?x=1&authorization=Bearer+test123");
	}

	#[test]
	fn append_query_parameter_rejects_malformed_urls() {
		let mut request = OutgoingRequest::new("not a url", "GET");

		assert!(!request.append_query_parameter("authorization", "Bearer test123"));
		assert_eq!(request.url, "not a url");
	}

	#[test]
	fn deserializes_with_defaulted_method_and_headers() {
		let request: OutgoingRequest =
			serde_json::from_str(r#"{"url":"https://api.example/"}"#)
				.expect("Minimal request JSON should deserialize.");

		assert_eq!(request.method, "GET");
		assert!(request.headers.is_empty());
		assert!(request.payload.is_none());
	}
}
