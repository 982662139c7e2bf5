//! Process-wide credential cache keyed by scheme and canonical request URL.

// self
use crate::{_prelude::*, auth::AuthorizationKind};

type CacheMap = Arc<RwLock<HashMap<CacheKey, CachedAuthData>>>;

/// Key identifying one cached credential.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
	/// Credential scheme the data belongs to.
	pub scheme: AuthorizationKind,
	/// Canonical request URL, query and fragment stripped.
	pub url: String,
}
impl CacheKey {
	/// Builds a key, canonicalizing the URL.
	pub fn new(scheme: AuthorizationKind, url: &str) -> Self {
		Self { scheme, url: canonical_url(url) }
	}
}

/// Credentials retained for silent re-authentication within the process lifetime.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAuthData {
	/// Account name.
	#[serde(default)]
	pub username: String,
	/// Optional password.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
	/// Optional NTLM domain.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
}
impl Debug for CachedAuthData {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedAuthData")
			.field("username", &self.username)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.field("domain", &self.domain)
			.finish()
	}
}

/// Strips the query and fragment from `raw`, falling back to the raw string when it does not
/// parse as an absolute URL.
pub fn canonical_url(raw: &str) -> String {
	match Url::parse(raw) {
		Ok(mut url) => {
			url.set_query(None);
			url.set_fragment(None);

			url.into()
		},
		Err(_) => raw.to_owned(),
	}
}

/// Thread-safe in-process credential cache.
///
/// Entries live until [`reset`](Self::reset); clones share the same underlying map, so one cache
/// can serve every decorator in the process.
#[derive(Clone, Debug, Default)]
pub struct AuthCache(CacheMap);
impl AuthCache {
	/// Inserts or replaces the credentials for `(scheme, url)`.
	pub fn update(&self, scheme: AuthorizationKind, url: &str, data: CachedAuthData) {
		self.0.write().insert(CacheKey::new(scheme, url), data);
	}

	/// Returns a copy of the credentials cached for `(scheme, url)`, if any.
	pub fn find(&self, scheme: AuthorizationKind, url: &str) -> Option<CachedAuthData> {
		self.0.read().get(&CacheKey::new(scheme, url)).cloned()
	}

	/// Removes every cached entry.
	pub fn reset(&self) {
		self.0.write().clear();
	}

	/// Returns the number of cached entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
