//! Client side of the NTLM v1 handshake.
//!
//! The transport engine drives the exchange: send the negotiate header, receive the server's
//! `WWW-Authenticate: NTLM <base64>` challenge, answer with the authenticate header. Everything
//! in between is deterministic.

pub mod crypto;
pub mod message;

pub use message::{AuthenticateMessage, ChallengeMessage, NegotiateMessage};

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::NtlmConfig, obs::FlowSpan};

/// Fatal handshake failures; the exchange aborts with no partial response.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum NtlmError {
	/// Message does not start with the NTLMSSP signature.
	#[error("NTLM message signature is invalid.")]
	InvalidSignature,
	/// Message type field does not match the expected handshake step.
	#[error("NTLM message type {found} arrived where type {expected} was expected.")]
	UnexpectedMessageType {
		/// Handshake step the client was waiting for.
		expected: u32,
		/// Type field found on the wire.
		found: u32,
	},
	/// Message is shorter than its fixed-size header.
	#[error("NTLM message is truncated at {len} bytes.")]
	Truncated {
		/// Observed message length.
		len: usize,
	},
	/// Header value does not carry an NTLM challenge payload.
	#[error("Header does not carry an NTLM challenge.")]
	MissingChallenge,
	/// Challenge payload is not valid base64.
	#[error("NTLM challenge payload is not valid base64.")]
	Base64(#[from] base64::DecodeError),
}

/// Extracts and parses the challenge from a `WWW-Authenticate` header value.
pub fn challenge_from_header(header: &str) -> Result<ChallengeMessage, NtlmError> {
	let trimmed = header.trim();
	let payload = trimmed
		.get(..4)
		.filter(|scheme| scheme.eq_ignore_ascii_case("ntlm"))
		.map(|_| trimmed[4..].trim())
		.filter(|payload| !payload.is_empty())
		.ok_or(NtlmError::MissingChallenge)?;
	let bytes = STANDARD.decode(payload)?;

	ChallengeMessage::parse(&bytes)
}

/// Produces the client messages of an NTLM v1 handshake for one set of credentials.
#[derive(Clone)]
pub struct NtlmChallengeResponder {
	domain: String,
	username: String,
	password: String,
	workstation: String,
}
impl NtlmChallengeResponder {
	/// Builds a responder from handshake credentials and the local workstation name.
	pub fn new(config: &NtlmConfig, workstation: impl Into<String>) -> Self {
		Self {
			domain: config.domain.clone().unwrap_or_default(),
			username: config.username.clone(),
			password: config.password.clone(),
			workstation: workstation.into(),
		}
	}

	/// Opens the handshake.
	pub fn negotiate(&self) -> NegotiateMessage {
		let _guard = FlowSpan::new("ntlm", "negotiate").entered();

		NegotiateMessage::new(self.domain.clone(), self.workstation.clone())
	}

	/// Renders the negotiate message as an `Authorization` header value.
	pub fn negotiate_header(&self) -> String {
		format!("NTLM {}", STANDARD.encode(self.negotiate().to_bytes()))
	}

	/// Answers a parsed server challenge.
	///
	/// The configured domain wins; when it is absent the server's target name is used instead.
	pub fn respond(&self, challenge: &ChallengeMessage) -> AuthenticateMessage {
		let _guard = FlowSpan::new("ntlm", "authenticate").entered();
		let lm_response =
			crypto::challenge_response(&crypto::lm_hash(&self.password), &challenge.challenge);
		let nt_response =
			crypto::challenge_response(&crypto::nt_hash(&self.password), &challenge.challenge);
		let domain = if self.domain.is_empty() {
			challenge.target_name.clone().unwrap_or_default()
		} else {
			self.domain.clone()
		};

		AuthenticateMessage {
			domain,
			username: self.username.clone(),
			workstation: self.workstation.clone(),
			lm_response,
			nt_response,
		}
	}

	/// Parses a `WWW-Authenticate` header value and answers the challenge it carries.
	pub fn respond_to_header(&self, header: &str) -> Result<AuthenticateMessage, NtlmError> {
		Ok(self.respond(&challenge_from_header(header)?))
	}

	/// Renders the authenticate message as an `Authorization` header value.
	pub fn authenticate_header(&self, challenge: &ChallengeMessage) -> String {
		format!("NTLM {}", STANDARD.encode(self.respond(challenge).to_bytes()))
	}
}
impl Debug for NtlmChallengeResponder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NtlmChallengeResponder")
			.field("domain", &self.domain)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("workstation", &self.workstation)
			.finish()
	}
}
