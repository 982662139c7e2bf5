//! NTLMSSP handshake messages: negotiate (Type 1), challenge (Type 2), authenticate (Type 3).
//!
//! Multi-byte integers are little-endian; variable-length fields travel as
//! `(len: u16, maxlen: u16, offset: u32)` security buffers pointing into the payload.

// self
use crate::ntlm::NtlmError;

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

/// Negotiate flag: strings may be Unicode (UTF-16LE).
pub const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
/// Negotiate flag: strings may be OEM (8-bit).
pub const NEGOTIATE_OEM: u32 = 0x0000_0002;
/// Negotiate flag: NTLM authentication is requested.
pub const NEGOTIATE_NTLM: u32 = 0x0000_0200;
/// Negotiate flag: the negotiate message supplies a domain.
pub const DOMAIN_SUPPLIED: u32 = 0x0000_1000;
/// Negotiate flag: the negotiate message supplies a workstation.
pub const WORKSTATION_SUPPLIED: u32 = 0x0000_2000;
/// Negotiate flag: a signature block is requested on every message.
pub const ALWAYS_SIGN: u32 = 0x0000_8000;

/// Flag word sent by this client on negotiate and authenticate messages.
pub const NEGOTIATE_FLAGS: u32 = NEGOTIATE_UNICODE
	| NEGOTIATE_OEM
	| NEGOTIATE_NTLM
	| DOMAIN_SUPPLIED
	| WORKSTATION_SUPPLIED
	| ALWAYS_SIGN;

/// Negotiate (Type 1) message opening the handshake.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NegotiateMessage {
	/// Windows domain offered to the server.
	pub domain: String,
	/// Workstation name offered to the server.
	pub workstation: String,
}
impl NegotiateMessage {
	/// Builds a negotiate message.
	pub fn new(domain: impl Into<String>, workstation: impl Into<String>) -> Self {
		Self { domain: domain.into(), workstation: workstation.into() }
	}

	/// Renders the wire bytes.
	///
	/// Domain and workstation travel as uppercase 8-bit strings, workstation first at offset 32.
	pub fn to_bytes(&self) -> Vec<u8> {
		let domain = self.domain.to_uppercase();
		let workstation = self.workstation.to_uppercase();
		let mut bytes = Vec::with_capacity(32 + workstation.len() + domain.len());

		bytes.extend_from_slice(SIGNATURE);
		bytes.extend_from_slice(&1_u32.to_le_bytes());
		bytes.extend_from_slice(&NEGOTIATE_FLAGS.to_le_bytes());
		push_security_buffer(&mut bytes, domain.len(), 32 + workstation.len());
		push_security_buffer(&mut bytes, workstation.len(), 32);
		bytes.extend_from_slice(workstation.as_bytes());
		bytes.extend_from_slice(domain.as_bytes());

		bytes
	}
}

/// Parsed challenge (Type 2) message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeMessage {
	/// 8-byte server challenge the responses are computed over.
	pub challenge: [u8; 8],
	/// Target (domain) name advertised by the server, when present.
	pub target_name: Option<String>,
	/// Flag word chosen by the server.
	pub flags: u32,
}
impl ChallengeMessage {
	/// Parses the wire bytes of a challenge message.
	pub fn parse(bytes: &[u8]) -> Result<Self, NtlmError> {
		if bytes.len() < 32 {
			return Err(NtlmError::Truncated { len: bytes.len() });
		}
		if &bytes[..8] != SIGNATURE {
			return Err(NtlmError::InvalidSignature);
		}

		let message_type = read_u32(bytes, 8);

		if message_type != 2 {
			return Err(NtlmError::UnexpectedMessageType { expected: 2, found: message_type });
		}

		let flags = read_u32(bytes, 20);
		let mut challenge = [0_u8; 8];

		challenge.copy_from_slice(&bytes[24..32]);

		let name_len = read_u16(bytes, 12) as usize;
		let name_offset = read_u32(bytes, 16) as usize;
		let target_name = (name_len > 0 && name_offset + name_len <= bytes.len()).then(|| {
			let raw = &bytes[name_offset..name_offset + name_len];

			if flags & NEGOTIATE_UNICODE != 0 {
				decode_utf16le(raw)
			} else {
				String::from_utf8_lossy(raw).into_owned()
			}
		});

		Ok(Self { challenge, target_name, flags })
	}
}

/// Authenticate (Type 3) message closing the handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticateMessage {
	/// Windows domain the responses authenticate against.
	pub domain: String,
	/// Account name.
	pub username: String,
	/// Workstation name.
	pub workstation: String,
	/// 24-byte LM response.
	pub lm_response: [u8; 24],
	/// 24-byte NT response.
	pub nt_response: [u8; 24],
}
impl AuthenticateMessage {
	/// Renders the wire bytes.
	///
	/// The 64-byte header places the LM response at offset 64 and the NT response at 88; the
	/// UTF-16LE domain, username, and workstation follow from offset 112. The session-key buffer
	/// stays zeroed.
	pub fn to_bytes(&self) -> Vec<u8> {
		let domain = utf16le(&self.domain);
		let username = utf16le(&self.username);
		let workstation = utf16le(&self.workstation);
		let domain_offset = 112;
		let username_offset = domain_offset + domain.len();
		let workstation_offset = username_offset + username.len();
		let mut bytes = Vec::with_capacity(workstation_offset + workstation.len());

		bytes.extend_from_slice(SIGNATURE);
		bytes.extend_from_slice(&3_u32.to_le_bytes());
		push_security_buffer(&mut bytes, 24, 64);
		push_security_buffer(&mut bytes, 24, 88);
		push_security_buffer(&mut bytes, domain.len(), domain_offset);
		push_security_buffer(&mut bytes, username.len(), username_offset);
		push_security_buffer(&mut bytes, workstation.len(), workstation_offset);
		push_security_buffer(&mut bytes, 0, 0);
		bytes.extend_from_slice(&NEGOTIATE_FLAGS.to_le_bytes());
		bytes.extend_from_slice(&self.lm_response);
		bytes.extend_from_slice(&self.nt_response);
		bytes.extend_from_slice(&domain);
		bytes.extend_from_slice(&username);
		bytes.extend_from_slice(&workstation);

		bytes
	}
}

fn push_security_buffer(out: &mut Vec<u8>, len: usize, offset: usize) {
	out.extend_from_slice(&(len as u16).to_le_bytes());
	out.extend_from_slice(&(len as u16).to_le_bytes());
	out.extend_from_slice(&(offset as u32).to_le_bytes());
}

fn utf16le(value: &str) -> Vec<u8> {
	value.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn decode_utf16le(raw: &[u8]) -> String {
	let units: Vec<u16> =
		raw.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();

	String::from_utf16_lossy(&units)
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
	u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
	u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn challenge_bytes(challenge: [u8; 8], target_name: Option<&str>) -> Vec<u8> {
		let name = target_name.map(utf16le).unwrap_or_default();
		let mut bytes = Vec::new();

		bytes.extend_from_slice(SIGNATURE);
		bytes.extend_from_slice(&2_u32.to_le_bytes());
		push_security_buffer(&mut bytes, name.len(), 32);
		bytes.extend_from_slice(&(NEGOTIATE_UNICODE | NEGOTIATE_NTLM).to_le_bytes());
		bytes.extend_from_slice(&challenge);
		bytes.extend_from_slice(&name);

		bytes
	}

	const CHALLENGE: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];

	#[test]
	fn negotiate_message_lays_out_workstation_then_domain() {
		let bytes = NegotiateMessage::new("corp", "ws01").to_bytes();

		assert_eq!(&bytes[..8], SIGNATURE);
		assert_eq!(read_u32(&bytes, 8), 1);
		assert_eq!(read_u32(&bytes, 12), NEGOTIATE_FLAGS);
		// domain buffer points past the workstation
		assert_eq!(read_u16(&bytes, 16), 4);
		assert_eq!(read_u32(&bytes, 20), 36);
		// workstation buffer points at the payload start
		assert_eq!(read_u16(&bytes, 24), 4);
		assert_eq!(read_u32(&bytes, 28), 32);
		assert_eq!(&bytes[32..36], b"WS01");
		assert_eq!(&bytes[36..40], b"CORP");
		assert_eq!(bytes.len(), 40);
	}

	#[test]
	fn negotiate_flags_match_the_client_profile() {
		assert_eq!(NEGOTIATE_FLAGS, 0x0000_B203);
	}

	#[test]
	fn challenge_parses_the_server_nonce_and_target() {
		let message = ChallengeMessage::parse(&challenge_bytes(CHALLENGE, Some("CORP")))
			.expect("Challenge fixture should parse.");

		assert_eq!(message.challenge, CHALLENGE);
		assert_eq!(message.target_name.as_deref(), Some("CORP"));
		assert_ne!(message.flags & NEGOTIATE_UNICODE, 0);
	}

	#[test]
	fn challenge_rejects_truncated_input() {
		let error = ChallengeMessage::parse(&[0_u8; 16])
			.expect_err("Short input should be rejected.");

		assert!(matches!(error, NtlmError::Truncated { len: 16 }));
	}

	#[test]
	fn challenge_rejects_a_bad_signature() {
		let mut bytes = challenge_bytes(CHALLENGE, None);

		bytes[0] = b'X';

		assert!(matches!(
			ChallengeMessage::parse(&bytes),
			Err(NtlmError::InvalidSignature)
		));
	}

	#[test]
	fn challenge_rejects_other_message_types() {
		let mut bytes = challenge_bytes(CHALLENGE, None);

		bytes[8] = 3;

		assert!(matches!(
			ChallengeMessage::parse(&bytes),
			Err(NtlmError::UnexpectedMessageType { expected: 2, found: 3 })
		));
	}

	#[test]
	fn authenticate_message_places_responses_and_identities() {
		let message = AuthenticateMessage {
			domain: "corp".into(),
			username: "user".into(),
			workstation: "ws01".into(),
			lm_response: [0x11; 24],
			nt_response: [0x22; 24],
		};
		let bytes = message.to_bytes();

		assert_eq!(&bytes[..8], SIGNATURE);
		assert_eq!(read_u32(&bytes, 8), 3);
		// LM then NT responses
		assert_eq!(read_u16(&bytes, 12), 24);
		assert_eq!(read_u32(&bytes, 16), 64);
		assert_eq!(read_u16(&bytes, 20), 24);
		assert_eq!(read_u32(&bytes, 24), 88);
		assert_eq!(&bytes[64..88], &[0x11; 24]);
		assert_eq!(&bytes[88..112], &[0x22; 24]);
		// identities in UTF-16LE, not uppercased
		assert_eq!(read_u16(&bytes, 28), 8);
		assert_eq!(read_u32(&bytes, 32), 112);
		assert_eq!(&bytes[112..120], utf16le("corp").as_slice());
		assert_eq!(&bytes[120..128], utf16le("user").as_slice());
		assert_eq!(&bytes[128..136], utf16le("ws01").as_slice());
		// zeroed session key buffer, then the flag word
		assert_eq!(&bytes[52..60], &[0_u8; 8]);
		assert_eq!(read_u32(&bytes, 60), NEGOTIATE_FLAGS);
		assert_eq!(bytes.len(), 136);
	}
}
