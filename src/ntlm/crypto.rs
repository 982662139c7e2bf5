//! LM/NT password hashes and the NTLM v1 challenge-response computation.
//!
//! Everything here is deterministic: the same credentials and server challenge always reproduce
//! the same bytes, which the handshake tests rely on.

// crates.io
use des::{
	Des,
	cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray},
};
use md4::{Digest, Md4};

/// Fixed plaintext DES-encrypted under the password halves to form the LM hash.
const LM_MAGIC: &[u8; 8] = b"KGS!@#$%";

/// Expands a 7-byte key into an 8-byte DES key.
///
/// The seven data bits of each output byte come from a sliding window over the input; the low bit
/// is an odd parity bit computed by folding the data bits.
pub fn expand_des_key(key7: &[u8; 7]) -> [u8; 8] {
	let mut key8 = [
		key7[0] >> 1,
		((key7[0] & 0x01) << 6) | (key7[1] >> 2),
		((key7[1] & 0x03) << 5) | (key7[2] >> 3),
		((key7[2] & 0x07) << 4) | (key7[3] >> 4),
		((key7[3] & 0x0F) << 3) | (key7[4] >> 5),
		((key7[4] & 0x1F) << 2) | (key7[5] >> 6),
		((key7[5] & 0x3F) << 1) | (key7[6] >> 7),
		key7[6] & 0x7F,
	];

	for byte in &mut key8 {
		*byte <<= 1;

		let mut parity = *byte;

		parity ^= parity >> 4;
		parity ^= parity >> 2;
		parity ^= parity >> 1;

		*byte |= (parity & 0x01) ^ 0x01;
	}

	key8
}

fn des_encrypt_block(key8: &[u8; 8], data: &[u8; 8]) -> [u8; 8] {
	let cipher = Des::new(GenericArray::from_slice(key8));
	let mut block = GenericArray::clone_from_slice(data);

	cipher.encrypt_block(&mut block);

	block.into()
}

/// 16-byte LM hash: the uppercased password, padded to 14 bytes, keys two DES encryptions of a
/// fixed plaintext.
pub fn lm_hash(password: &str) -> [u8; 16] {
	let upper = password.to_uppercase();
	let bytes = upper.as_bytes();
	let mut padded = [0_u8; 14];
	let len = bytes.len().min(14);

	padded[..len].copy_from_slice(&bytes[..len]);

	let mut halves = [[0_u8; 7]; 2];

	halves[0].copy_from_slice(&padded[..7]);
	halves[1].copy_from_slice(&padded[7..]);

	let mut hash = [0_u8; 16];

	for (half, out) in halves.iter().zip(hash.chunks_exact_mut(8)) {
		out.copy_from_slice(&des_encrypt_block(&expand_des_key(half), LM_MAGIC));
	}

	hash
}

/// 16-byte NT hash: MD4 over the UTF-16LE encoding of the password.
pub fn nt_hash(password: &str) -> [u8; 16] {
	let mut hasher = Md4::new();

	for unit in password.encode_utf16() {
		hasher.update(unit.to_le_bytes());
	}

	hasher.finalize().into()
}

/// 24-byte NTLM v1 response: the hash is zero-padded to 21 bytes, split into three 7-byte DES
/// keys, and each key encrypts the 8-byte server challenge.
pub fn challenge_response(hash: &[u8; 16], challenge: &[u8; 8]) -> [u8; 24] {
	let mut padded = [0_u8; 21];

	padded[..16].copy_from_slice(hash);

	let mut response = [0_u8; 24];

	for (third, out) in padded.chunks_exact(7).zip(response.chunks_exact_mut(8)) {
		let mut key7 = [0_u8; 7];

		key7.copy_from_slice(third);
		out.copy_from_slice(&des_encrypt_block(&expand_des_key(&key7), challenge));
	}

	response
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn hex(s: &str) -> Vec<u8> {
		s.as_bytes()
			.chunks_exact(2)
			.map(|pair| {
				u8::from_str_radix(std::str::from_utf8(pair).expect("Hex input should be ASCII."), 16)
					.expect("Hex input should be valid.")
			})
			.collect()
	}

	const CHALLENGE: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];

	#[test]
	fn md4_of_the_empty_password_matches_the_known_digest() {
		assert_eq!(nt_hash("").to_vec(), hex("31d6cfe0d16ae931b73c59d7e0c089c0"));
	}

	#[test]
	fn nt_hash_matches_the_reference_vector() {
		assert_eq!(nt_hash("Password").to_vec(), hex("a4f49c406510bdcab6824ee7c30fd852"));
	}

	#[test]
	fn lm_hash_matches_the_reference_vector() {
		assert_eq!(lm_hash("Password").to_vec(), hex("e52cac67419a9a224a3b108f3fa6cb6d"));
	}

	#[test]
	fn lm_hash_uppercases_and_truncates_to_fourteen_bytes() {
		assert_eq!(lm_hash("password"), lm_hash("PASSWORD"));
		assert_eq!(lm_hash("abcdefghijklmn"), lm_hash("abcdefghijklmnop"));
	}

	#[test]
	fn nt_response_matches_the_reference_vector() {
		assert_eq!(
			challenge_response(&nt_hash("Password"), &CHALLENGE).to_vec(),
			hex("67c43011f30298a2ad35ece64f16331c44bdbed927841f94")
		);
	}

	#[test]
	fn lm_response_matches_the_reference_vector() {
		assert_eq!(
			challenge_response(&lm_hash("Password"), &CHALLENGE).to_vec(),
			hex("98def7b87f88aa5dafe2df779688a172def11c7d5ccdef13")
		);
	}

	#[test]
	fn expanded_keys_carry_odd_parity() {
		let key8 = expand_des_key(b"\x01\x23\x45\x67\x89\xab\xcd");

		for byte in key8 {
			assert_eq!(byte.count_ones() % 2, 1);
		}
	}

	#[test]
	fn responses_are_deterministic() {
		let first = challenge_response(&nt_hash("secret"), &CHALLENGE);
		let second = challenge_response(&nt_hash("secret"), &CHALLENGE);

		assert_eq!(first, second);
	}
}
