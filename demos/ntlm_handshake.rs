//! Runs the client half of an NTLM v1 handshake offline: negotiate header out, a fabricated
//! server challenge in, authenticate header out.

// crates.io
use color_eyre::Result;
// self
use authkit::{
	auth::NtlmConfig,
	ntlm::{ChallengeMessage, NtlmChallengeResponder, message},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let config = NtlmConfig {
		domain: Some("CORP".into()),
		username: "demo-user".into(),
		password: "demo-password".into(),
	};
	let responder = NtlmChallengeResponder::new(&config, "WS01");

	println!("Authorization: {}", responder.negotiate_header());

	// A server would answer with `WWW-Authenticate: NTLM <base64>`; fabricate its challenge here.
	let challenge = ChallengeMessage {
		challenge: [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF],
		target_name: Some("CORP".into()),
		flags: message::NEGOTIATE_FLAGS,
	};
	let authenticate = responder.respond(&challenge);

	println!(
		"Answering for {}\\{} from workstation {}.",
		&authenticate.domain, &authenticate.username, &authenticate.workstation
	);
	println!("Authorization: {}", responder.authenticate_header(&challenge));

	Ok(())
}
