//! Origin vetting for cross-window messages.

// self
use crate::{
	_prelude::*,
	bridge::BridgeError,
	bus::SyncMessage,
	obs::{self, SyncKind, SyncOutcome},
	provider::ProviderProfile,
};

/// A cross-window message as the page boundary sees it.
///
/// Mirrors the two fields of a browser message event the relay cares about:
/// the reported sender origin and the serialized payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEnvelope {
	/// Origin string reported for the sending window.
	pub origin: String,
	/// Serialized [`SyncMessage`] payload.
	pub payload: String,
}
impl WindowEnvelope {
	/// Wraps an origin string and payload.
	pub fn new(origin: impl Into<String>, payload: impl Into<String>) -> Self {
		Self { origin: origin.into(), payload: payload.into() }
	}
}

/// Vets window messages against a provider's trusted origin.
///
/// The origin check always runs before the payload is decoded; a message from
/// the wrong origin is dropped without ever being parsed.
#[derive(Clone, Debug)]
pub struct OriginGuard {
	trusted: url::Origin,
}
impl OriginGuard {
	/// Creates a guard trusting exactly the profile's origin.
	pub fn new(profile: &ProviderProfile) -> Self {
		Self { trusted: profile.trusted_origin() }
	}

	/// The origin this guard accepts.
	pub fn trusted(&self) -> &url::Origin {
		&self.trusted
	}

	/// Checks a reported origin string against the trusted origin.
	///
	/// Comparison is by parsed origin (scheme, host, port), so a path suffix
	/// or different host casing does not matter, while a scheme, port, or
	/// subdomain difference does. Unparseable strings are untrusted.
	pub fn check(&self, origin: &str) -> Result<(), BridgeError> {
		let untrusted = || BridgeError::UntrustedOrigin { origin: origin.to_owned() };
		let parsed = Url::parse(origin).map_err(|_| untrusted())?;

		if parsed.origin() != self.trusted {
			return Err(untrusted());
		}

		Ok(())
	}

	/// Vets an envelope and decodes its payload into a [`SyncMessage`].
	pub fn accept(&self, envelope: &WindowEnvelope) -> Result<SyncMessage, BridgeError> {
		obs::record_sync_outcome(SyncKind::WindowMessage, SyncOutcome::Attempt);

		if let Err(e) = self.check(&envelope.origin) {
			obs::record_sync_outcome(SyncKind::WindowMessage, SyncOutcome::Rejected);

			return Err(e);
		}

		let mut deserializer = serde_json::Deserializer::from_str(&envelope.payload);

		match serde_path_to_error::deserialize(&mut deserializer) {
			Ok(message) => {
				obs::record_sync_outcome(SyncKind::WindowMessage, SyncOutcome::Success);

				Ok(message)
			},
			Err(source) => {
				obs::record_sync_outcome(SyncKind::WindowMessage, SyncOutcome::Rejected);

				Err(BridgeError::MalformedEnvelope { source })
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::test_profile;

	fn guard() -> OriginGuard {
		OriginGuard::new(&test_profile())
	}

	#[test]
	fn exact_origin_passes() {
		guard().check("https://id.example").expect("The trusted origin should pass.");
	}

	#[test]
	fn origin_comparison_ignores_path_and_case() {
		let guard = guard();

		guard.check("https://ID.EXAMPLE").expect("Host casing should not matter.");
		guard.check("https://id.example/login/callback").expect("Paths should not matter.");
		guard.check("https://id.example:443").expect("The default port should not matter.");
	}

	#[test]
	fn scheme_port_and_subdomain_differences_reject() {
		let guard = guard();
		let origins = [
			"http://id.example",
			"https://id.example:8443",
			"https://login.id.example",
			"https://id.example.attacker.test",
		];

		for origin in origins {
			let err = guard.check(origin).expect_err("A mismatched origin must be rejected.");

			assert!(matches!(err, BridgeError::UntrustedOrigin { origin: o } if o == origin));
		}
	}

	#[test]
	fn garbage_origins_are_untrusted() {
		let err = guard().check("not a url").expect_err("Unparseable origins must be rejected.");

		assert!(matches!(err, BridgeError::UntrustedOrigin { .. }));
	}

	#[test]
	fn accept_checks_origin_before_decoding() {
		// The payload is valid JSON; only the origin is wrong, and that alone
		// must sink the message.
		let envelope = WindowEnvelope::new(
			"https://evil.example",
			serde_json::to_string(&SyncMessage::logout()).expect("Message should serialize."),
		);
		let err = guard().accept(&envelope).expect_err("A foreign origin must be rejected.");

		assert!(matches!(err, BridgeError::UntrustedOrigin { .. }));
	}

	#[test]
	fn accept_decodes_trusted_payloads() {
		let sent = SyncMessage::login_state_changed("{\"data\":{}}", 1_700_000_000_000);
		let envelope = WindowEnvelope::new(
			"https://id.example",
			serde_json::to_string(&sent).expect("Message should serialize."),
		);
		let received = guard().accept(&envelope).expect("A trusted envelope should decode.");

		assert_eq!(received, sent);
	}

	#[test]
	fn accept_rejects_malformed_payloads() {
		let envelope =
			WindowEnvelope::new("https://id.example", r#"{"type":"LOGIN","data":42,"timestamp":0}"#);
		let err = guard().accept(&envelope).expect_err("A malformed payload must be rejected.");
		let BridgeError::MalformedEnvelope { source } = err else {
			panic!("Expected a malformed-envelope error.");
		};

		assert!(source.inner().is_data());
	}
}
