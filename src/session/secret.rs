//! Secure session token wrapper that redacts sensitive material.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Error returned when session token validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum TokenError {
	/// The token was empty or whitespace.
	#[error("Session token cannot be empty.")]
	Empty,
}

/// Redacted session token keeping the bearer secret out of logs.
///
/// Tokens are non-empty by construction; the serde implementations enforce the
/// same rule so a blank secret can never round-trip through a snapshot or a
/// login payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);
impl SessionToken {
	/// Wraps a new secret string after validation.
	pub fn new(value: impl Into<String>) -> Result<Self, TokenError> {
		let value = value.into();

		if value.trim().is_empty() {
			return Err(TokenError::Empty);
		}

		Ok(Self(value))
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Log-safe identity for the token: a base64 (no padding) encoding of its
	/// SHA-256 digest.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.0.as_bytes());

		let digest = hasher.finalize();

		STANDARD_NO_PAD.encode(digest)
	}
}
impl AsRef<str> for SessionToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl TryFrom<String> for SessionToken {
	type Error = TokenError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<SessionToken> for String {
	fn from(value: SessionToken) -> Self {
		value.0
	}
}
impl Debug for SessionToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SessionToken").field(&"<redacted>").finish()
	}
}
impl Display for SessionToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_formatters_redact() {
		let token = SessionToken::new("super-secret").expect("Token fixture should be valid.");

		assert_eq!(format!("{token:?}"), "SessionToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
	}

	#[test]
	fn blank_tokens_are_rejected() {
		assert_eq!(SessionToken::new(""), Err(TokenError::Empty));
		assert_eq!(SessionToken::new("   "), Err(TokenError::Empty));
		assert!(serde_json::from_str::<SessionToken>("\"\"").is_err());
	}

	#[test]
	fn fingerprint_is_stable_and_distinct() {
		let token = SessionToken::new("tok123").expect("Token fixture should be valid.");
		let other = SessionToken::new("tok124").expect("Token fixture should be valid.");

		assert_eq!(token.fingerprint(), token.fingerprint());
		assert_ne!(token.fingerprint(), other.fingerprint());
		assert!(!token.fingerprint().contains("tok123"), "Fingerprint must not echo the secret.");
	}

	#[test]
	fn serde_round_trip_preserves_the_secret() {
		let token = SessionToken::new("tok123").expect("Token fixture should be valid.");
		let encoded = serde_json::to_string(&token).expect("Token should serialize successfully.");

		assert_eq!(encoded, "\"tok123\"");

		let decoded: SessionToken =
			serde_json::from_str(&encoded).expect("Token should deserialize successfully.");

		assert_eq!(decoded, token);
	}
}
