//! Trust boundary for raw login payloads reported by provider pages.
//!
//! Pages deliver the session data as an opaque JSON string shaped like
//! `{"data":{...}}`. Nothing in it is trusted until it decodes into a
//! [`SessionRecord`]; a rejected payload must leave no stored state behind,
//! so the parser here is the only way page data becomes a record.

// self
use crate::{_prelude::*, session::record::SessionRecord};

/// Errors raised while decoding a raw login payload.
#[derive(Debug, ThisError)]
pub enum PayloadError {
	/// The payload is not well-formed JSON in the expected shape, or a field
	/// failed validation while decoding.
	#[error("Login payload is malformed.")]
	Malformed {
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
	data: SessionRecord,
}

/// Decodes the opaque session payload a provider page reported at login.
///
/// Field validation (non-empty subject, non-empty token) happens during
/// decoding, so the returned record is always usable.
pub fn parse_login_payload(raw: &str) -> Result<SessionRecord, PayloadError> {
	let mut deserializer = serde_json::Deserializer::from_str(raw);
	let envelope: RawEnvelope = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| PayloadError::Malformed { source })?;

	Ok(envelope.data)
}
