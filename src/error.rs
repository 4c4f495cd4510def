//! Relay-level error types shared across contexts, stores, and the page bridge.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential-store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Invalid relay configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Login payload rejected at the trust boundary.
	#[error(transparent)]
	Payload(#[from] crate::session::PayloadError),
	/// Page-bridge boundary failure.
	#[error(transparent)]
	Bridge(#[from] crate::bridge::BridgeError),
	/// Network transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No usable credential is available for the call.
	#[error("No valid credential is available: {reason}.")]
	InvalidCredential {
		/// Gate- or service-supplied reason string.
		reason: String,
	},
	/// A pending login attempt did not complete before its deadline.
	#[error("Login did not complete within {waited}.")]
	LoginTimeout {
		/// Time the attempt was allowed to stay pending.
		waited: Duration,
	},
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Provider profile validation failed.
	#[error(transparent)]
	Profile(#[from] crate::provider::ProfileError),
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::ids::IdentifierError),
	/// Session record builder validation failed.
	#[error("Unable to build session record.")]
	RecordBuild(#[from] crate::session::RecordBuilderError),
	/// A pending-login deadline must be a positive duration.
	#[error("The login deadline must be positive.")]
	NonPositiveDeadline,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The HTTP client reported a connection-level failure.
	#[error("Network error occurred while reaching the service.")]
	Network {
		/// Client-specific network error.
		#[source]
		source: BoxError,
	},
	/// An IO failure surfaced while talking to the service.
	#[error("I/O error occurred while reaching the service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Boxes a client-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
