//! Boundary between provider pages and the relay.
//!
//! Two pieces guard that boundary: [`OriginGuard`] vets cross-window messages against the
//! provider's trusted origin before anything is decoded, and [`PageBridge`] watches a page's
//! session storage to turn writes and removals of the session key into typed reports.

pub mod monitor;
pub mod origin;

pub use monitor::*;
pub use origin::*;

// self
use crate::_prelude::*;

/// Failures raised at the page boundary.
#[derive(Debug, ThisError)]
pub enum BridgeError {
	/// The message came from an origin other than the provider's.
	#[error("Rejected a window message from untrusted origin {origin}.")]
	UntrustedOrigin {
		/// Origin string exactly as the window event carried it.
		origin: String,
	},
	/// The bridge was asked to install on a page it does not serve.
	#[error("The page bridge does not serve host {host}.")]
	UnexpectedHost {
		/// Host of the page that requested the bridge.
		host: String,
	},
	/// The message passed the origin check but its payload did not decode.
	#[error("Malformed window message payload.")]
	MalformedEnvelope {
		/// Decode failure with the path to the offending field.
		#[from]
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
