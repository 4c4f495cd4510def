//! Optional observability helpers for relay operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `auth_relay.sync` with the `op` (operation)
//!   and `stage` (call site) fields.
//! - Enable `metrics` to increment the `auth_relay_sync_total` counter for every
//!   attempt/success/failure/rejection, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Synchronization operations observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncKind {
	/// Status query from a freshly attached context.
	InitLogin,
	/// Login report arriving from a provider page.
	Login,
	/// Logout report arriving from a provider page.
	Logout,
	/// Refresh demand raised for a credential nearing expiry.
	Refresh,
	/// Cross-window message crossing the page boundary.
	WindowMessage,
	/// Outbound request authorized with the stored credential.
	Request,
}
impl SyncKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SyncKind::InitLogin => "init_login",
			SyncKind::Login => "login",
			SyncKind::Logout => "logout",
			SyncKind::Refresh => "refresh",
			SyncKind::WindowMessage => "window_message",
			SyncKind::Request => "request",
		}
	}
}
impl Display for SyncKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncOutcome {
	/// Entry to a relay operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Input refused before it reached shared state.
	Rejected,
}
impl SyncOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SyncOutcome::Attempt => "attempt",
			SyncOutcome::Success => "success",
			SyncOutcome::Failure => "failure",
			SyncOutcome::Rejected => "rejected",
		}
	}
}
impl Display for SyncOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
