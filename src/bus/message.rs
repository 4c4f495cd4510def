//! Typed message vocabulary exchanged across contexts and with provider pages.

// self
use crate::{_prelude::*, machine::AuthEvent};

/// Fire-and-forget synchronization message.
///
/// The union is closed: every kind carries a fixed payload shape, and the wire
/// encoding (`{"type": ..., "data"?: ..., "timestamp": ...}`) matches what
/// provider pages post between windows, so one codec serves both the internal
/// bus and the page boundary. `timestamp` is epoch milliseconds, stamped at
/// the moment the triggering action was observed and carried through
/// unchanged by relaying contexts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncMessage {
	/// Status query from a freshly attached context; answered with a
	/// [`LoginSnapshot`] and forwarded to provider tabs so they can re-announce
	/// an existing session.
	#[serde(rename = "INIT_LOGIN")]
	InitLogin {
		/// Moment the query was issued, epoch milliseconds.
		timestamp: i64,
	},
	/// Raw session data observed on a provider page after a login.
	#[serde(rename = "LOGIN")]
	Login {
		/// Opaque session payload exactly as the page stored it.
		data: String,
		/// Moment the write was observed, epoch milliseconds.
		timestamp: i64,
	},
	/// Session-key removal observed on a provider page.
	#[serde(rename = "LOGOUT")]
	Logout {
		/// Moment the removal was observed, epoch milliseconds.
		timestamp: i64,
	},
	/// The credential was persisted; views transition and pages mirror the
	/// data into their own storage.
	#[serde(rename = "LOGIN_STATE_CHANGED")]
	LoginStateChanged {
		/// Raw session payload for pages to mirror.
		data: String,
		/// Moment of the confirmed state change, epoch milliseconds.
		timestamp: i64,
	},
	/// The credential was cleared; views transition and pages drop the
	/// session key.
	#[serde(rename = "LOGOUT_STATE_CHANGED")]
	LogoutStateChanged {
		/// Moment of the confirmed state change, epoch milliseconds.
		timestamp: i64,
	},
}
impl SyncMessage {
	/// Stamps an `INIT_LOGIN` query with the current clock.
	pub fn init_login() -> Self {
		Self::InitLogin { timestamp: now_epoch_millis() }
	}

	/// Stamps a `LOGIN` report with the current clock.
	pub fn login(data: impl Into<String>) -> Self {
		Self::Login { data: data.into(), timestamp: now_epoch_millis() }
	}

	/// Stamps a `LOGOUT` report with the current clock.
	pub fn logout() -> Self {
		Self::Logout { timestamp: now_epoch_millis() }
	}

	/// Builds a login confirmation carrying the observation timestamp through.
	pub fn login_state_changed(data: impl Into<String>, timestamp: i64) -> Self {
		Self::LoginStateChanged { data: data.into(), timestamp }
	}

	/// Builds a logout confirmation carrying the observation timestamp through.
	pub fn logout_state_changed(timestamp: i64) -> Self {
		Self::LogoutStateChanged { timestamp }
	}

	/// Stable wire label for the message kind.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::InitLogin { .. } => "INIT_LOGIN",
			Self::Login { .. } => "LOGIN",
			Self::Logout { .. } => "LOGOUT",
			Self::LoginStateChanged { .. } => "LOGIN_STATE_CHANGED",
			Self::LogoutStateChanged { .. } => "LOGOUT_STATE_CHANGED",
		}
	}

	/// Moment the triggering action was observed, epoch milliseconds.
	pub const fn timestamp(&self) -> i64 {
		match self {
			Self::InitLogin { timestamp }
			| Self::Login { timestamp, .. }
			| Self::Logout { timestamp }
			| Self::LoginStateChanged { timestamp, .. }
			| Self::LogoutStateChanged { timestamp } => *timestamp,
		}
	}

	/// Maps confirmation kinds onto view-side state-machine events.
	///
	/// Only the two state-changed kinds drive view machines; reports and
	/// queries return `None` and are ignored by views.
	pub const fn as_view_event(&self) -> Option<AuthEvent> {
		match self {
			Self::LoginStateChanged { .. } => Some(AuthEvent::LoginSucceeded),
			Self::LogoutStateChanged { .. } => Some(AuthEvent::LoggedOut),
			_ => None,
		}
	}
}

/// Reply returned to `INIT_LOGIN` queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSnapshot {
	/// Whether a usable credential was present at the moment of the query.
	pub is_logged_in: bool,
}

pub(crate) fn now_epoch_millis() -> i64 {
	(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
