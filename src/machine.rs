//! Per-context login state machine.
//!
//! Every view context owns one [`AuthMachine`] and feeds it events derived
//! from local user actions and relay broadcasts. The transition table is
//! closed: events that are meaningless in the current phase are ignored
//! rather than surfaced as errors, so stale or duplicate broadcasts cannot
//! corrupt a context's state.

// self
use crate::_prelude::*;

/// Login lifecycle phase of a single execution context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
	/// No credential and no attempt in flight.
	SignedOut,
	/// A login attempt awaits confirmation from the provider page.
	Pending,
	/// A credential is stored and usable.
	SignedIn,
	/// The last attempt failed or timed out; a retry is allowed.
	Failed,
}
impl AuthPhase {
	/// Static label used in metrics and spans.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::SignedOut => "signed_out",
			Self::Pending => "pending",
			Self::SignedIn => "signed_in",
			Self::Failed => "failed",
		}
	}

	/// Applies one event to the phase, returning the successor phase or `None`
	/// when the event is ignored in this phase.
	pub const fn transition(self, event: AuthEvent) -> Option<Self> {
		match (self, event) {
			(Self::SignedOut, AuthEvent::LoginStarted) => Some(Self::Pending),
			(Self::SignedOut, AuthEvent::LoginSucceeded) => Some(Self::SignedIn),
			(Self::Pending, AuthEvent::LoginSucceeded) => Some(Self::SignedIn),
			(Self::Pending, AuthEvent::LoginFailed) => Some(Self::Failed),
			(Self::SignedIn, AuthEvent::LoggedOut) => Some(Self::SignedOut),
			(Self::Failed, AuthEvent::LoginStarted) => Some(Self::Pending),
			(Self::Failed, AuthEvent::LoggedOut) => Some(Self::SignedOut),
			_ => None,
		}
	}
}
impl Display for AuthPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Event driving the login state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
	/// The user started a login attempt in this context.
	LoginStarted,
	/// A stored-credential confirmation arrived.
	LoginSucceeded,
	/// The attempt failed or its deadline passed.
	LoginFailed,
	/// The credential was cleared.
	LoggedOut,
}
impl AuthEvent {
	/// Static label used in metrics and spans.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::LoginStarted => "login_started",
			Self::LoginSucceeded => "login_succeeded",
			Self::LoginFailed => "login_failed",
			Self::LoggedOut => "logged_out",
		}
	}
}
impl Display for AuthEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Owns the current [`AuthPhase`] for one context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthMachine {
	phase: AuthPhase,
}
impl AuthMachine {
	/// Starts the machine in the given phase.
	pub const fn new(initial: AuthPhase) -> Self {
		Self { phase: initial }
	}

	/// Current phase.
	pub const fn phase(&self) -> AuthPhase {
		self.phase
	}

	/// Applies one event, returning `true` when the phase changed.
	pub fn apply(&mut self, event: AuthEvent) -> bool {
		match self.phase.transition(event) {
			Some(next) => {
				self.phase = next;

				true
			},
			None => false,
		}
	}
}
impl Default for AuthMachine {
	fn default() -> Self {
		Self::new(AuthPhase::SignedOut)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const PHASES: [AuthPhase; 4] =
		[AuthPhase::SignedOut, AuthPhase::Pending, AuthPhase::SignedIn, AuthPhase::Failed];
	const EVENTS: [AuthEvent; 4] = [
		AuthEvent::LoginStarted,
		AuthEvent::LoginSucceeded,
		AuthEvent::LoginFailed,
		AuthEvent::LoggedOut,
	];

	#[test]
	fn transition_table_is_exhaustive() {
		let expected = |phase, event| match (phase, event) {
			(AuthPhase::SignedOut, AuthEvent::LoginStarted) => Some(AuthPhase::Pending),
			(AuthPhase::SignedOut, AuthEvent::LoginSucceeded) => Some(AuthPhase::SignedIn),
			(AuthPhase::Pending, AuthEvent::LoginSucceeded) => Some(AuthPhase::SignedIn),
			(AuthPhase::Pending, AuthEvent::LoginFailed) => Some(AuthPhase::Failed),
			(AuthPhase::SignedIn, AuthEvent::LoggedOut) => Some(AuthPhase::SignedOut),
			(AuthPhase::Failed, AuthEvent::LoginStarted) => Some(AuthPhase::Pending),
			(AuthPhase::Failed, AuthEvent::LoggedOut) => Some(AuthPhase::SignedOut),
			_ => None,
		};

		for phase in PHASES {
			for event in EVENTS {
				assert_eq!(
					phase.transition(event),
					expected(phase, event),
					"{phase} + {event} must match the table.",
				);
			}
		}
	}

	#[test]
	fn ignored_events_leave_the_machine_untouched() {
		let mut machine = AuthMachine::default();

		assert!(!machine.apply(AuthEvent::LoginFailed));
		assert_eq!(machine.phase(), AuthPhase::SignedOut);
		assert!(!machine.apply(AuthEvent::LoggedOut));
		assert_eq!(machine.phase(), AuthPhase::SignedOut);
	}

	#[test]
	fn full_login_cycle() {
		let mut machine = AuthMachine::default();

		assert!(machine.apply(AuthEvent::LoginStarted));
		assert_eq!(machine.phase(), AuthPhase::Pending);
		assert!(machine.apply(AuthEvent::LoginSucceeded));
		assert_eq!(machine.phase(), AuthPhase::SignedIn);
		assert!(machine.apply(AuthEvent::LoggedOut));
		assert_eq!(machine.phase(), AuthPhase::SignedOut);
	}

	#[test]
	fn failed_attempt_allows_retry() {
		let mut machine = AuthMachine::default();

		assert!(machine.apply(AuthEvent::LoginStarted));
		assert!(machine.apply(AuthEvent::LoginFailed));
		assert_eq!(machine.phase(), AuthPhase::Failed);
		assert!(machine.apply(AuthEvent::LoginStarted));
		assert_eq!(machine.phase(), AuthPhase::Pending);
	}

	#[test]
	fn direct_sign_in_from_signed_out() {
		// A confirmation broadcast can arrive in a context that never started
		// the attempt itself.
		let mut machine = AuthMachine::default();

		assert!(machine.apply(AuthEvent::LoginSucceeded));
		assert_eq!(machine.phase(), AuthPhase::SignedIn);
	}

	#[test]
	fn duplicate_confirmations_are_idempotent() {
		let mut machine = AuthMachine::new(AuthPhase::SignedIn);

		assert!(!machine.apply(AuthEvent::LoginSucceeded));
		assert_eq!(machine.phase(), AuthPhase::SignedIn);
	}
}
