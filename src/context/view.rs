//! Per-context login views converged over the bus.

// std
use std::future;
// crates.io
use tokio::{
	sync::watch,
	time::{Instant, sleep_until},
};
// self
use crate::{
	_prelude::*,
	bus::{BusSubscription, RelayBus, SyncMessage},
	ids::ContextId,
	machine::{AuthEvent, AuthMachine, AuthPhase},
	provider::RelayConfig,
	store::CredentialStore,
};

#[derive(Debug)]
struct PendingLogin {
	deadline: Instant,
	wait: Duration,
}
impl PendingLogin {
	fn arm(wait: Duration) -> Self {
		let delay = std::time::Duration::try_from(wait).unwrap_or_default();

		Self { deadline: Instant::now() + delay, wait }
	}

	async fn expired(&self) -> Duration {
		sleep_until(self.deadline).await;

		self.wait
	}
}

/// Outcome of one synchronization turn of a view.
#[derive(Debug)]
pub enum ViewTurn {
	/// A message was processed; the machine now rests on this phase.
	Synced(AuthPhase),
	/// The pending login attempt ran out of time.
	TimedOut(Error),
	/// Every bus handle is gone; the view cannot converge any further.
	Disconnected,
}

/// Login state of one non-background context.
///
/// A view never touches the credential store after [`ViewContext::attach`]
/// seeds its initial phase; from then on it converges purely on bus
/// confirmations. Each view owns an [`AuthMachine`], an optional pending
/// login deadline, and a watch feed that the embedding surface (a popup, a
/// sidebar) renders from.
#[derive(Debug)]
pub struct ViewContext {
	machine: AuthMachine,
	subscription: BusSubscription,
	context: ContextId,
	config: RelayConfig,
	pending: Option<PendingLogin>,
	feed: watch::Sender<AuthPhase>,
}
impl ViewContext {
	/// Attaches a fresh view to the bus, seeding its phase from the store.
	///
	/// This is the only moment a view consults the store. Returns the view
	/// together with a watch receiver tracking its phase.
	pub async fn attach(
		store: &dyn CredentialStore,
		bus: &RelayBus,
		config: RelayConfig,
	) -> Result<(Self, watch::Receiver<AuthPhase>)> {
		let context = ContextId::random();
		let subscription = bus.subscribe(context.clone());
		let seeded = if store
			.is_authenticated(config.freshness, OffsetDateTime::now_utc())
			.await?
		{
			AuthPhase::SignedIn
		} else {
			AuthPhase::SignedOut
		};
		let machine = AuthMachine::new(seeded);
		let (feed, phases) = watch::channel(machine.phase());

		Ok((Self { machine, subscription, context, config, pending: None, feed }, phases))
	}

	/// Marks a login attempt as started and arms its deadline.
	///
	/// Returns `false` without arming anything when a login cannot start
	/// from the current phase (already signed in, or an attempt is already
	/// pending). The attempt itself happens on the provider page; this view
	/// merely waits for the confirmation or the deadline, whichever is first.
	pub fn begin_login(&mut self) -> bool {
		if !self.machine.apply(AuthEvent::LoginStarted) {
			return false;
		}

		self.pending = Some(PendingLogin::arm(self.config.login_deadline));
		self.publish_phase();

		true
	}

	/// Runs one synchronization turn.
	///
	/// Waits for whichever comes first: the next bus message or the pending
	/// login's deadline. A confirmation that settles the attempt disarms the
	/// deadline in the same turn, so a success racing the timer wins; a
	/// logout confirmation does not settle a pending attempt and leaves the
	/// deadline armed.
	pub async fn turn(&mut self) -> ViewTurn {
		tokio::select! {
			message = self.subscription.recv() => match message {
				Some(message) => {
					let phase = self.apply_message(&message);

					if phase != AuthPhase::Pending {
						self.pending = None;
					}

					ViewTurn::Synced(phase)
				},
				None => ViewTurn::Disconnected,
			},
			waited = Self::deadline(&self.pending) => {
				self.pending = None;

				if self.machine.apply(AuthEvent::LoginFailed) {
					self.publish_phase();
				}

				ViewTurn::TimedOut(Error::LoginTimeout { waited })
			},
		}
	}

	/// Drives the view until the bus disconnects, keeping the watch feed
	/// fresh for whoever renders it.
	pub async fn run(mut self) {
		while !matches!(self.turn().await, ViewTurn::Disconnected) {}
	}

	/// Current login phase.
	pub fn phase(&self) -> AuthPhase {
		self.machine.phase()
	}

	/// Identity of this view on the bus.
	pub fn context(&self) -> &ContextId {
		&self.context
	}

	/// Whether a login attempt is waiting on its deadline.
	pub fn login_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// New receiver tracking this view's phase.
	pub fn subscribe_phase(&self) -> watch::Receiver<AuthPhase> {
		self.feed.subscribe()
	}

	fn apply_message(&mut self, message: &SyncMessage) -> AuthPhase {
		let applied = message.as_view_event().is_some_and(|event| self.machine.apply(event));

		if applied {
			self.publish_phase();
		}

		self.machine.phase()
	}

	fn publish_phase(&self) {
		let _ = self.feed.send(self.machine.phase());
	}

	async fn deadline(pending: &Option<PendingLogin>) -> Duration {
		match pending {
			Some(pending) => pending.expired().await,
			None => future::pending().await,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{ids::SubjectId, session::SessionRecord, store::MemoryStore};

	fn subject() -> SubjectId {
		SubjectId::new("u1").expect("Subject fixture should be valid.")
	}

	fn record() -> SessionRecord {
		SessionRecord::builder(subject())
			.token("tok123")
			.build()
			.expect("Record fixture should be valid.")
	}

	async fn attach(store: &MemoryStore, bus: &RelayBus) -> ViewContext {
		ViewContext::attach(store, bus, RelayConfig::default())
			.await
			.expect("The view should attach.")
			.0
	}

	#[tokio::test]
	async fn attach_seeds_phase_from_the_store() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();

		assert_eq!(attach(&store, &bus).await.phase(), AuthPhase::SignedOut);

		store.save(record()).await.expect("Save should succeed.");

		assert_eq!(attach(&store, &bus).await.phase(), AuthPhase::SignedIn);
	}

	#[tokio::test]
	async fn attach_treats_an_expired_credential_as_signed_out() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();
		let stale = SessionRecord::builder(subject())
			.token("tok123")
			.expires_at(OffsetDateTime::now_utc() - Duration::hours(1))
			.build()
			.expect("Record fixture should be valid.");

		store.save(stale).await.expect("Save should succeed.");

		assert_eq!(attach(&store, &bus).await.phase(), AuthPhase::SignedOut);
		// Seeding observed the expiry, so the slot is already clear.
		assert!(store.fetch().await.expect("Fetch should succeed.").is_none());
	}

	#[tokio::test]
	async fn begin_login_arms_only_from_a_valid_phase() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();

		store.save(record()).await.expect("Save should succeed.");

		let mut signed_in = attach(&store, &bus).await;

		assert!(!signed_in.begin_login(), "A signed-in view has nothing to log in.");
		assert!(!signed_in.login_pending());

		store.clear().await.expect("Clear should succeed.");

		let mut view = attach(&store, &bus).await;

		assert!(view.begin_login());
		assert!(view.login_pending());
		assert_eq!(view.phase(), AuthPhase::Pending);
		// A second call while pending changes nothing.
		assert!(!view.begin_login());
		assert!(view.login_pending());
	}

	#[tokio::test]
	async fn confirmations_converge_detached_views() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();
		let background = ContextId::background();
		let mut popup = attach(&store, &bus).await;
		let mut sidebar = attach(&store, &bus).await;

		bus.publish(&background, SyncMessage::login_state_changed("{}", 1));

		assert!(matches!(popup.turn().await, ViewTurn::Synced(AuthPhase::SignedIn)));
		assert!(matches!(sidebar.turn().await, ViewTurn::Synced(AuthPhase::SignedIn)));

		bus.publish(&background, SyncMessage::logout_state_changed(2));

		assert!(matches!(popup.turn().await, ViewTurn::Synced(AuthPhase::SignedOut)));
		assert!(matches!(sidebar.turn().await, ViewTurn::Synced(AuthPhase::SignedOut)));
	}

	#[tokio::test(start_paused = true)]
	async fn pending_logins_time_out_at_the_deadline() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();
		let mut view = attach(&store, &bus).await;

		assert!(view.begin_login());

		let ViewTurn::TimedOut(err) = view.turn().await else {
			panic!("The deadline should have fired.");
		};

		assert!(
			matches!(err, Error::LoginTimeout { waited } if waited == Duration::seconds(120)),
			"The error should report the configured deadline.",
		);
		assert_eq!(view.phase(), AuthPhase::Failed);
		assert!(!view.login_pending());
		// A failed attempt allows a retry.
		assert!(view.begin_login());
	}

	#[tokio::test(start_paused = true)]
	async fn a_confirmed_login_beats_the_deadline() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();
		let background = ContextId::background();
		let mut view = attach(&store, &bus).await;

		assert!(view.begin_login());

		bus.publish(&background, SyncMessage::login_state_changed("{}", 1));

		assert!(matches!(view.turn().await, ViewTurn::Synced(AuthPhase::SignedIn)));
		assert!(!view.login_pending());

		// Well past the original deadline, the next turn is still driven by
		// the bus alone.
		tokio::time::advance(std::time::Duration::from_secs(600)).await;
		bus.publish(&background, SyncMessage::logout_state_changed(2));

		assert!(matches!(view.turn().await, ViewTurn::Synced(AuthPhase::SignedOut)));
	}

	#[tokio::test(start_paused = true)]
	async fn logout_confirmations_do_not_settle_a_pending_attempt() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();
		let background = ContextId::background();
		let mut view = attach(&store, &bus).await;

		assert!(view.begin_login());

		bus.publish(&background, SyncMessage::logout_state_changed(1));

		assert!(matches!(view.turn().await, ViewTurn::Synced(AuthPhase::Pending)));
		assert!(view.login_pending(), "The deadline must stay armed.");
		assert!(matches!(view.turn().await, ViewTurn::TimedOut(_)));
	}

	#[tokio::test]
	async fn the_watch_feed_tracks_the_phase() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();
		let background = ContextId::background();
		let mut view = attach(&store, &bus).await;
		let phases = view.subscribe_phase();

		assert_eq!(*phases.borrow(), AuthPhase::SignedOut);

		view.begin_login();

		assert_eq!(*phases.borrow(), AuthPhase::Pending);

		bus.publish(&background, SyncMessage::login_state_changed("{}", 1));
		view.turn().await;

		assert_eq!(*phases.borrow(), AuthPhase::SignedIn);
	}

	#[tokio::test]
	async fn views_disconnect_once_the_bus_is_gone() {
		let bus = RelayBus::new();
		let store = MemoryStore::default();
		let mut view = attach(&store, &bus).await;

		drop(bus);

		assert!(matches!(view.turn().await, ViewTurn::Disconnected));
	}
}
