//! Background authority over the credential store.

mod metrics;

pub use metrics::RelayMetrics;

// crates.io
use tokio::sync::{mpsc, oneshot};
// self
use crate::{
	_prelude::*,
	bus::{LoginSnapshot, RelayBus, SyncMessage},
	ids::ContextId,
	obs::{self, SyncKind, SyncOutcome, SyncSpan},
	provider::{ProviderProfile, RelayConfig},
	session::parse_login_payload,
	store::{CredentialStore, StoreError},
};

const MAILBOX_CAPACITY: usize = 32;

/// Coordinates credential changes for every other context.
///
/// Exactly one coordinator runs per relay. It is the only writer of the
/// credential store: pages and views report what they observed, the
/// coordinator validates and persists the outcome, then announces it on the
/// bus so every context converges on the same state. With a single slot and
/// a single writer, concurrent reports resolve to last write wins.
pub struct Coordinator {
	/// Credential store this coordinator guards.
	pub store: Arc<dyn CredentialStore>,
	/// Bus used to announce confirmed state changes.
	pub bus: RelayBus,
	/// Provider whose sessions are relayed.
	pub profile: ProviderProfile,
	/// Tunables for deadlines and credential freshness.
	pub config: RelayConfig,
	context: ContextId,
	metrics: Arc<RelayMetrics>,
	write_guard: AsyncMutex<()>,
}
impl Coordinator {
	/// Creates a coordinator over the given store, bus, and provider.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		bus: RelayBus,
		profile: ProviderProfile,
		config: RelayConfig,
	) -> Self {
		Self {
			store,
			bus,
			profile,
			config,
			context: ContextId::background(),
			metrics: Default::default(),
			write_guard: AsyncMutex::new(()),
		}
	}

	/// Shared counters updated by every coordinator operation.
	pub fn metrics(&self) -> Arc<RelayMetrics> {
		self.metrics.clone()
	}

	/// Persists a reported login and announces it.
	///
	/// The raw payload is parsed and validated first; a malformed report is
	/// refused without touching the store or the bus. `observed_at` is the
	/// epoch-millisecond timestamp of the originating observation and rides
	/// along on the announcement unchanged.
	pub async fn report_login(&self, data: &str, observed_at: i64) -> Result<()> {
		const KIND: SyncKind = SyncKind::Login;

		let span = SyncSpan::new(KIND, "report_login");

		obs::record_sync_outcome(KIND, SyncOutcome::Attempt);

		let result = span
			.instrument(async move {
				let record = parse_login_payload(data).inspect_err(|_| {
					self.metrics.record_rejected_payload();
				})?;
				let _write = self.write_guard.lock().await;

				self.store.save(record).await?;
				self.bus
					.publish(&self.context, SyncMessage::login_state_changed(data, observed_at));
				self.metrics.record_login();

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_sync_outcome(KIND, SyncOutcome::Success),
			Err(Error::Payload(_)) => obs::record_sync_outcome(KIND, SyncOutcome::Rejected),
			Err(_) => obs::record_sync_outcome(KIND, SyncOutcome::Failure),
		}

		result
	}

	/// Clears the stored credential and announces the logout.
	///
	/// Clearing an already-empty slot still announces, so views that missed
	/// earlier confirmations converge on signed-out.
	pub async fn report_logout(&self, observed_at: i64) -> Result<()> {
		const KIND: SyncKind = SyncKind::Logout;

		let span = SyncSpan::new(KIND, "report_logout");

		obs::record_sync_outcome(KIND, SyncOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _write = self.write_guard.lock().await;

				self.store.clear().await?;
				self.bus.publish(&self.context, SyncMessage::logout_state_changed(observed_at));
				self.metrics.record_logout();

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_sync_outcome(KIND, SyncOutcome::Success),
			Err(_) => obs::record_sync_outcome(KIND, SyncOutcome::Failure),
		}

		result
	}

	/// Answers a status query and nudges provider tabs to re-announce.
	///
	/// The query is forwarded to every registered provider tab so a page
	/// holding a live session re-reports it, which rebuilds relay state after
	/// a restart. The returned snapshot reflects the store as of now.
	pub async fn init_login(&self) -> Result<LoginSnapshot> {
		const KIND: SyncKind = SyncKind::InitLogin;

		let span = SyncSpan::new(KIND, "init_login");

		obs::record_sync_outcome(KIND, SyncOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.bus.forward_to_provider_tabs(
					&self.profile.trusted_origin(),
					&SyncMessage::init_login(),
				);

				let is_logged_in = self
					.store
					.is_authenticated(self.config.freshness, OffsetDateTime::now_utc())
					.await?;

				Ok(LoginSnapshot { is_logged_in })
			})
			.await;

		match &result {
			Ok(_) => obs::record_sync_outcome(KIND, SyncOutcome::Success),
			Err(_) => obs::record_sync_outcome(KIND, SyncOutcome::Failure),
		}

		result
	}

	/// Evaluates whether the stored credential is inside the refresh window.
	///
	/// Raises a refresh demand when it is. Obtaining a new credential is the
	/// application's job; the renewed session then flows back in through the
	/// ordinary login report path.
	pub async fn refresh_requested(&self) -> Result<bool> {
		const KIND: SyncKind = SyncKind::Refresh;

		let span = SyncSpan::new(KIND, "refresh_requested");

		obs::record_sync_outcome(KIND, SyncOutcome::Attempt);

		let result = span
			.instrument(async move {
				let due = self
					.store
					.needs_refresh(self.config.freshness, OffsetDateTime::now_utc())
					.await?;

				if due {
					self.metrics.record_refresh_demand();
				}

				Ok(due)
			})
			.await;

		match &result {
			Ok(_) => obs::record_sync_outcome(KIND, SyncOutcome::Success),
			Err(_) => obs::record_sync_outcome(KIND, SyncOutcome::Failure),
		}

		result
	}

	/// Moves the coordinator onto a background task and returns a handle.
	///
	/// The task serves directives in arrival order until every handle clone
	/// is dropped.
	pub fn spawn(self) -> CoordinatorHandle {
		let (directives, mut mailbox) = mpsc::channel(MAILBOX_CAPACITY);

		tokio::spawn(async move {
			while let Some(directive) = mailbox.recv().await {
				self.serve(directive).await;
			}
		});

		CoordinatorHandle { directives }
	}

	async fn serve(&self, directive: Directive) {
		match directive {
			Directive::ReportLogin { data, observed_at, reply } => {
				let _ = reply.send(self.report_login(&data, observed_at).await);
			},
			Directive::ReportLogout { observed_at, reply } => {
				let _ = reply.send(self.report_logout(observed_at).await);
			},
			Directive::InitLogin { reply } => {
				let _ = reply.send(self.init_login().await);
			},
			Directive::RefreshRequested => {
				let _ = self.refresh_requested().await;
			},
		}
	}
}
impl Debug for Coordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Coordinator")
			.field("profile", &self.profile)
			.field("config", &self.config)
			.field("context", &self.context)
			.finish()
	}
}

enum Directive {
	ReportLogin { data: String, observed_at: i64, reply: oneshot::Sender<Result<()>> },
	ReportLogout { observed_at: i64, reply: oneshot::Sender<Result<()>> },
	InitLogin { reply: oneshot::Sender<Result<LoginSnapshot>> },
	RefreshRequested,
}

/// Cloneable handle to a spawned [`Coordinator`].
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
	directives: mpsc::Sender<Directive>,
}
impl CoordinatorHandle {
	/// Persists a reported login and announces it.
	pub async fn report_login(&self, data: impl Into<String>, observed_at: i64) -> Result<()> {
		let (reply, response) = oneshot::channel();

		self.send(Directive::ReportLogin { data: data.into(), observed_at, reply }).await?;

		response.await.map_err(|_| coordinator_gone())?
	}

	/// Clears the stored credential and announces the logout.
	pub async fn report_logout(&self, observed_at: i64) -> Result<()> {
		let (reply, response) = oneshot::channel();

		self.send(Directive::ReportLogout { observed_at, reply }).await?;

		response.await.map_err(|_| coordinator_gone())?
	}

	/// Queries whether a usable credential is stored and nudges provider tabs.
	pub async fn init_login(&self) -> Result<LoginSnapshot> {
		let (reply, response) = oneshot::channel();

		self.send(Directive::InitLogin { reply }).await?;

		response.await.map_err(|_| coordinator_gone())?
	}

	/// Routes a page-boundary message to the matching coordinator operation.
	///
	/// Only reports are routed. Confirmations and queries pass through
	/// untouched, since those are the coordinator's own output.
	pub async fn relay_report(&self, message: SyncMessage) -> Result<()> {
		match message {
			SyncMessage::Login { data, timestamp } => self.report_login(data, timestamp).await,
			SyncMessage::Logout { timestamp } => self.report_logout(timestamp).await,
			_ => Ok(()),
		}
	}

	/// Asks the coordinator to evaluate the refresh window soon.
	///
	/// Fire and forget: a full or closed mailbox drops the request, and the
	/// next caller raises it again.
	pub fn request_refresh(&self) {
		let _ = self.directives.try_send(Directive::RefreshRequested);
	}

	async fn send(&self, directive: Directive) -> Result<()> {
		self.directives.send(directive).await.map_err(|_| coordinator_gone())
	}
}

fn coordinator_gone() -> Error {
	StoreError::Unavailable { message: "the coordinator task is no longer running".into() }.into()
}
