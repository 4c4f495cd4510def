//! Session-storage monitoring on provider pages.

// crates.io
use tokio::sync::mpsc;
// self
use crate::{bridge::BridgeError, bus::SyncMessage, provider::ProviderProfile};

const SIGNAL_CAPACITY: usize = 16;

/// Synchronous session-storage surface of a provider page.
///
/// Implementations mirror the page's own storage API: string keys, string
/// values, last write wins.
pub trait PageSessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get(&self, key: &str) -> Option<String>;

	/// Writes `value` under `key`, replacing any previous value.
	fn set(&self, key: &str, value: &str);

	/// Deletes `key` if present.
	fn remove(&self, key: &str);
}

/// Storage wrapper that reports session-key changes.
///
/// Reads and writes pass straight through to the wrapped store; writes and
/// removals of the watched key additionally emit a login or logout report on
/// the signal channel. Reporting is best effort: when the channel is full or
/// closed the storage operation still completes.
#[derive(Debug)]
pub struct ObservedStore<S> {
	inner: S,
	watched_key: String,
	signals: mpsc::Sender<SyncMessage>,
}
impl<S> ObservedStore<S>
where
	S: PageSessionStore,
{
	/// Key whose changes are reported.
	pub fn watched_key(&self) -> &str {
		&self.watched_key
	}
}
impl<S> PageSessionStore for ObservedStore<S>
where
	S: PageSessionStore,
{
	fn get(&self, key: &str) -> Option<String> {
		self.inner.get(key)
	}

	fn set(&self, key: &str, value: &str) {
		self.inner.set(key, value);

		if key == self.watched_key {
			let _ = self.signals.try_send(SyncMessage::login(value));
		}
	}

	fn remove(&self, key: &str) {
		self.inner.remove(key);

		if key == self.watched_key {
			let _ = self.signals.try_send(SyncMessage::logout());
		}
	}
}

/// Page-side endpoint pairing an observed storage with mirror handling.
///
/// Install one per provider page. The bridge hands the page an
/// [`ObservedStore`] to use as its session storage and a receiver carrying
/// the reports observed there; confirmations coming back from the relay are
/// applied to the same storage without being re-reported.
#[derive(Debug)]
pub struct PageBridge<S> {
	observed: ObservedStore<S>,
}
impl<S> PageBridge<S>
where
	S: PageSessionStore,
{
	/// Installs the bridge over a page's storage.
	///
	/// Refuses pages whose host is not the provider's; host comparison is
	/// ASCII-case-insensitive. Returns the bridge and its report feed.
	pub fn install(
		store: S,
		profile: &ProviderProfile,
		page_host: &str,
	) -> Result<(Self, mpsc::Receiver<SyncMessage>), BridgeError> {
		if !profile.host().eq_ignore_ascii_case(page_host) {
			return Err(BridgeError::UnexpectedHost { host: page_host.to_owned() });
		}

		let (signals, reports) = mpsc::channel(SIGNAL_CAPACITY);
		let observed =
			ObservedStore { inner: store, watched_key: profile.session_key.clone(), signals };

		Ok((Self { observed }, reports))
	}

	/// Storage surface the page should use in place of its own.
	pub fn storage(&self) -> &ObservedStore<S> {
		&self.observed
	}

	/// Applies a message from the relay to the page's storage.
	///
	/// Mirrored confirmations go to the wrapped store directly so they are
	/// not reported back as fresh logins. An `INIT_LOGIN` query re-announces
	/// the stored session, if any, which lets a relay that lost its state
	/// recover it from the page.
	pub fn apply(&self, message: &SyncMessage) {
		match message {
			SyncMessage::LoginStateChanged { data, .. } => {
				self.observed.inner.set(&self.observed.watched_key, data);
			},
			SyncMessage::LogoutStateChanged { .. } => {
				self.observed.inner.remove(&self.observed.watched_key);
			},
			SyncMessage::InitLogin { .. } => {
				if let Some(data) = self.observed.inner.get(&self.observed.watched_key) {
					let _ = self.observed.signals.try_send(SyncMessage::login(data));
				}
			},
			// Reports travel from pages to the relay, never back.
			SyncMessage::Login { .. } | SyncMessage::Logout { .. } => {},
		}
	}
}
