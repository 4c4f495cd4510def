//! In-process fan-out bus connecting relay contexts with provider tabs.

pub mod message;

pub use message::*;

// crates.io
use tokio::sync::{
	broadcast::{self, error::RecvError},
	mpsc::{self, error::TrySendError},
};
use url::Origin;
// self
use crate::{
	_prelude::*,
	ids::{ContextId, TabId},
};

/// Buffered confirmations each subscriber can fall behind by before skipping.
pub const BROADCAST_CAPACITY: usize = 64;
/// Buffered messages per provider tab before further forwards are dropped.
pub const TAB_ENDPOINT_CAPACITY: usize = 16;

#[derive(Clone, Debug)]
struct Envelope {
	sender: ContextId,
	message: SyncMessage,
}

#[derive(Debug)]
struct TabEndpoint {
	tab: TabId,
	origin: Origin,
	sender: mpsc::Sender<SyncMessage>,
}

/// Broadcast channel plus a registry of provider-tab endpoints.
///
/// Clones share the same channel and registry; every context holds a clone.
/// Broadcast delivery is fire and forget: published messages reach whichever
/// subscribers are attached at that moment, and nothing is replayed to late
/// joiners, who query state with an `INIT_LOGIN` instead.
#[derive(Clone, Debug)]
pub struct RelayBus {
	channel: broadcast::Sender<Envelope>,
	tabs: Arc<Mutex<Vec<TabEndpoint>>>,
}
impl RelayBus {
	/// Creates an empty bus.
	pub fn new() -> Self {
		let (channel, _) = broadcast::channel(BROADCAST_CAPACITY);

		Self { channel, tabs: Arc::new(Mutex::new(Vec::new())) }
	}

	/// Attaches a subscriber identified as `context`.
	///
	/// The subscription filters the subscriber's own messages out, so a
	/// context never observes its own publishes.
	pub fn subscribe(&self, context: ContextId) -> BusSubscription {
		BusSubscription { context, receiver: self.channel.subscribe() }
	}

	/// Publishes `message` to every other subscriber.
	///
	/// Delivery is best effort; a bus with no subscribers accepts the message
	/// and drops it.
	pub fn publish(&self, sender: &ContextId, message: SyncMessage) {
		let _ = self.channel.send(Envelope { sender: sender.clone(), message });
	}

	/// Registers a provider tab at `origin` and returns its message feed.
	///
	/// Dropping the receiver detaches the tab on the next forward.
	pub fn attach_tab(&self, tab: TabId, origin: Origin) -> mpsc::Receiver<SyncMessage> {
		let (sender, receiver) = mpsc::channel(TAB_ENDPOINT_CAPACITY);

		self.tabs.lock().push(TabEndpoint { tab, origin, sender });

		receiver
	}

	/// Removes the endpoint registered for `tab`, if any.
	pub fn detach_tab(&self, tab: &TabId) {
		self.tabs.lock().retain(|endpoint| endpoint.tab != *tab);
	}

	/// Forwards `message` to every live tab registered at `origin`.
	///
	/// Endpoints whose receiver was dropped are pruned on the way through;
	/// endpoints with a full buffer keep their place but miss this message.
	/// Returns how many tabs accepted it.
	pub fn forward_to_provider_tabs(&self, origin: &Origin, message: &SyncMessage) -> usize {
		let mut delivered = 0;

		self.tabs.lock().retain(|endpoint| {
			if endpoint.origin != *origin {
				return true;
			}

			match endpoint.sender.try_send(message.clone()) {
				Ok(()) => {
					delivered += 1;

					true
				},
				Err(TrySendError::Full(_)) => true,
				Err(TrySendError::Closed(_)) => false,
			}
		});

		delivered
	}

	/// Number of currently registered provider tabs.
	pub fn tab_count(&self) -> usize {
		self.tabs.lock().len()
	}

	/// Number of currently attached subscribers.
	pub fn subscriber_count(&self) -> usize {
		self.channel.receiver_count()
	}
}
impl Default for RelayBus {
	fn default() -> Self {
		Self::new()
	}
}

/// Receiving side of a bus subscription.
#[derive(Debug)]
pub struct BusSubscription {
	context: ContextId,
	receiver: broadcast::Receiver<Envelope>,
}
impl BusSubscription {
	/// Identity this subscription filters out.
	pub fn context(&self) -> &ContextId {
		&self.context
	}

	/// Waits for the next message published by another context.
	///
	/// Skips the subscriber's own publishes and any stretch of messages lost
	/// to lag. Returns `None` once every [`RelayBus`] clone is gone.
	pub async fn recv(&mut self) -> Option<SyncMessage> {
		loop {
			match self.receiver.recv().await {
				Ok(envelope) =>
					if envelope.sender != self.context {
						return Some(envelope.message);
					},
				Err(RecvError::Lagged(_)) => continue,
				Err(RecvError::Closed) => return None,
			}
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn origin_of(url: &str) -> Origin {
		Url::parse(url).expect("Test URL should parse successfully.").origin()
	}

	fn tab(name: &str) -> TabId {
		TabId::new(name).expect("Tab fixture should be valid.")
	}

	#[tokio::test]
	async fn fanout_skips_the_sender() {
		let bus = RelayBus::new();
		let background = ContextId::background();
		let mut popup = bus.subscribe(ContextId::random());
		let mut sidebar = bus.subscribe(ContextId::random());
		let mut own = bus.subscribe(background.clone());

		bus.publish(&background, SyncMessage::logout_state_changed(7));

		assert_eq!(popup.recv().await, Some(SyncMessage::logout_state_changed(7)));
		assert_eq!(sidebar.recv().await, Some(SyncMessage::logout_state_changed(7)));

		// The background's own copy of message 7 is skipped, so the popup's
		// message 8 is the next thing its subscription yields.
		bus.publish(popup.context(), SyncMessage::logout_state_changed(8));

		assert_eq!(own.recv().await, Some(SyncMessage::logout_state_changed(8)));

		// Likewise the popup never sees message 8; it jumps straight to 9.
		bus.publish(sidebar.context(), SyncMessage::logout_state_changed(9));

		assert_eq!(popup.recv().await, Some(SyncMessage::logout_state_changed(9)));
	}

	#[tokio::test]
	async fn lagged_subscribers_skip_to_live_messages() {
		let bus = RelayBus::new();
		let background = ContextId::background();
		let mut slow = bus.subscribe(ContextId::random());

		for stamp in 0..(BROADCAST_CAPACITY as i64 + 10) {
			bus.publish(&background, SyncMessage::logout_state_changed(stamp));
		}

		let first = slow.recv().await.expect("A lagged subscriber should still receive.");

		assert!(
			first.timestamp() >= 10,
			"Messages lost to lag must be skipped, not replayed: got {}.",
			first.timestamp(),
		);
	}

	#[tokio::test]
	async fn closed_tab_endpoints_are_pruned() {
		let bus = RelayBus::new();
		let origin = origin_of("https://id.example");
		let mut live = bus.attach_tab(tab("tab-1"), origin.clone());
		let dead = bus.attach_tab(tab("tab-2"), origin.clone());

		drop(dead);

		assert_eq!(bus.tab_count(), 2);
		assert_eq!(bus.forward_to_provider_tabs(&origin, &SyncMessage::init_login()), 1);
		assert_eq!(bus.tab_count(), 1);
		assert!(matches!(live.recv().await, Some(SyncMessage::InitLogin { .. })));
	}

	#[tokio::test]
	async fn full_tab_endpoints_keep_their_registration() {
		let bus = RelayBus::new();
		let origin = origin_of("https://id.example");
		let _feed = bus.attach_tab(tab("tab-1"), origin.clone());

		for _ in 0..TAB_ENDPOINT_CAPACITY {
			assert_eq!(bus.forward_to_provider_tabs(&origin, &SyncMessage::init_login()), 1);
		}

		// One over capacity: dropped for now, but the tab stays attached.
		assert_eq!(bus.forward_to_provider_tabs(&origin, &SyncMessage::init_login()), 0);
		assert_eq!(bus.tab_count(), 1);
	}

	#[tokio::test]
	async fn foreign_origins_receive_nothing() {
		let bus = RelayBus::new();
		let trusted = origin_of("https://id.example");
		let mut other = bus.attach_tab(tab("tab-1"), origin_of("https://evil.example"));

		assert_eq!(bus.forward_to_provider_tabs(&trusted, &SyncMessage::init_login()), 0);
		assert!(other.try_recv().is_err());
	}

	#[tokio::test]
	async fn detach_removes_the_endpoint() {
		let bus = RelayBus::new();
		let origin = origin_of("https://id.example");
		let id = tab("tab-1");
		let _feed = bus.attach_tab(id.clone(), origin.clone());

		bus.detach_tab(&id);

		assert_eq!(bus.tab_count(), 0);
		assert_eq!(bus.forward_to_provider_tabs(&origin, &SyncMessage::init_login()), 0);
	}
}
