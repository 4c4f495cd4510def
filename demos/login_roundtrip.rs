//! Demonstrates a full login round trip: a provider page reports its session
//! through the origin-guarded bridge, the coordinator persists and announces
//! it, and a popup view converges on the new phase.

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use serde_json::json;
use url::Url;
// self
use auth_relay::{
	bridge::{OriginGuard, PageBridge, PageSessionStore, WindowEnvelope},
	bus::RelayBus,
	context::{Coordinator, ViewContext, ViewTurn},
	provider::{ProviderProfile, RelayConfig},
	store::{CredentialStore, MemoryStore},
};

/// Stand-in for a page's session storage.
#[derive(Debug, Default)]
struct PageStorage(Mutex<HashMap<String, String>>);
impl PageSessionStore for PageStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.0.lock().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) {
		self.0.lock().insert(key.to_owned(), value.to_owned());
	}

	fn remove(&self, key: &str) {
		self.0.lock().remove(key);
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let profile = ProviderProfile::builder(Url::parse("https://id.example")?)
		.session_key("app_session")
		.build()?;
	let store = Arc::new(MemoryStore::default());
	let bus = RelayBus::new();
	let coordinator =
		Coordinator::new(store.clone(), bus.clone(), profile.clone(), RelayConfig::default());
	let handle = coordinator.spawn();
	let (mut popup, _phases) = ViewContext::attach(&*store, &bus, RelayConfig::default()).await?;

	println!("Popup attached as {} in phase {}.", popup.context(), popup.phase());

	popup.begin_login();

	println!("Popup marked the attempt pending: {}.", popup.phase());

	// The provider page signs the user in and writes the session key.
	let (bridge, mut reports) =
		PageBridge::install(PageStorage::default(), &profile, "id.example")?;
	let session = json!({
		"data": {
			"user_id": "demo-user",
			"email": "demo-user@example.com",
			"auth_id": "tok-demo",
		}
	})
	.to_string();

	bridge.storage().set(&profile.session_key, &session);

	// The write surfaces as a report, crosses the window boundary, and is
	// vetted against the provider origin before it may touch the relay.
	let report = reports.recv().await.expect("The page write should surface as a report.");
	let envelope = WindowEnvelope::new("https://id.example", serde_json::to_string(&report)?);
	let vetted = OriginGuard::new(&profile).accept(&envelope)?;

	handle.relay_report(vetted).await?;

	match popup.turn().await {
		ViewTurn::Synced(phase) => println!("Popup converged on {phase}."),
		other => println!("Popup turn ended unexpectedly: {other:?}."),
	}

	let snapshot = handle.init_login().await?;

	println!("Coordinator snapshot reports logged in: {}.", snapshot.is_logged_in);

	// Logging out on the page flows through the same pipeline.
	bridge.storage().remove(&profile.session_key);

	let logout = reports.recv().await.expect("The removal should surface as a report.");

	handle.relay_report(logout).await?;

	match popup.turn().await {
		ViewTurn::Synced(phase) => println!("Popup converged on {phase}."),
		other => println!("Popup turn ended unexpectedly: {other:?}."),
	}

	assert!(store.fetch().await?.is_none());

	println!("The credential slot is empty again.");

	Ok(())
}
