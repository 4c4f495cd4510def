//! Client-side authentication relay for multi-context runtimes—one credential store, per-context
//! login state machines, and an origin-guarded page bridge kept converged over a typed broadcast
//! bus.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod bridge;
pub mod bus;
pub mod context;
pub mod error;
pub mod http;
pub mod ids;
pub mod machine;
pub mod obs;
pub mod provider;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::HashMap;
	// self
	use crate::{
		bridge::PageSessionStore,
		bus::RelayBus,
		context::{Coordinator, CoordinatorHandle, RelayMetrics},
		provider::{ProviderProfile, RelayConfig},
		store::MemoryStore,
	};

	/// In-memory stand-in for a page's session storage.
	#[derive(Debug, Default)]
	pub struct MemoryPageStore(Mutex<HashMap<String, String>>);
	impl MemoryPageStore {
		/// Reports whether a key is currently present.
		pub fn contains(&self, key: &str) -> bool {
			self.0.lock().contains_key(key)
		}
	}
	impl PageSessionStore for MemoryPageStore {
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

	/// Builds a profile for a fictional provider at `https://id.example` watching the
	/// `app_session` storage key.
	pub fn test_profile() -> ProviderProfile {
		ProviderProfile::builder(Url::parse("https://id.example").expect("URL must be valid."))
			.session_key("app_session")
			.build()
			.expect("Profile must be valid.")
	}

	/// Wires a memory store, a fresh bus, and a spawned coordinator; must be called from within a
	/// tokio runtime.
	pub fn spawn_test_coordinator()
	-> (CoordinatorHandle, Arc<MemoryStore>, RelayBus, Arc<RelayMetrics>) {
		let store = Arc::new(MemoryStore::default());
		let bus = RelayBus::new();
		let coordinator =
			Coordinator::new(store.clone(), bus.clone(), test_profile(), RelayConfig::default());
		let metrics = coordinator.metrics();

		(coordinator.spawn(), store, bus, metrics)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
