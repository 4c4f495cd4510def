//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	session::SessionRecord,
	store::{CredentialStore, StoreError, StoreFuture},
};

type Slot = Arc<RwLock<Option<SessionRecord>>>;

/// Thread-safe backend that keeps the credential slot in-process for tests and
/// demos. Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	fn fetch_now(slot: Slot) -> Option<SessionRecord> {
		slot.read().clone()
	}

	fn replace_now(slot: Slot, record: SessionRecord) -> Result<(), StoreError> {
		slot.write().replace(record);

		Ok(())
	}

	fn clear_now(slot: Slot) {
		slot.write().take();
	}
}
impl CredentialStore for MemoryStore {
	fn fetch(&self) -> StoreFuture<'_, Option<SessionRecord>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::fetch_now(slot)) })
	}

	fn save(&self, record: SessionRecord) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::replace_now(slot, record) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::clear_now(slot);

			Ok(())
		})
	}
}
