//! Storage contracts and built-in stores for the credential slot.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	session::{FreshnessPolicy, SessionRecord, TokenFreshness},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the single credential slot shared by all contexts.
///
/// Backends guarantee atomic reads and writes of the slot as a whole.
/// Read-modify-write sequences are not transactional: concurrent writers
/// resolve as last-write-wins, which is the accepted behavior for a
/// single-user credential.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the stored record, if any. Backends treat malformed persisted
	/// state as absent rather than erroring.
	fn fetch(&self) -> StoreFuture<'_, Option<SessionRecord>>;

	/// Persists or replaces the record.
	fn save(&self, record: SessionRecord) -> StoreFuture<'_, ()>;

	/// Removes the record. Clearing an empty slot is a no-op.
	fn clear(&self) -> StoreFuture<'_, ()>;

	/// Fetches the record, lazily clearing the slot when the policy reports it
	/// expired; expiry is observed at read time, never by a background sweep.
	fn fetch_fresh(
		&self,
		policy: FreshnessPolicy,
		now: OffsetDateTime,
	) -> StoreFuture<'_, Option<SessionRecord>> {
		Box::pin(async move {
			let Some(record) = self.fetch().await? else { return Ok(None) };

			match policy.classify(&record, now) {
				TokenFreshness::Expired => {
					self.clear().await?;

					Ok(None)
				},
				_ => Ok(Some(record)),
			}
		})
	}

	/// Reports whether a usable (present and unexpired) credential exists.
	fn is_authenticated(&self, policy: FreshnessPolicy, now: OffsetDateTime) -> StoreFuture<'_, bool> {
		Box::pin(async move { Ok(self.fetch_fresh(policy, now).await?.is_some()) })
	}

	/// Reports whether a usable credential sits inside the policy's refresh
	/// window.
	fn needs_refresh(&self, policy: FreshnessPolicy, now: OffsetDateTime) -> StoreFuture<'_, bool> {
		Box::pin(async move {
			let Some(record) = self.fetch_fresh(policy, now).await? else { return Ok(false) };

			Ok(matches!(policy.classify(&record, now), TokenFreshness::NeedsRefresh))
		})
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// The persistence layer rejected the operation; callers must treat the
	/// slot as unchanged.
	#[error("Storage unavailable: {message}.")]
	Unavailable {
		/// Human-readable error payload.
		message: String,
	},
}
