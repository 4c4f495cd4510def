//! Simple file-backed [`CredentialStore`] for elevated-privilege storage.
//!
//! Models the runtime's privileged storage area: the snapshot lives outside
//! any page-reachable surface and only validated records are ever written to
//! it. The slot is loaded once at open time and served from memory afterwards.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	session::SessionRecord,
	store::{CredentialStore, StoreError, StoreFuture},
};

/// Persists the credential slot to a JSON snapshot after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	slot: Arc<RwLock<Option<SessionRecord>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading the
	/// existing snapshot. A malformed snapshot reads as an empty slot and is
	/// dropped from disk.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, slot: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<Option<SessionRecord>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let metadata = path.metadata().map_err(|e| StoreError::Unavailable {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Unavailable {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		match serde_json::from_slice(&bytes) {
			Ok(record) => Ok(Some(record)),
			Err(_) => {
				// Unparseable snapshots read as an empty slot; drop the stale file.
				let _ = fs::remove_file(path);

				Ok(None)
			},
		}
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	// Callers update the in-memory slot only after this returns Ok.
	fn persist(&self, contents: Option<&SessionRecord>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let Some(record) = contents else {
			return match fs::remove_file(&self.path) {
				Ok(()) => Ok(()),
				Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
				Err(e) => Err(StoreError::Unavailable {
					message: format!("Failed to remove {}: {e}", self.path.display()),
				}),
			};
		};
		let serialized =
			serde_json::to_vec_pretty(record).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Unavailable {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Unavailable {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Unavailable {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Unavailable {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl CredentialStore for FileStore {
	fn fetch(&self) -> StoreFuture<'_, Option<SessionRecord>> {
		Box::pin(async move { Ok(self.slot.read().clone()) })
	}

	fn save(&self, record: SessionRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.slot.write();

			self.persist(Some(&record))?;
			*guard = Some(record);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.slot.write();

			self.persist(None)?;
			*guard = None;

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::ids::SubjectId;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"auth_relay_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_record() -> SessionRecord {
		SessionRecord::builder(SubjectId::new("u1").expect("Failed to build subject fixture."))
			.email("a@b.com")
			.token("tok123")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Failed to build file-store test record.")
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let record = build_record();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(record.clone()))
			.expect("Failed to save fixture record to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.fetch())
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched, record);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_snapshot_reads_as_absent() {
		let path = temp_path();

		fs::write(&path, b"{ not json").expect("Failed to plant the corrupt snapshot.");

		let store = FileStore::open(&path).expect("Opening a corrupt snapshot should not error.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let fetched = rt.block_on(store.fetch()).expect("Fetch should succeed.");

		assert!(fetched.is_none(), "Corrupt snapshots must read as an empty slot.");
		assert!(!path.exists(), "Corrupt snapshots should be dropped from disk.");
	}

	#[test]
	fn clear_removes_the_snapshot_idempotently() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(build_record())).expect("Failed to save fixture record.");

		assert!(path.exists(), "Saving must materialize the snapshot.");

		rt.block_on(store.clear()).expect("Failed to clear the slot.");

		assert!(!path.exists(), "Clearing must remove the snapshot.");

		rt.block_on(store.clear()).expect("Clearing an empty slot must stay a no-op.");
	}
}
