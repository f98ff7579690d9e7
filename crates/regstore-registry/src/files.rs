use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use regstore_crypto::ContentHasher;
use regstore_events::{EventKey, EventKind, EventPayload, RegistryEvent};
use regstore_guard::{Action, Operation};
use regstore_store::{IndexedStore, StoreError};
use regstore_types::{AccountId, FileKey, FilePayload, RegistryKind, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::RegistryContext;
use crate::error::{RegistryError, RegistryResult};
use crate::view::{FileColumns, FileEntry};

/// Persistable state of a [`FileRegistry`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// Sequence number of the last event published.
    pub event_seq: u64,
    pub files: IndexedStore<FileKey, FilePayload>,
}

/// Registry of content locators keyed by the hash of their path.
pub struct FileRegistry {
    ctx: RegistryContext,
    state: RwLock<FileSnapshot>,
}

impl FileRegistry {
    pub fn new(ctx: RegistryContext) -> Self {
        Self {
            ctx,
            state: RwLock::new(FileSnapshot::default()),
        }
    }

    /// Resume from persisted state.
    ///
    /// Every record must sit under the key its path hashes to.
    pub fn from_snapshot(ctx: RegistryContext, snapshot: FileSnapshot) -> RegistryResult<Self> {
        snapshot.files.check_integrity()?;
        for record in snapshot.files.iter() {
            if Self::key_for_path(&record.payload.path) != record.key {
                return Err(RegistryError::Store(StoreError::IntegrityViolation(
                    format!(
                        "file {} is not keyed by its path {:?}",
                        record.key, record.payload.path
                    ),
                )));
            }
        }
        Ok(Self {
            ctx,
            state: RwLock::new(snapshot),
        })
    }

    pub fn context(&self) -> &RegistryContext {
        &self.ctx
    }

    /// The key a file at `path` is stored under.
    ///
    /// The path is hashed exactly as given; no normalization is applied.
    pub fn key_for_path(path: &str) -> FileKey {
        ContentHasher::PATH.hash_path(path)
    }

    // ---- Mutations ----

    /// Register a file at `path`. Fails if that path is already live.
    pub fn create_file(
        &self,
        caller: &AccountId,
        path: impl Into<String>,
        locator: impl Into<String>,
        metadata: impl Into<String>,
    ) -> RegistryResult<FileKey> {
        self.ctx.authorize(caller, action(Operation::Create))?;
        let payload = FilePayload::new(path, locator, metadata);
        if payload.locator.is_empty() {
            return Err(RegistryError::EmptyLocator);
        }
        let key = Self::key_for_path(&payload.path);

        let mut state = self.write()?;
        let now = self.ctx.now();
        state.files.insert(key, payload.clone(), now)?;

        self.emit(&mut state, EventKind::FileCreated, key, now, EventPayload::File(payload));
        debug!(key = %key.short_hex(), count = state.files.count(), "file created");
        Ok(key)
    }

    /// Replace a file's locator and metadata. The path is unchanged.
    pub fn update_file(
        &self,
        caller: &AccountId,
        key: &FileKey,
        locator: impl Into<String>,
        metadata: impl Into<String>,
    ) -> RegistryResult<()> {
        self.ctx.authorize(caller, action(Operation::Update))?;
        let locator = locator.into();
        if locator.is_empty() {
            return Err(RegistryError::EmptyLocator);
        }

        let mut state = self.write()?;
        let path = state.files.get(key)?.payload.path.clone();
        let payload = FilePayload::new(path, locator, metadata);
        let now = self.ctx.now();
        state.files.update(key, payload.clone(), now)?;

        self.emit(&mut state, EventKind::FileUpdated, *key, now, EventPayload::File(payload));
        debug!(key = %key.short_hex(), "file updated");
        Ok(())
    }

    /// Delete a file. Its path may be created again later.
    pub fn delete_file(&self, caller: &AccountId, key: &FileKey) -> RegistryResult<()> {
        self.ctx.authorize(caller, action(Operation::Delete))?;

        let mut state = self.write()?;
        let now = self.ctx.now();
        state.files.remove(key)?;

        self.emit(&mut state, EventKind::FileDeleted, *key, now, EventPayload::Removed);
        debug!(key = %key.short_hex(), count = state.files.count(), "file deleted");
        Ok(())
    }

    // ---- Reads ----

    pub fn read_file(&self, key: &FileKey) -> RegistryResult<FileEntry> {
        let state = self.read()?;
        Ok(FileEntry::from(state.files.get(key)?))
    }

    pub fn file_count(&self) -> RegistryResult<usize> {
        Ok(self.read()?.files.count())
    }

    pub fn file_key_at(&self, index: usize) -> RegistryResult<FileKey> {
        Ok(*self.read()?.files.key_at(index)?)
    }

    pub fn file_at(&self, index: usize) -> RegistryResult<FileEntry> {
        let state = self.read()?;
        Ok(FileEntry::from(state.files.record_at(index)?))
    }

    /// Every live key in enumeration order.
    pub fn all_file_keys(&self) -> RegistryResult<Vec<FileKey>> {
        Ok(self.read()?.files.all_keys())
    }

    /// Read several files at once. Fails without a result if any key is
    /// missing.
    pub fn read_files(&self, keys: &[FileKey]) -> RegistryResult<FileColumns> {
        let state = self.read()?;
        Ok(state.files.batch_get(keys)?.into_iter().collect())
    }

    pub fn read_all_files(&self) -> RegistryResult<FileColumns> {
        let state = self.read()?;
        Ok(state.files.records().into_iter().collect())
    }

    /// Files at positions `[offset, offset + limit)`, as columns.
    pub fn files_by_page(&self, offset: usize, limit: usize) -> RegistryResult<FileColumns> {
        let state = self.read()?;
        Ok(state.files.page(offset, limit).into_iter().collect())
    }

    /// Same range as [`files_by_page`](Self::files_by_page), one row per file.
    pub fn list_files(&self, offset: usize, limit: usize) -> RegistryResult<Vec<FileEntry>> {
        let state = self.read()?;
        Ok(state
            .files
            .page(offset, limit)
            .into_iter()
            .map(FileEntry::from)
            .collect())
    }

    pub fn check_integrity(&self) -> RegistryResult<()> {
        Ok(self.read()?.files.check_integrity()?)
    }

    pub fn snapshot(&self) -> RegistryResult<FileSnapshot> {
        Ok(self.read()?.clone())
    }

    // ---- Internals ----

    fn emit(
        &self,
        state: &mut FileSnapshot,
        kind: EventKind,
        key: FileKey,
        at: Timestamp,
        payload: EventPayload,
    ) {
        state.event_seq += 1;
        let event = RegistryEvent::new(state.event_seq, kind, EventKey::File(key), at, payload);
        self.ctx.publish(&event);
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, FileSnapshot>> {
        self.state
            .read()
            .map_err(|e| RegistryError::Poisoned(format!("file registry: {e}")))
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, FileSnapshot>> {
        self.state
            .write()
            .map_err(|e| RegistryError::Poisoned(format!("file registry: {e}")))
    }
}

fn action(operation: Operation) -> Action {
    Action::new(RegistryKind::Files, operation)
}
