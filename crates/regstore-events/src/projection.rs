use std::collections::BTreeMap;

use regstore_store::IndexedStore;
use regstore_types::{FileKey, FilePayload, PostId, PostPayload, RegistryKind};
use tracing::trace;

use crate::error::{ProjectionError, ProjectionResult};
use crate::event::{EventKey, EventKind, EventPayload, RegistryEvent};

/// Post and file state rebuilt purely from events.
///
/// Applying a registry's full event stream in order reproduces its records,
/// timestamps and enumeration order, because the projection performs the
/// same store operations the registry did.
#[derive(Clone, Debug, Default)]
pub struct RegistryProjection {
    posts: IndexedStore<PostId, PostPayload>,
    files: IndexedStore<FileKey, FilePayload>,
    last_seq: BTreeMap<RegistryKind, u64>,
}

impl RegistryProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a projection from a complete event stream.
    pub fn replay<'a>(
        events: impl IntoIterator<Item = &'a RegistryEvent>,
    ) -> ProjectionResult<Self> {
        let mut projection = Self::new();
        for event in events {
            projection.apply(event)?;
        }
        Ok(projection)
    }

    /// Apply one event.
    ///
    /// The event must verify and must carry the next sequence number for its
    /// registry. On error the projection is unchanged.
    pub fn apply(&mut self, event: &RegistryEvent) -> ProjectionResult<()> {
        if !event.verify() {
            return Err(ProjectionError::Integrity { id: event.id });
        }

        let registry = event.registry();
        let expected = self.last_seq(registry) + 1;
        if event.seq != expected {
            return Err(ProjectionError::OutOfOrder {
                registry,
                expected,
                actual: event.seq,
            });
        }

        let at = event.timestamp;
        match (event.kind, &event.key, &event.payload) {
            (EventKind::PostCreated, EventKey::Post(id), EventPayload::Post(p)) => {
                self.posts.insert(*id, p.clone(), at)?;
            }
            (EventKind::PostUpdated, EventKey::Post(id), EventPayload::Post(p)) => {
                self.posts.update(id, p.clone(), at)?;
            }
            (EventKind::PostDeleted, EventKey::Post(id), EventPayload::Removed) => {
                self.posts.remove(id)?;
            }
            (EventKind::FileCreated, EventKey::File(key), EventPayload::File(f)) => {
                self.files.insert(*key, f.clone(), at)?;
            }
            (EventKind::FileUpdated, EventKey::File(key), EventPayload::File(f)) => {
                self.files.update(key, f.clone(), at)?;
            }
            (EventKind::FileDeleted, EventKey::File(key), EventPayload::Removed) => {
                self.files.remove(key)?;
            }
            (kind, key, _) => {
                return Err(ProjectionError::Malformed {
                    id: event.id,
                    reason: format!("{kind} does not fit key {key} and its payload"),
                });
            }
        }

        self.last_seq.insert(registry, event.seq);
        trace!(seq = event.seq, kind = %event.kind, key = %event.key, "projected event");
        Ok(())
    }

    pub fn posts(&self) -> &IndexedStore<PostId, PostPayload> {
        &self.posts
    }

    pub fn files(&self) -> &IndexedStore<FileKey, FilePayload> {
        &self.files
    }

    /// Sequence number of the last applied event from `registry`, or 0.
    pub fn last_seq(&self, registry: RegistryKind) -> u64 {
        self.last_seq.get(&registry).copied().unwrap_or(0)
    }
}
