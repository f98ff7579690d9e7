use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use regstore_events::{EventKey, EventKind, EventPayload, RegistryEvent};
use regstore_guard::{Action, Operation};
use regstore_store::{IndexedStore, StoreError};
use regstore_types::{AccountId, PostId, PostPayload, RegistryKind, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::RegistryContext;
use crate::error::{RegistryError, RegistryResult};
use crate::view::{Post, PostColumns};

/// Persistable state of a [`PostRegistry`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PostSnapshot {
    /// The id the next create will receive.
    pub next_id: PostId,
    /// Sequence number of the last event published.
    pub event_seq: u64,
    pub posts: IndexedStore<PostId, PostPayload>,
}

/// Registry of titled posts keyed by sequential ids.
pub struct PostRegistry {
    ctx: RegistryContext,
    state: RwLock<PostSnapshot>,
}

impl PostRegistry {
    pub fn new(ctx: RegistryContext) -> Self {
        Self {
            ctx,
            state: RwLock::new(PostSnapshot::default()),
        }
    }

    /// Resume from persisted state.
    ///
    /// Fails if the store is inconsistent or if any live id is not below
    /// `next_id`, since that would let a future create collide with it.
    pub fn from_snapshot(ctx: RegistryContext, snapshot: PostSnapshot) -> RegistryResult<Self> {
        snapshot.posts.check_integrity()?;
        if let Some(id) = snapshot.posts.keys().iter().find(|id| **id >= snapshot.next_id) {
            return Err(RegistryError::Store(StoreError::IntegrityViolation(format!(
                "post {id} is not below next id {}",
                snapshot.next_id
            ))));
        }
        Ok(Self {
            ctx,
            state: RwLock::new(snapshot),
        })
    }

    pub fn context(&self) -> &RegistryContext {
        &self.ctx
    }

    // ---- Mutations ----

    /// Create a post under the next id.
    pub fn create_post(
        &self,
        caller: &AccountId,
        title: impl Into<String>,
        locator: impl Into<String>,
    ) -> RegistryResult<PostId> {
        self.ctx.authorize(caller, action(Operation::Create))?;
        let payload = PostPayload::new(title, locator);

        let mut state = self.write()?;
        let id = state.next_id;
        let next = id.next().ok_or(RegistryError::IdsExhausted { last: id })?;
        let now = self.ctx.now();
        state.posts.insert(id, payload.clone(), now)?;
        state.next_id = next;

        self.emit(&mut state, EventKind::PostCreated, id, now, EventPayload::Post(payload));
        debug!(id = %id, count = state.posts.count(), "post created");
        Ok(id)
    }

    /// Replace a post's title and locator.
    pub fn update_post(
        &self,
        caller: &AccountId,
        id: PostId,
        title: impl Into<String>,
        locator: impl Into<String>,
    ) -> RegistryResult<()> {
        self.ctx.authorize(caller, action(Operation::Update))?;
        let payload = PostPayload::new(title, locator);

        let mut state = self.write()?;
        let now = self.ctx.now();
        state.posts.update(&id, payload.clone(), now)?;

        self.emit(&mut state, EventKind::PostUpdated, id, now, EventPayload::Post(payload));
        debug!(id = %id, "post updated");
        Ok(())
    }

    /// Delete a post. Its id is never handed out again.
    pub fn delete_post(&self, caller: &AccountId, id: PostId) -> RegistryResult<()> {
        self.ctx.authorize(caller, action(Operation::Delete))?;

        let mut state = self.write()?;
        let now = self.ctx.now();
        state.posts.remove(&id)?;

        self.emit(&mut state, EventKind::PostDeleted, id, now, EventPayload::Removed);
        debug!(id = %id, count = state.posts.count(), "post deleted");
        Ok(())
    }

    // ---- Reads ----

    pub fn get_post(&self, id: PostId) -> RegistryResult<Post> {
        let state = self.read()?;
        Ok(Post::from(state.posts.get(&id)?))
    }

    pub fn post_count(&self) -> RegistryResult<usize> {
        Ok(self.read()?.posts.count())
    }

    /// Posts at positions `[offset, offset + limit)`, as columns.
    ///
    /// Never fails on range: an offset past the end yields empty columns.
    pub fn posts_by_page(&self, offset: usize, limit: usize) -> RegistryResult<PostColumns> {
        let state = self.read()?;
        Ok(state.posts.page(offset, limit).into_iter().collect())
    }

    /// Same range as [`posts_by_page`](Self::posts_by_page), one row per post.
    pub fn list_posts(&self, offset: usize, limit: usize) -> RegistryResult<Vec<Post>> {
        let state = self.read()?;
        Ok(state.posts.page(offset, limit).into_iter().map(Post::from).collect())
    }

    pub fn all_post_ids(&self) -> RegistryResult<Vec<PostId>> {
        Ok(self.read()?.posts.all_keys())
    }

    /// The id the next successful create will receive.
    pub fn next_id(&self) -> RegistryResult<PostId> {
        Ok(self.read()?.next_id)
    }

    pub fn check_integrity(&self) -> RegistryResult<()> {
        Ok(self.read()?.posts.check_integrity()?)
    }

    pub fn snapshot(&self) -> RegistryResult<PostSnapshot> {
        Ok(self.read()?.clone())
    }

    // ---- Internals ----

    fn emit(
        &self,
        state: &mut PostSnapshot,
        kind: EventKind,
        id: PostId,
        at: Timestamp,
        payload: EventPayload,
    ) {
        state.event_seq += 1;
        let event = RegistryEvent::new(state.event_seq, kind, EventKey::Post(id), at, payload);
        self.ctx.publish(&event);
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, PostSnapshot>> {
        self.state
            .read()
            .map_err(|e| RegistryError::Poisoned(format!("post registry: {e}")))
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, PostSnapshot>> {
        self.state
            .write()
            .map_err(|e| RegistryError::Poisoned(format!("post registry: {e}")))
    }
}

fn action(operation: Operation) -> Action {
    Action::new(RegistryKind::Posts, operation)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use regstore_events::{InMemoryEventLog, RegistryProjection};
    use regstore_guard::AdminGuard;
    use regstore_types::ManualClock;

    use super::*;

    struct Harness {
        admin: AccountId,
        clock: Arc<ManualClock>,
        log: Arc<InMemoryEventLog>,
        registry: PostRegistry,
    }

    fn harness() -> Harness {
        let admin = AccountId::from_label("admin");
        let clock = Arc::new(ManualClock::new(Timestamp(1_000)));
        let log = Arc::new(InMemoryEventLog::new());
        let ctx = RegistryContext::new(Arc::new(AdminGuard::new(admin.clone())))
            .with_clock(clock.clone())
            .with_sink(log.clone());
        Harness {
            admin,
            clock,
            log,
            registry: PostRegistry::new(ctx),
        }
    }

    #[test]
    fn create_assigns_sequential_ids_from_zero() {
        let h = harness();
        let a = h.registry.create_post(&h.admin, "first", "cid-a").unwrap();
        let b = h.registry.create_post(&h.admin, "second", "cid-b").unwrap();
        assert_eq!(a, PostId(0));
        assert_eq!(b, PostId(1));
        assert_eq!(h.registry.next_id().unwrap(), PostId(2));

        let post = h.registry.get_post(a).unwrap();
        assert_eq!(post.title, "first");
        assert_eq!(post.locator, "cid-a");
        assert_eq!(post.timestamp, Timestamp(1_000));
    }

    #[test]
    fn ids_are_never_reused() {
        let h = harness();
        for i in 0..5 {
            h.registry.create_post(&h.admin, format!("p{i}"), "cid").unwrap();
        }
        h.registry.delete_post(&h.admin, PostId(4)).unwrap();
        h.registry.delete_post(&h.admin, PostId(1)).unwrap();

        assert_eq!(h.registry.next_id().unwrap(), PostId(5));
        let id = h.registry.create_post(&h.admin, "again", "cid").unwrap();
        assert_eq!(id, PostId(5));
        assert_eq!(h.registry.post_count().unwrap(), 4);
    }

    #[test]
    fn update_refreshes_timestamp() {
        let h = harness();
        let id = h.registry.create_post(&h.admin, "draft", "cid-1").unwrap();
        h.clock.advance(60);
        h.registry.update_post(&h.admin, id, "final", "cid-2").unwrap();

        let post = h.registry.get_post(id).unwrap();
        assert_eq!(post.title, "final");
        assert_eq!(post.locator, "cid-2");
        assert_eq!(post.timestamp, Timestamp(1_060));
    }

    #[test]
    fn missing_post_is_not_found() {
        let h = harness();
        assert!(matches!(
            h.registry.get_post(PostId(3)),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            h.registry.update_post(&h.admin, PostId(3), "t", "c"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            h.registry.delete_post(&h.admin, PostId(3)),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(h.log.is_empty());
    }

    #[test]
    fn unauthorized_caller_changes_nothing() {
        let h = harness();
        let id = h.registry.create_post(&h.admin, "kept", "cid").unwrap();
        let before = h.registry.posts_by_page(0, 10).unwrap();
        let events_before = h.log.len();
        let mallory = AccountId::from_label("mallory");

        let err = h.registry.create_post(&mallory, "x", "y").unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        assert!(h.registry.update_post(&mallory, id, "x", "y").is_err());
        assert!(h.registry.delete_post(&mallory, id).is_err());

        assert_eq!(h.registry.posts_by_page(0, 10).unwrap(), before);
        assert_eq!(h.registry.next_id().unwrap(), PostId(1));
        assert_eq!(h.log.len(), events_before);
    }

    #[test]
    fn page_returns_columns_and_clips() {
        let h = harness();
        for title in ["a", "b", "c"] {
            h.registry.create_post(&h.admin, title, format!("cid-{title}")).unwrap();
            h.clock.advance(1);
        }

        let page = h.registry.posts_by_page(1, 5).unwrap();
        assert_eq!(page.titles, vec!["b", "c"]);
        assert_eq!(page.locators, vec!["cid-b", "cid-c"]);
        assert_eq!(page.timestamps, vec![Timestamp(1_001), Timestamp(1_002)]);

        assert!(h.registry.posts_by_page(3, 5).unwrap().is_empty());
        assert_eq!(h.registry.posts_by_page(0, 13).unwrap().len(), 3);
    }

    #[test]
    fn every_mutation_emits_one_event() {
        let h = harness();
        let id = h.registry.create_post(&h.admin, "t", "c").unwrap();
        h.registry.update_post(&h.admin, id, "t2", "c2").unwrap();
        h.registry.delete_post(&h.admin, id).unwrap();

        let events = h.log.events();
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::PostCreated,
                EventKind::PostUpdated,
                EventKind::PostDeleted
            ]
        );
        assert_eq!(events.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(events.iter().all(|e| e.key == EventKey::Post(id)));
        assert!(events.iter().all(RegistryEvent::verify));
    }

    #[test]
    fn projection_matches_registry() {
        let h = harness();
        for i in 0..6 {
            h.registry.create_post(&h.admin, format!("p{i}"), format!("c{i}")).unwrap();
            h.clock.advance(5);
        }
        h.registry.delete_post(&h.admin, PostId(1)).unwrap();
        h.registry.update_post(&h.admin, PostId(3), "p3*", "c3*").unwrap();
        h.registry.delete_post(&h.admin, PostId(5)).unwrap();

        let projection = RegistryProjection::replay(&h.log.events()).unwrap();
        let snapshot = h.registry.snapshot().unwrap();
        assert_eq!(projection.posts().all_keys(), snapshot.posts.all_keys());
        let projected: Vec<_> = projection.posts().iter().cloned().collect();
        let actual: Vec<_> = snapshot.posts.iter().cloned().collect();
        assert_eq!(projected, actual);
    }

    #[test]
    fn snapshot_roundtrip_resumes_ids_and_events() {
        let h = harness();
        h.registry.create_post(&h.admin, "a", "1").unwrap();
        h.registry.create_post(&h.admin, "b", "2").unwrap();
        h.registry.delete_post(&h.admin, PostId(1)).unwrap();

        let json = serde_json::to_string(&h.registry.snapshot().unwrap()).unwrap();
        let snapshot: PostSnapshot = serde_json::from_str(&json).unwrap();
        let restored =
            PostRegistry::from_snapshot(h.registry.context().clone(), snapshot).unwrap();

        assert_eq!(restored.next_id().unwrap(), PostId(2));
        assert_eq!(restored.all_post_ids().unwrap(), vec![PostId(0)]);
        restored.create_post(&h.admin, "c", "3").unwrap();
        assert_eq!(h.log.events().last().map(|e| e.seq), Some(4));
    }

    #[test]
    fn snapshot_with_stale_next_id_is_rejected() {
        let mut posts = IndexedStore::new();
        posts
            .insert(PostId(3), PostPayload::new("t", "c"), Timestamp(1))
            .unwrap();
        let snapshot = PostSnapshot {
            next_id: PostId(2),
            event_seq: 1,
            posts,
        };
        let h = harness();
        assert!(matches!(
            PostRegistry::from_snapshot(h.registry.context().clone(), snapshot),
            Err(RegistryError::Store(StoreError::IntegrityViolation(_)))
        ));
    }

    #[test]
    fn exhausted_id_space_fails_without_mutating() {
        let h = harness();
        let snapshot = PostSnapshot {
            next_id: PostId(u64::MAX),
            event_seq: 0,
            posts: IndexedStore::new(),
        };
        let registry =
            PostRegistry::from_snapshot(h.registry.context().clone(), snapshot).unwrap();

        assert_eq!(
            registry.create_post(&h.admin, "late", "cid"),
            Err(RegistryError::IdsExhausted {
                last: PostId(u64::MAX)
            })
        );
        assert_eq!(registry.post_count().unwrap(), 0);
        assert_eq!(registry.next_id().unwrap(), PostId(u64::MAX));
        assert!(h.log.is_empty());
    }
}
