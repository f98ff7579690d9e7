//! The [`IndexedStore`] structure-of-arrays.

use std::collections::HashMap;

use regstore_types::Timestamp;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::record::{Record, StoreKey};

/// Keyed record store with dense, O(1)-removable enumeration.
///
/// See the crate documentation for the invariants. The store is a plain
/// single-writer structure; owners that share it across threads wrap it in a
/// lock and hold that lock for the whole of each mutation.
#[derive(Clone, Debug)]
pub struct IndexedStore<K, P> {
    records: HashMap<K, Record<K, P>>,
    key_index: Vec<K>,
    position_of: HashMap<K, usize>,
}

impl<K: StoreKey, P> Default for IndexedStore<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StoreKey, P> IndexedStore<K, P> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            key_index: Vec::new(),
            position_of: HashMap::new(),
        }
    }

    /// Rebuild a store from records listed in enumeration order.
    ///
    /// Fails with `DuplicateKey` if a key appears twice.
    pub fn from_records(records: impl IntoIterator<Item = Record<K, P>>) -> StoreResult<Self> {
        let mut store = Self::new();
        for record in records {
            if store.records.contains_key(&record.key) {
                return Err(StoreError::duplicate(&record.key));
            }
            store.append(record);
        }
        Ok(store)
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Insert a new record stamped with `now`.
    pub fn insert(&mut self, key: K, payload: P, now: Timestamp) -> StoreResult<&Record<K, P>> {
        if self.records.contains_key(&key) {
            return Err(StoreError::duplicate(&key));
        }
        let record = Record {
            key: key.clone(),
            payload,
            created_at: now,
            updated_at: now,
        };
        self.append(record);
        self.get(&key)
    }

    /// Replace the payload of a live record and refresh `updated_at`.
    ///
    /// The record keeps its position and `created_at`.
    pub fn update(&mut self, key: &K, payload: P, now: Timestamp) -> StoreResult<&Record<K, P>> {
        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StoreError::not_found(key))?;
        record.payload = payload;
        record.updated_at = now;
        Ok(record)
    }

    /// Remove a live record by swap-removal and return it.
    ///
    /// The last key in the enumeration index moves into the removed key's
    /// slot; no other key changes position.
    pub fn remove(&mut self, key: &K) -> StoreResult<Record<K, P>> {
        let position = *self
            .position_of
            .get(key)
            .ok_or_else(|| StoreError::not_found(key))?;
        if !self.records.contains_key(key) {
            return Err(StoreError::IntegrityViolation(format!(
                "key {key} is indexed but has no record"
            )));
        }

        self.key_index.swap_remove(position);
        if let Some(moved) = self.key_index.get(position) {
            trace!(removed = %key, moved = %moved, position, "swap-removed key");
            self.position_of.insert(moved.clone(), position);
        }
        self.position_of.remove(key);
        self.records
            .remove(key)
            .ok_or_else(|| StoreError::not_found(key))
    }

    fn append(&mut self, record: Record<K, P>) {
        let key = record.key.clone();
        self.position_of.insert(key.clone(), self.key_index.len());
        self.key_index.push(key.clone());
        self.records.insert(key, record);
    }

    // ---------------------------------------------------------------
    // Point reads
    // ---------------------------------------------------------------

    /// Look up a live record.
    pub fn get(&self, key: &K) -> StoreResult<&Record<K, P>> {
        self.records
            .get(key)
            .ok_or_else(|| StoreError::not_found(key))
    }

    /// Returns `true` if `key` is live.
    pub fn contains(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    /// Number of live records.
    pub fn count(&self) -> usize {
        self.key_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_index.is_empty()
    }

    /// Key at position `index` of the enumeration index.
    pub fn key_at(&self, index: usize) -> StoreResult<&K> {
        self.key_index
            .get(index)
            .ok_or(StoreError::IndexOutOfBounds {
                index,
                count: self.count(),
            })
    }

    /// Record at position `index` of the enumeration index.
    pub fn record_at(&self, index: usize) -> StoreResult<&Record<K, P>> {
        let key = self.key_at(index)?;
        self.get(key)
    }

    // ---------------------------------------------------------------
    // Bulk reads
    // ---------------------------------------------------------------

    /// Snapshot of all live keys in current enumeration order.
    pub fn all_keys(&self) -> Vec<K> {
        self.key_index.clone()
    }

    /// Borrowed view of the enumeration index.
    pub fn keys(&self) -> &[K] {
        &self.key_index
    }

    /// Fetch several records at once.
    ///
    /// Either every key is live and all records come back in request order,
    /// or the call fails with `NotFound` for the first missing key.
    pub fn batch_get(&self, keys: &[K]) -> StoreResult<Vec<&Record<K, P>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Records at positions `[offset, offset + limit)`, clipped to `count()`.
    ///
    /// Never fails: an offset at or past the end yields an empty page.
    pub fn page(&self, offset: usize, limit: usize) -> Vec<&Record<K, P>> {
        let count = self.count();
        let start = offset.min(count);
        let end = offset.saturating_add(limit).min(count);
        self.key_index[start..end]
            .iter()
            .filter_map(|key| self.indexed(key))
            .collect()
    }

    /// All records in enumeration order, same as `page(0, count())`.
    pub fn records(&self) -> Vec<&Record<K, P>> {
        self.iter().collect()
    }

    /// Iterate records in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &Record<K, P>> + '_ {
        self.key_index
            .iter()
            .filter_map(move |key| self.indexed(key))
    }

    /// Record for a key taken from `key_index`. The bijection guarantees it
    /// exists; a miss is skipped in release builds and left for
    /// `check_integrity` to report.
    fn indexed(&self, key: &K) -> Option<&Record<K, P>> {
        let record = self.records.get(key);
        debug_assert!(record.is_some(), "indexed key {key:?} has no record");
        record
    }

    // ---------------------------------------------------------------
    // Integrity
    // ---------------------------------------------------------------

    /// Verify that the three internal structures describe the same key set
    /// and that every position round-trips.
    pub fn check_integrity(&self) -> StoreResult<()> {
        let count = self.key_index.len();
        if self.records.len() != count || self.position_of.len() != count {
            return Err(StoreError::IntegrityViolation(format!(
                "size mismatch: {} records, {} indexed keys, {} positions",
                self.records.len(),
                count,
                self.position_of.len()
            )));
        }
        for (position, key) in self.key_index.iter().enumerate() {
            match self.position_of.get(key) {
                Some(&p) if p == position => {}
                Some(&p) => {
                    return Err(StoreError::IntegrityViolation(format!(
                        "key {key} sits at slot {position} but is recorded at {p}"
                    )))
                }
                None => {
                    return Err(StoreError::IntegrityViolation(format!(
                        "key {key} at slot {position} has no position entry"
                    )))
                }
            }
            match self.records.get(key) {
                Some(record) if record.key == *key => {}
                Some(record) => {
                    return Err(StoreError::IntegrityViolation(format!(
                        "record stored under {key} carries key {}",
                        record.key
                    )))
                }
                None => {
                    return Err(StoreError::IntegrityViolation(format!(
                        "key {key} at slot {position} has no record"
                    )))
                }
            }
        }
        Ok(())
    }
}

// Persisted as the dense record list; positions are rebuilt on load.

impl<K, P> Serialize for IndexedStore<K, P>
where
    K: StoreKey + Serialize,
    P: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, K, P> Deserialize<'de> for IndexedStore<K, P>
where
    K: StoreKey + Deserialize<'de>,
    P: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<Record<K, P>>::deserialize(deserializer)?;
        Self::from_records(records).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn t(secs: u64) -> Timestamp {
        Timestamp(secs)
    }

    /// Store with string keys "A", "B", ... inserted in order.
    fn store_with(keys: &[&str]) -> IndexedStore<String, u32> {
        let mut store = IndexedStore::new();
        for (i, key) in keys.iter().enumerate() {
            store.insert(key.to_string(), i as u32, t(10)).unwrap();
        }
        store
    }

    fn keys_of(store: &IndexedStore<String, u32>) -> Vec<&str> {
        store.keys().iter().map(String::as_str).collect()
    }

    // -----------------------------------------------------------------------
    // Insert / get
    // -----------------------------------------------------------------------

    #[test]
    fn insert_and_get() {
        let mut store = IndexedStore::new();
        let record = store.insert("a".to_string(), 7u32, t(100)).unwrap();
        assert_eq!(record.payload, 7);
        assert_eq!(record.created_at, t(100));
        assert_eq!(record.updated_at, t(100));
        assert!(!record.was_updated());

        assert_eq!(store.count(), 1);
        assert!(store.contains(&"a".to_string()));
        assert_eq!(store.get(&"a".to_string()).unwrap().payload, 7);
        store.check_integrity().unwrap();
    }

    #[test]
    fn insert_duplicate_is_rejected_without_effect() {
        let mut store = store_with(&["A"]);
        let err = store.insert("A".to_string(), 99, t(20)).unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey { key: "A".into() });
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(&"A".to_string()).unwrap().payload, 0);
        assert_eq!(store.get(&"A".to_string()).unwrap().created_at, t(10));
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = store_with(&["A"]);
        assert_eq!(
            store.get(&"Z".to_string()).unwrap_err(),
            StoreError::NotFound { key: "Z".into() }
        );
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    #[test]
    fn update_replaces_payload_and_keeps_position() {
        let mut store = store_with(&["A", "B", "C"]);
        let record = store.update(&"B".to_string(), 42, t(50)).unwrap();
        assert_eq!(record.payload, 42);
        assert_eq!(record.created_at, t(10));
        assert_eq!(record.updated_at, t(50));
        assert!(record.was_updated());
        assert_eq!(keys_of(&store), vec!["A", "B", "C"]);
        assert_eq!(store.key_at(1).unwrap(), "B");
    }

    #[test]
    fn update_missing_is_not_found() {
        let mut store = store_with(&["A"]);
        let err = store.update(&"Q".to_string(), 1, t(11)).unwrap_err();
        assert_eq!(err, StoreError::NotFound { key: "Q".into() });
        assert_eq!(store.get(&"A".to_string()).unwrap().updated_at, t(10));
    }

    // -----------------------------------------------------------------------
    // Remove
    // -----------------------------------------------------------------------

    #[test]
    fn swap_removal_moves_last_key_into_hole() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        let removed = store.remove(&"B".to_string()).unwrap();
        assert_eq!(removed.key, "B");
        assert_eq!(keys_of(&store), vec!["A", "D", "C"]);
        assert_eq!(store.key_at(1).unwrap(), "D");
        assert_eq!(store.key_at(2).unwrap(), "C");
        store.check_integrity().unwrap();
    }

    #[test]
    fn remove_last_key_just_truncates() {
        let mut store = store_with(&["A", "B", "C"]);
        store.remove(&"C".to_string()).unwrap();
        assert_eq!(keys_of(&store), vec!["A", "B"]);
        store.check_integrity().unwrap();
    }

    #[test]
    fn remove_only_key_empties_store() {
        let mut store = store_with(&["A"]);
        store.remove(&"A".to_string()).unwrap();
        assert!(store.is_empty());
        assert!(store.all_keys().is_empty());
        store.check_integrity().unwrap();
    }

    #[test]
    fn remove_missing_is_not_found() {
        let mut store = store_with(&["A", "B"]);
        let err = store.remove(&"C".to_string()).unwrap_err();
        assert_eq!(err, StoreError::NotFound { key: "C".into() });
        assert_eq!(keys_of(&store), vec!["A", "B"]);
    }

    #[test]
    fn insert_then_remove_round_trip() {
        let mut store = store_with(&["A", "B"]);
        let before = store.count();
        store.insert("X".to_string(), 5, t(30)).unwrap();
        store.remove(&"X".to_string()).unwrap();
        assert_eq!(store.count(), before);
        assert!(!store.all_keys().contains(&"X".to_string()));
        store.check_integrity().unwrap();
    }

    #[test]
    fn removed_key_can_be_reinserted_at_the_end() {
        let mut store = store_with(&["A", "B", "C"]);
        store.remove(&"A".to_string()).unwrap();
        store.insert("A".to_string(), 9, t(40)).unwrap();
        assert_eq!(keys_of(&store), vec!["C", "B", "A"]);
        assert_eq!(store.get(&"A".to_string()).unwrap().created_at, t(40));
        store.check_integrity().unwrap();
    }

    // -----------------------------------------------------------------------
    // Positional access
    // -----------------------------------------------------------------------

    #[test]
    fn key_at_and_record_at_bounds() {
        let store = store_with(&["A", "B"]);
        assert_eq!(store.key_at(0).unwrap(), "A");
        assert_eq!(store.record_at(1).unwrap().payload, 1);
        assert_eq!(
            store.key_at(2).unwrap_err(),
            StoreError::IndexOutOfBounds { index: 2, count: 2 }
        );
        assert_eq!(
            store.record_at(5).unwrap_err(),
            StoreError::IndexOutOfBounds { index: 5, count: 2 }
        );
    }

    #[test]
    fn key_at_on_empty_store_fails() {
        let store: IndexedStore<String, u32> = IndexedStore::new();
        assert!(matches!(
            store.key_at(0),
            Err(StoreError::IndexOutOfBounds { index: 0, count: 0 })
        ));
    }

    // -----------------------------------------------------------------------
    // Batch and page
    // -----------------------------------------------------------------------

    #[test]
    fn batch_get_returns_in_request_order() {
        let store = store_with(&["A", "B", "C"]);
        let keys = vec!["C".to_string(), "A".to_string()];
        let records = store.batch_get(&keys).unwrap();
        let payloads: Vec<u32> = records.iter().map(|r| r.payload).collect();
        assert_eq!(payloads, vec![2, 0]);
    }

    #[test]
    fn batch_get_is_all_or_nothing() {
        let store = store_with(&["A", "B", "C"]);
        let keys = vec![
            "A".to_string(),
            "B".to_string(),
            "X".to_string(),
            "Y".to_string(),
        ];
        assert_eq!(
            store.batch_get(&keys).unwrap_err(),
            StoreError::NotFound { key: "X".into() }
        );
    }

    #[test]
    fn batch_get_empty_input() {
        let store = store_with(&["A"]);
        assert!(store.batch_get(&[]).unwrap().is_empty());
    }

    #[test]
    fn page_clips_to_count() {
        let store = store_with(&["A", "B", "C", "D", "E"]);
        let page: Vec<u32> = store.page(1, 2).iter().map(|r| r.payload).collect();
        assert_eq!(page, vec![1, 2]);
        let tail: Vec<u32> = store.page(3, 100).iter().map(|r| r.payload).collect();
        assert_eq!(tail, vec![3, 4]);
        assert_eq!(store.page(0, store.count() + 10).len(), store.count());
    }

    #[test]
    fn page_past_end_is_empty_not_error() {
        let store = store_with(&["A", "B"]);
        assert!(store.page(2, 10).is_empty());
        assert!(store.page(50, 10).is_empty());
        assert!(store.page(0, 0).is_empty());
        assert!(store.page(usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn page_follows_swapped_order() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        store.remove(&"A".to_string()).unwrap();
        let keys: Vec<&str> = store.page(0, 10).iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["D", "B", "C"]);
    }

    #[test]
    fn records_match_full_page() {
        let mut store = store_with(&["A", "B", "C"]);
        store.remove(&"B".to_string()).unwrap();
        assert_eq!(store.records(), store.page(0, store.count()));
        assert_eq!(store.records().len(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "has no record")]
    fn page_does_not_hide_an_orphaned_index_entry() {
        let mut store = store_with(&["A", "B"]);
        store.records.remove("B");
        let _ = store.page(0, 2);
    }

    #[test]
    fn orphaned_index_entry_fails_integrity() {
        let mut store = store_with(&["A", "B"]);
        store.records.remove("B");
        assert!(matches!(
            store.check_integrity(),
            Err(StoreError::IntegrityViolation(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    #[test]
    fn serde_keeps_order_and_timestamps() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        store.remove(&"B".to_string()).unwrap();
        store.update(&"C".to_string(), 77, t(99)).unwrap();

        let json = serde_json::to_string(&store).unwrap();
        let loaded: IndexedStore<String, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(keys_of(&loaded), vec!["A", "D", "C"]);
        let c = loaded.get(&"C".to_string()).unwrap();
        assert_eq!(c.payload, 77);
        assert_eq!(c.created_at, t(10));
        assert_eq!(c.updated_at, t(99));
        loaded.check_integrity().unwrap();
    }

    #[test]
    fn deserialize_rejects_duplicate_keys() {
        let json = r#"[
            {"key":"A","payload":1,"created_at":1,"updated_at":1},
            {"key":"A","payload":2,"created_at":2,"updated_at":2}
        ]"#;
        let result: Result<IndexedStore<String, u32>, _> = serde_json::from_str(json);
        assert!(result.unwrap_err().to_string().contains("duplicate key"));
    }

    // -----------------------------------------------------------------------
    // Property: the bijection survives any operation sequence
    // -----------------------------------------------------------------------

    #[derive(Clone, Debug)]
    enum Op {
        Insert(u8, u32),
        Update(u8, u32),
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..16, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            (0u8..16, any::<u32>()).prop_map(|(k, v)| Op::Update(k, v)),
            (0u8..16).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn bijection_holds_for_all_reachable_states(
            ops in proptest::collection::vec(op_strategy(), 0..200)
        ) {
            let mut store: IndexedStore<u8, u32> = IndexedStore::new();
            let mut model: BTreeMap<u8, u32> = BTreeMap::new();

            for (step, op) in ops.into_iter().enumerate() {
                let now = Timestamp(step as u64);
                match op {
                    Op::Insert(k, v) => {
                        let result = store.insert(k, v, now).map(|_| ());
                        if model.contains_key(&k) {
                            prop_assert!(result.is_err());
                        } else {
                            prop_assert!(result.is_ok());
                            model.insert(k, v);
                        }
                    }
                    Op::Update(k, v) => {
                        let result = store.update(&k, v, now).map(|_| ());
                        if let Some(slot) = model.get_mut(&k) {
                            prop_assert!(result.is_ok());
                            *slot = v;
                        } else {
                            prop_assert!(result.is_err());
                        }
                    }
                    Op::Remove(k) => {
                        let result = store.remove(&k);
                        prop_assert_eq!(result.is_ok(), model.remove(&k).is_some());
                    }
                }

                prop_assert!(store.check_integrity().is_ok());
                prop_assert_eq!(store.count(), model.len());
                for (k, v) in &model {
                    prop_assert_eq!(store.get(k).map(|r| r.payload).ok(), Some(*v));
                }
                let mut keys = store.all_keys();
                keys.sort_unstable();
                let expected: Vec<u8> = model.keys().copied().collect();
                prop_assert_eq!(keys, expected);
            }
        }
    }
}
