use std::fmt;
use std::hash::Hash;

use regstore_types::Timestamp;
use serde::{Deserialize, Serialize};

/// Bound for anything usable as an [`IndexedStore`](crate::IndexedStore) key.
pub trait StoreKey: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

impl<T> StoreKey for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

/// A stored record: key, payload, and store-assigned timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<K, P> {
    pub key: K,
    pub payload: P,
    /// Set once at insertion.
    pub created_at: Timestamp,
    /// Set at insertion and refreshed on every update.
    pub updated_at: Timestamp,
}

impl<K, P> Record<K, P> {
    /// Returns `true` if the record was updated after it was created.
    pub fn was_updated(&self) -> bool {
        self.updated_at.is_after(&self.created_at)
    }
}
