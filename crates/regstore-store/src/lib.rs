//! Indexed keyed record store for regstore.
//!
//! [`IndexedStore`] keeps three structures in lockstep:
//!
//! - `records`: key → [`Record`] (absence means "does not exist"),
//! - `key_index`: a dense `Vec` of live keys used for enumeration,
//! - `position_of`: key → slot in `key_index`.
//!
//! For every live key `k`, `key_index[position_of[k]] == k`, and all three
//! structures always hold the same key set.
//!
//! # Design Rules
//!
//! 1. Removal is swap-removal: the last key moves into the freed slot. It is
//!    O(1) regardless of store size, and enumeration order after a removal
//!    reflects the swap rather than insertion order.
//! 2. Every precondition is checked before any structure is touched, so a
//!    failed call leaves the store exactly as it was.
//! 3. Point access (`key_at`, `record_at`) fails out of bounds; bulk listing
//!    (`page`) degrades to an empty result instead.
//! 4. Batch reads are all-or-nothing.
//! 5. Timestamps are passed in by the owner of the store; the store never
//!    reads a clock itself.

pub mod error;
pub mod record;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use record::{Record, StoreKey};
pub use store::IndexedStore;
