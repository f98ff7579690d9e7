//! Foundation types for regstore.
//!
//! This crate provides the identity, key, and time types shared by every
//! other regstore crate.
//!
//! # Key Types
//!
//! - [`AccountId`] — Caller identity presented to the access guard
//! - [`FileKey`] — 32-byte path-derived key for the file registry
//! - [`PostId`] — Sequential key for the post registry
//! - [`Timestamp`] — Host-supplied mutation time (seconds since UNIX epoch)
//! - [`RegistryKind`] — Which of the two registries an action or event concerns
//! - [`Clock`] — Source of [`Timestamp`]s, injected into registries
//! - [`PostPayload`], [`FilePayload`] — The fields each registry stores

pub mod account;
pub mod error;
pub mod key;
pub mod payload;
pub mod registry;
pub mod time;

pub use account::AccountId;
pub use error::TypeError;
pub use key::{FileKey, PostId};
pub use payload::{FilePayload, PostPayload};
pub use registry::RegistryKind;
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
