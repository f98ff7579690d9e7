//! Post and file registries for regstore.
//!
//! Both registries follow the same pattern: every mutation passes the
//! [`AccessGuard`](regstore_guard::AccessGuard) first, is validated, is
//! applied to an [`IndexedStore`](regstore_store::IndexedStore), and then
//! publishes one [`RegistryEvent`](regstore_events::RegistryEvent). All four
//! steps run under the registry's write lock, so a failed call changes
//! nothing and publishes nothing. Reads are open to everyone.
//!
//! The two registries differ in how keys are assigned:
//!
//! - [`PostRegistry`] hands out sequential [`PostId`](regstore_types::PostId)s
//!   starting at 0 and never reuses one.
//! - [`FileRegistry`] keys records by the hash of their path, so a deleted
//!   path can be created again under the same key.

pub mod context;
pub mod error;
pub mod files;
pub mod posts;
pub mod view;

pub use context::RegistryContext;
pub use error::{RegistryError, RegistryResult};
pub use files::{FileRegistry, FileSnapshot};
pub use posts::{PostRegistry, PostSnapshot};
pub use view::{FileColumns, FileEntry, Post, PostColumns};
