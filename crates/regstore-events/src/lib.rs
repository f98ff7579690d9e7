//! Mutation events for regstore.
//!
//! Every successful registry mutation produces exactly one [`RegistryEvent`]
//! and hands it to an [`EventSink`]. Events carry a per-registry sequence
//! number and a BLAKE3 id computed over their content, so a consumer can
//! check both ordering and integrity.
//!
//! [`RegistryProjection`] folds an event stream back into post and file
//! state, which lets a listener mirror the registries without reading them.

pub mod error;
pub mod event;
pub mod projection;
pub mod sink;

pub use error::{ProjectionError, ProjectionResult};
pub use event::{EventId, EventKey, EventKind, EventPayload, RegistryEvent};
pub use projection::RegistryProjection;
pub use sink::{EventFilter, EventSink, FanoutSink, InMemoryEventLog, TracingSink};
