use regstore_store::StoreError;
use regstore_types::RegistryKind;

use crate::event::EventId;

/// Errors raised while replaying events into a projection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// The event's id does not match its content.
    #[error("event {id} failed integrity check")]
    Integrity { id: EventId },

    /// A sequence number was skipped or repeated.
    #[error("out-of-order event for {registry}: expected seq {expected}, got {actual}")]
    OutOfOrder {
        registry: RegistryKind,
        expected: u64,
        actual: u64,
    },

    /// Kind, key and payload do not fit together.
    #[error("malformed event {id}: {reason}")]
    Malformed { id: EventId, reason: String },

    /// The event does not apply to the projected state.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;
