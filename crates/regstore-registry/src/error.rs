use regstore_store::StoreError;
use regstore_types::PostId;

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The access guard denied the mutation.
    #[error("unauthorized: {caller} may not {action}: {reason}")]
    Unauthorized {
        caller: String,
        action: String,
        reason: String,
    },

    #[error("not found: {key}")]
    NotFound { key: String },

    #[error("duplicate key: {key}")]
    DuplicateKey { key: String },

    /// A file must always have a content locator.
    #[error("locator cannot be empty")]
    EmptyLocator,

    #[error("index {index} out of bounds (count {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    /// Every post id has been handed out.
    #[error("post ids exhausted after {last}")]
    IdsExhausted { last: PostId },

    #[error("registry lock poisoned: {0}")]
    Poisoned(String),

    /// Persisted or in-memory state failed an integrity check.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => Self::NotFound { key },
            StoreError::DuplicateKey { key } => Self::DuplicateKey { key },
            StoreError::IndexOutOfBounds { index, count } => {
                Self::IndexOutOfBounds { index, count }
            }
            other @ StoreError::IntegrityViolation(_) => Self::Store(other),
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
