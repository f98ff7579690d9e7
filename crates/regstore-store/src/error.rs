/// Errors from indexed store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No live record has this key.
    #[error("record not found: {key}")]
    NotFound { key: String },

    /// A live record already has this key.
    #[error("duplicate key: {key}")]
    DuplicateKey { key: String },

    /// Positional access past the end of the enumeration index.
    #[error("index {index} out of bounds (count {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    /// The three internal structures disagree.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
}

impl StoreError {
    pub(crate) fn not_found(key: &impl std::fmt::Display) -> Self {
        Self::NotFound {
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate(key: &impl std::fmt::Display) -> Self {
        Self::DuplicateKey {
            key: key.to_string(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
