/// Errors raised while building a guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}
