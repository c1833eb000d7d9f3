/// Errors produced while constructing or parsing foundation types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("invalid identifier length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("payload serialization failed: {0}")]
    Serialization(String),
}
