/// Errors produced by cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The key was not cached and the resolver failed to produce a value.
    /// Callers decide whether absence is expected.
    #[error("no value for key {key}: resolver failed")]
    NotFound {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cache state lock poisoned")]
    Poisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;
