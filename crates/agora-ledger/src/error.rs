/// Errors produced by ledger adapter operations.
///
/// Adapters distinguish transport-level failures (network, timeout --
/// potentially transient) from ledger-level rejections (the record is gone,
/// the concurrency token is stale, the payload was refused upstream).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("stale revision: the supplied previous hash is not the current head")]
    StaleRevision,

    #[error("payload rejected by the ledger: {0}")]
    Validation(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
