use agora_cache::CacheError;
use agora_gate::GateError;
use agora_ledger::LedgerError;
use agora_types::StatusKind;

/// Typed failure taxonomy of store operations.
///
/// Every variant carries the originating operation name; adapter failures
/// are wrapped with that context and never swallowed. Callers can render
/// distinct messages for "not allowed", "no longer exists", and "try
/// again".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{operation}: unauthorized")]
    Unauthorized { operation: &'static str },

    #[error("{operation}: {key} not found")]
    NotFound {
        operation: &'static str,
        key: String,
    },

    #[error("{operation}: stale revision, reload and retry with the current head")]
    StaleRevision { operation: &'static str },

    #[error("invalid status transition from {from:?} to {to:?}")]
    InvalidTransition { from: StatusKind, to: StatusKind },

    #[error("cannot remove the last coordinator")]
    LastCoordinator,

    #[error("actor is already a member")]
    AlreadyMember,

    #[error("actor is already a coordinator")]
    AlreadyCoordinator,

    #[error("actor is not a member")]
    NotMember,

    #[error("actor is not a coordinator")]
    NotCoordinator,

    #[error("{operation}: transport failure: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: payload rejected: {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    /// Wrap an adapter failure with the operation it occurred in.
    pub fn from_ledger(operation: &'static str, source: LedgerError) -> Self {
        match source {
            LedgerError::NotFound(key) => Self::NotFound { operation, key },
            LedgerError::StaleRevision => Self::StaleRevision { operation },
            LedgerError::Validation(message) => Self::Validation { operation, message },
            LedgerError::Transport(message) => Self::Transport { operation, message },
        }
    }

    /// Lift a gate failure into the store taxonomy.
    pub fn from_gate(source: GateError) -> Self {
        match source {
            GateError::Unauthorized { operation } => Self::Unauthorized { operation },
            GateError::AlreadyAdministrator => Self::Validation {
                operation: "administration",
                message: "already an administrator".into(),
            },
            GateError::LastAdministrator => Self::Validation {
                operation: "administration",
                message: "cannot remove the last administrator".into(),
            },
            GateError::NotAnAdministrator(key) => Self::NotFound {
                operation: "administration",
                key,
            },
            GateError::Ledger { operation, source } => Self::from_ledger(operation, source),
        }
    }

    /// A cache miss whose resolver failed is reported as not-found.
    pub fn from_cache(operation: &'static str, source: CacheError) -> Self {
        match source {
            CacheError::NotFound { key, .. } => Self::NotFound { operation, key },
            CacheError::Poisoned => Self::Transport {
                operation,
                message: "cache state lock poisoned".into(),
            },
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
