use agora_ledger::LedgerError;

/// Errors produced by authorization checks and registry maintenance.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("{operation}: unauthorized")]
    Unauthorized { operation: &'static str },

    #[error("actor is already an administrator")]
    AlreadyAdministrator,

    #[error("cannot remove the last administrator")]
    LastAdministrator,

    #[error("actor is not an administrator: {0}")]
    NotAnAdministrator(String),

    #[error("ledger error during {operation}")]
    Ledger {
        operation: &'static str,
        #[source]
        source: LedgerError,
    },
}

pub type GateResult<T> = Result<T, GateError>;
