use tally_store::StoreError;
use thiserror::Error;

/// Failure taxonomy of the ledger engine.
///
/// The first three are definitional and caller-recoverable; the engine never
/// retries them. `Inconsistent` signals a referential-integrity violation
/// between the history log and the participant store and is never expected
/// in normal operation. `Storage` wraps any leaf failure; callers may retry
/// an unavailable store with backoff, the engine itself does not (a blind
/// retry could duplicate a claim's side effects).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("participant name already exists: {0}")]
    DuplicateName(String),

    #[error("participant not found: {0}")]
    NotFound(String),

    #[error("ledger inconsistency: {0}")]
    Inconsistent(String),

    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => LedgerError::NotFound(key),
            StoreError::Duplicate(name) => LedgerError::DuplicateName(name),
            StoreError::Corruption(msg) => LedgerError::Inconsistent(msg),
            other => LedgerError::Storage(other),
        }
    }
}

impl LedgerError {
    /// Suggested transport status for this failure, by the boundary
    /// convention (the engine itself knows nothing about HTTP).
    pub fn status_hint(&self) -> u16 {
        match self {
            LedgerError::InvalidInput(_) => 400,
            LedgerError::DuplicateName(_) => 400,
            LedgerError::NotFound(_) => 404,
            LedgerError::Inconsistent(_) => 500,
            LedgerError::Storage(StoreError::Unavailable(_)) => 503,
            LedgerError::Storage(_) => 500,
        }
    }
}
