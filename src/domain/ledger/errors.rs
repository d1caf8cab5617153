//! Error types for ledger operations.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, ReservationId};

/// Errors from credit-ledger operations.
///
/// `InvariantViolation` is the bug-alarm variant: it must never be reachable
/// from a user-triggered code path. Everything else is a normal outcome of
/// concurrent use (insufficient funds, unknown ids, storage trouble).
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("insufficient credits: {remaining} remaining, {requested} requested")]
    InsufficientCredits { remaining: i64, requested: i64 },

    #[error("no credit account for organization {0}")]
    AccountNotFound(OrganizationId),

    #[error("credit account already exists for organization {0}")]
    AccountAlreadyExists(OrganizationId),

    #[error("reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),

    #[error("ledger storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Creates a storage error from any displayable cause.
    pub fn storage(cause: impl std::fmt::Display) -> Self {
        LedgerError::Storage(cause.to_string())
    }

    /// Creates an invariant-violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        LedgerError::InvariantViolation(message.into())
    }

    /// True when the operation may succeed on retry (transient storage faults).
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

impl From<LedgerError> for DomainError {
    fn from(err: LedgerError) -> Self {
        let code = match err {
            LedgerError::InsufficientCredits { .. } => ErrorCode::InsufficientCredits,
            LedgerError::AccountNotFound(_) => ErrorCode::AccountNotFound,
            LedgerError::AccountAlreadyExists(_) => ErrorCode::ValidationFailed,
            LedgerError::ReservationNotFound(_) => ErrorCode::ReservationNotFound,
            LedgerError::InvariantViolation(_) => ErrorCode::LedgerInvariantViolation,
            LedgerError::Storage(_) => ErrorCode::DatabaseError,
        };
        DomainError::new(code, err.to_string())
    }
}
