//! Error types for the staging domain and orchestration.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, StagingJobId};
use crate::domain::ledger::LedgerError;

use super::StagingJobStatus;

/// Errors raised while submitting or driving a staging job.
#[derive(Debug, Clone, Error)]
pub enum StagingError {
    #[error("validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid job transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: StagingJobStatus,
        to: StagingJobStatus,
    },

    #[error("staging job not found: {0}")]
    NotFound(StagingJobId),

    #[error("insufficient credits: {remaining} remaining")]
    InsufficientCredits { remaining: i64 },

    #[error("ledger invariant violated: {0}")]
    Invariant(String),

    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

impl StagingError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        StagingError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn infrastructure(cause: impl std::fmt::Display) -> Self {
        StagingError::Infrastructure(cause.to_string())
    }
}

impl From<LedgerError> for StagingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientCredits { remaining, .. } => {
                StagingError::InsufficientCredits { remaining }
            }
            LedgerError::InvariantViolation(msg) => StagingError::Invariant(msg),
            other => StagingError::Infrastructure(other.to_string()),
        }
    }
}

impl From<DomainError> for StagingError {
    fn from(err: DomainError) -> Self {
        StagingError::Infrastructure(err.to_string())
    }
}

impl From<StagingError> for DomainError {
    fn from(err: StagingError) -> Self {
        let code = match err {
            StagingError::Validation { .. } => ErrorCode::ValidationFailed,
            StagingError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            StagingError::NotFound(_) => ErrorCode::JobNotFound,
            StagingError::InsufficientCredits { .. } => ErrorCode::InsufficientCredits,
            StagingError::Invariant(_) => ErrorCode::LedgerInvariantViolation,
            StagingError::Infrastructure(_) => ErrorCode::InternalError,
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_insufficient_credits_maps_with_remaining() {
        let err: StagingError = LedgerError::InsufficientCredits {
            remaining: 2,
            requested: 1,
        }
        .into();
        assert!(matches!(
            err,
            StagingError::InsufficientCredits { remaining: 2 }
        ));
    }

    #[test]
    fn ledger_invariant_stays_an_invariant() {
        let err: StagingError = LedgerError::invariant("refund after commit").into();
        assert!(matches!(err, StagingError::Invariant(_)));
    }

    #[test]
    fn ledger_storage_becomes_infrastructure() {
        let err: StagingError = LedgerError::storage("pool exhausted").into();
        assert!(matches!(err, StagingError::Infrastructure(_)));
    }
}
