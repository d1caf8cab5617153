//! CreditLedger port - the single gateway to credit balance mutations.
//!
//! Every balance change goes through one of the four ledger operations, each
//! executed inside a single atomic transaction boundary owned by the
//! implementation end-to-end, so no mutation is ever split across an HTTP
//! request/response pair. Implementations must also linearize operations on
//! the same account: two concurrent reserves against a balance of 1 must
//! resolve to exactly one success and one `InsufficientCredits`.

use async_trait::async_trait;

use crate::domain::foundation::{OrganizationId, ReservationId, StagingJobId};
use crate::domain::ledger::{LedgerEntry, LedgerError};

/// Outcome of committing a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Reservation finalized; a zero-amount commit entry was written.
    Committed,
    /// Reservation was already committed; nothing was written.
    AlreadyCommitted,
}

/// Outcome of refunding a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundOutcome {
    /// Reserved amount restored to the balance.
    Refunded { balance_after: i64 },
    /// Reservation was already refunded; the balance was not touched.
    AlreadyRefunded,
}

/// Outcome of granting purchased credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// Credits added to the balance.
    Applied { balance_after: i64 },
    /// The external event id was seen before; the balance was not touched.
    AlreadyApplied,
}

/// Port for the credit ledger.
///
/// The non-negativity invariant (balance never below zero) and the
/// conservation invariant (sum of entry amounts equals the balance) are
/// enforced inside every operation, not by callers.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Opens a credit account with an optional signup bonus.
    ///
    /// Returns the opening balance. A non-zero bonus writes a `grant` entry
    /// keyed by a synthetic event id so re-running signup stays idempotent.
    async fn open_account(
        &self,
        organization_id: &OrganizationId,
        signup_bonus: i64,
    ) -> Result<i64, LedgerError>;

    /// Current balance for the organization.
    async fn balance(&self, organization_id: &OrganizationId) -> Result<i64, LedgerError>;

    /// Atomically debits `amount` credits and opens a held reservation.
    ///
    /// Fails with `InsufficientCredits` when the balance is below `amount`,
    /// leaving no trace in the ledger.
    async fn reserve(
        &self,
        organization_id: &OrganizationId,
        amount: i64,
        job_id: &StagingJobId,
    ) -> Result<ReservationId, LedgerError>;

    /// Finalizes a held reservation. Idempotent.
    ///
    /// The balance does not move (the debit happened at reserve time); a
    /// zero-amount `commit` entry closes the audit trail for the job.
    async fn commit(&self, reservation_id: &ReservationId) -> Result<CommitOutcome, LedgerError>;

    /// Returns a held reservation's amount to the balance. Idempotent.
    ///
    /// Refunding a committed reservation is an invariant violation.
    async fn refund(&self, reservation_id: &ReservationId) -> Result<RefundOutcome, LedgerError>;

    /// Credits purchased credits to the account, deduplicated by
    /// `external_event_id`.
    async fn grant(
        &self,
        organization_id: &OrganizationId,
        credits: i64,
        external_event_id: &str,
        amount_cents: i64,
    ) -> Result<GrantOutcome, LedgerError>;

    /// All ledger entries for the organization, oldest first.
    async fn entries(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;
}
