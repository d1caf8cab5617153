//! LedgerEntry - immutable audit record of a single balance change.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{LedgerEntryId, OrganizationId, StagingJobId, Timestamp};

/// The four kinds of ledger mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Pessimistic hold taken before a staging attempt (negative amount).
    Reserve,
    /// Finalization of a reservation (zero amount, audit only).
    Commit,
    /// Reversal of a reservation (positive amount).
    Refund,
    /// Credits purchased or seeded (positive amount).
    Grant,
}

/// Append-only audit record of one ledger mutation.
///
/// `amount` is signed: reserves are negative, refunds and grants positive,
/// commits zero (the debit already happened at reserve time). `balance_after`
/// snapshots the account balance the moment the entry was written, so the
/// running sum of amounts for an organization always equals its balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub organization_id: OrganizationId,
    pub kind: LedgerEntryKind,
    pub amount: i64,
    pub related_job_id: Option<StagingJobId>,
    pub related_payment_id: Option<String>,
    pub balance_after: i64,
    pub created_at: Timestamp,
}

impl LedgerEntry {
    /// Entry for a reservation debit.
    pub fn reserve(
        organization_id: OrganizationId,
        amount: i64,
        job_id: StagingJobId,
        balance_after: i64,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            organization_id,
            kind: LedgerEntryKind::Reserve,
            amount: -amount,
            related_job_id: Some(job_id),
            related_payment_id: None,
            balance_after,
            created_at: Timestamp::now(),
        }
    }

    /// Entry finalizing a reservation. Zero amount; keeps the reservation
    /// lifecycle visible in the audit trail.
    pub fn commit(
        organization_id: OrganizationId,
        job_id: Option<StagingJobId>,
        balance_after: i64,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            organization_id,
            kind: LedgerEntryKind::Commit,
            amount: 0,
            related_job_id: job_id,
            related_payment_id: None,
            balance_after,
            created_at: Timestamp::now(),
        }
    }

    /// Entry reversing a reservation.
    pub fn refund(
        organization_id: OrganizationId,
        amount: i64,
        job_id: Option<StagingJobId>,
        balance_after: i64,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            organization_id,
            kind: LedgerEntryKind::Refund,
            amount,
            related_job_id: job_id,
            related_payment_id: None,
            balance_after,
            created_at: Timestamp::now(),
        }
    }

    /// Entry for granted credits, tied to the external payment event id.
    pub fn grant(
        organization_id: OrganizationId,
        amount: i64,
        payment_id: impl Into<String>,
        balance_after: i64,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            organization_id,
            kind: LedgerEntryKind::Grant,
            amount,
            related_job_id: None,
            related_payment_id: Some(payment_id.into()),
            balance_after,
            created_at: Timestamp::now(),
        }
    }
}

/// Sums entry amounts for a conservation check: the result must equal the
/// account's current balance.
pub fn sum_amounts<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> i64 {
    entries.into_iter().map(|e| e.amount).sum()
}
