//! Payment event record - the persisted audit trail for webhook deliveries.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrganizationId, Timestamp};

/// Terminal status of a processed payment event.
///
/// There is deliberately no `Duplicate` variant: duplicates are reported to
/// the caller but never stored, because the unique `external_event_id` cannot
/// hold a second row. The first delivery's `Applied` row is the record, and
/// redeliveries leave it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventStatus {
    /// Credits were granted.
    Applied,
    /// Failed-payment event, recorded for audit with no balance change.
    Rejected,
}

impl PaymentEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEventStatus::Applied => "applied",
            PaymentEventStatus::Rejected => "rejected",
        }
    }
}

/// One processed webhook delivery. Immutable once written; the unique index
/// on `external_event_id` is the deduplication mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub external_event_id: String,
    pub organization_id: OrganizationId,
    pub credits_granted: i64,
    pub amount_cents: i64,
    pub status: PaymentEventStatus,
    pub processed_at: Timestamp,
}

impl PaymentEvent {
    /// Record for a successful payment whose credits were granted.
    pub fn applied(
        external_event_id: impl Into<String>,
        organization_id: OrganizationId,
        credits_granted: i64,
        amount_cents: i64,
    ) -> Self {
        Self {
            external_event_id: external_event_id.into(),
            organization_id,
            credits_granted,
            amount_cents,
            status: PaymentEventStatus::Applied,
            processed_at: Timestamp::now(),
        }
    }

    /// Record for a failed payment. No credits are granted.
    pub fn rejected(
        external_event_id: impl Into<String>,
        organization_id: OrganizationId,
        amount_cents: i64,
    ) -> Self {
        Self {
            external_event_id: external_event_id.into(),
            organization_id,
            credits_granted: 0,
            amount_cents,
            status: PaymentEventStatus::Rejected,
            processed_at: Timestamp::now(),
        }
    }
}
