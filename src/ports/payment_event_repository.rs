//! PaymentEventRepository port - audit trail for webhook deliveries.
//!
//! The payment provider delivers webhooks at-least-once: network timeouts,
//! 5xx responses from our endpoint, or a lost acknowledgement all trigger
//! redelivery. Applied grants are deduplicated inside the ledger transaction
//! itself; this port covers the remaining cases - recording rejected
//! (failed-payment) events and reading the trail back.

use async_trait::async_trait;

use crate::domain::billing::PaymentEvent;
use crate::domain::foundation::{DomainError, OrganizationId};

/// Result of attempting to save a payment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate delivery).
    AlreadyExists,
}

/// Port for storing and retrieving processed payment events.
///
/// Implementations must rely on a uniqueness constraint on
/// `external_event_id` to stay correct under concurrent deliveries; an
/// in-memory dedupe cache would not survive restarts or multiple instances.
#[async_trait]
pub trait PaymentEventRepository: Send + Sync {
    /// Find a previously recorded event by its provider event id.
    async fn find_by_external_event_id(
        &self,
        external_event_id: &str,
    ) -> Result<Option<PaymentEvent>, DomainError>;

    /// Attempt to save a payment event record.
    ///
    /// Uses `ON CONFLICT DO NOTHING` semantics: returns
    /// `SaveResult::Inserted` the first time, `SaveResult::AlreadyExists`
    /// when another delivery got there first.
    async fn save(&self, event: &PaymentEvent) -> Result<SaveResult, DomainError>;

    /// All recorded events for an organization, newest first.
    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<PaymentEvent>, DomainError>;
}
