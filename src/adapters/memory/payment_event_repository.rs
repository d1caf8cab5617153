//! In-memory implementation of PaymentEventRepository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::PaymentEvent;
use crate::domain::foundation::{DomainError, OrganizationId};
use crate::ports::{PaymentEventRepository, SaveResult};

/// In-memory payment event store keyed by external event id.
#[derive(Default)]
pub struct InMemoryPaymentEventRepository {
    events: Arc<RwLock<HashMap<String, PaymentEvent>>>,
}

impl InMemoryPaymentEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentEventRepository for InMemoryPaymentEventRepository {
    async fn find_by_external_event_id(
        &self,
        external_event_id: &str,
    ) -> Result<Option<PaymentEvent>, DomainError> {
        let events = self.events.read().await;
        Ok(events.get(external_event_id).cloned())
    }

    async fn save(&self, event: &PaymentEvent) -> Result<SaveResult, DomainError> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.external_event_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        events.insert(event.external_event_id.clone(), event.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<PaymentEvent>, DomainError> {
        let events = self.events.read().await;
        let mut matched: Vec<PaymentEvent> = events
            .values()
            .filter(|e| e.organization_id == *organization_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        Ok(matched)
    }
}
