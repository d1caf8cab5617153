//! PostgreSQL implementation of PaymentEventRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{PaymentEvent, PaymentEventStatus};
use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, Timestamp};
use crate::ports::{PaymentEventRepository, SaveResult};

/// PostgreSQL payment event store.
pub struct PostgresPaymentEventRepository {
    pool: PgPool,
}

impl PostgresPaymentEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentEventRow {
    external_event_id: String,
    organization_id: Uuid,
    credits_granted: i64,
    amount_cents: i64,
    status: String,
    processed_at: DateTime<Utc>,
}

impl TryFrom<PaymentEventRow> for PaymentEvent {
    type Error = DomainError;

    fn try_from(row: PaymentEventRow) -> Result<Self, Self::Error> {
        Ok(PaymentEvent {
            external_event_id: row.external_event_id,
            organization_id: OrganizationId::from_uuid(row.organization_id),
            credits_granted: row.credits_granted,
            amount_cents: row.amount_cents,
            status: parse_status(&row.status)?,
            processed_at: Timestamp::from_datetime(row.processed_at),
        })
    }
}

fn parse_status(s: &str) -> Result<PaymentEventStatus, DomainError> {
    match s {
        "applied" => Ok(PaymentEventStatus::Applied),
        "rejected" => Ok(PaymentEventStatus::Rejected),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment event status: {}", s),
        )),
    }
}

#[async_trait]
impl PaymentEventRepository for PostgresPaymentEventRepository {
    async fn find_by_external_event_id(
        &self,
        external_event_id: &str,
    ) -> Result<Option<PaymentEvent>, DomainError> {
        let row: Option<PaymentEventRow> = sqlx::query_as(
            r#"
            SELECT external_event_id, organization_id, credits_granted,
                   amount_cents, status, processed_at
            FROM payment_events WHERE external_event_id = $1
            "#,
        )
        .bind(external_event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find payment event: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn save(&self, event: &PaymentEvent) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_events (
                external_event_id, organization_id, credits_granted,
                amount_cents, status, processed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (external_event_id) DO NOTHING
            "#,
        )
        .bind(&event.external_event_id)
        .bind(event.organization_id.as_uuid())
        .bind(event.credits_granted)
        .bind(event.amount_cents)
        .bind(event.status.as_str())
        .bind(event.processed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save payment event: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<PaymentEvent>, DomainError> {
        let rows: Vec<PaymentEventRow> = sqlx::query_as(
            r#"
            SELECT external_event_id, organization_id, credits_granted,
                   amount_cents, status, processed_at
            FROM payment_events
            WHERE organization_id = $1
            ORDER BY processed_at DESC
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list payment events: {}", e)))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
