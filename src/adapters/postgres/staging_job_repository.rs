//! PostgreSQL implementation of StagingJobRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::adapters::postgres::is_unique_violation;
use crate::domain::foundation::{
    DomainError, ErrorCode, OrganizationId, ReservationId, StagingJobId, Timestamp,
};
use crate::domain::staging::{StagingJob, StagingJobStatus, StagingStyle};
use crate::ports::StagingJobRepository;

/// PostgreSQL staging job store.
pub struct PostgresStagingJobRepository {
    pool: PgPool,
}

impl PostgresStagingJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StagingJobRow {
    id: Uuid,
    organization_id: Uuid,
    room_image_ref: String,
    prompt: String,
    style: String,
    status: String,
    reservation_id: Option<Uuid>,
    staged_image_ref: Option<String>,
    ai_cost_cents: Option<i64>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StagingJobRow> for StagingJob {
    type Error = DomainError;

    fn try_from(row: StagingJobRow) -> Result<Self, Self::Error> {
        let style: StagingStyle = row.style.parse().map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid style value: {}", row.style),
            )
        })?;
        let status = parse_status(&row.status)?;

        Ok(StagingJob::reconstitute(
            StagingJobId::from_uuid(row.id),
            OrganizationId::from_uuid(row.organization_id),
            row.room_image_ref,
            row.prompt,
            style,
            status,
            row.reservation_id.map(ReservationId::from_uuid),
            row.staged_image_ref,
            row.ai_cost_cents,
            row.error_message,
            Timestamp::from_datetime(row.created_at),
            Timestamp::from_datetime(row.updated_at),
        ))
    }
}

fn parse_status(s: &str) -> Result<StagingJobStatus, DomainError> {
    match s {
        "pending" => Ok(StagingJobStatus::Pending),
        "reserved" => Ok(StagingJobStatus::Reserved),
        "processing" => Ok(StagingJobStatus::Processing),
        "completed" => Ok(StagingJobStatus::Completed),
        "failed" => Ok(StagingJobStatus::Failed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

#[async_trait]
impl StagingJobRepository for PostgresStagingJobRepository {
    async fn insert(&self, job: &StagingJob) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO staging_jobs (
                id, organization_id, room_image_ref, prompt, style, status, reservation_id,
                staged_image_ref, ai_cost_cents, error_message, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(job.id().as_uuid())
        .bind(job.organization_id().as_uuid())
        .bind(job.room_image_ref())
        .bind(job.prompt())
        .bind(job.style().as_str())
        .bind(job.status().as_str())
        .bind(job.reservation_id().map(|id| *id.as_uuid()))
        .bind(job.staged_image_ref())
        .bind(job.ai_cost_cents())
        .bind(job.error_message())
        .bind(job.created_at().as_datetime())
        .bind(job.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("staging job {} already exists", job.id()),
                );
            }
            DomainError::database(format!("Failed to insert staging job: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, job: &StagingJob) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE staging_jobs SET
                status = $2,
                reservation_id = $3,
                staged_image_ref = $4,
                ai_cost_cents = $5,
                error_message = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(job.id().as_uuid())
        .bind(job.status().as_str())
        .bind(job.reservation_id().map(|id| *id.as_uuid()))
        .bind(job.staged_image_ref())
        .bind(job.ai_cost_cents())
        .bind(job.error_message())
        .bind(job.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update staging job: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::JobNotFound,
                format!("staging job {} not found", job.id()),
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &StagingJobId) -> Result<Option<StagingJob>, DomainError> {
        let row: Option<StagingJobRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, room_image_ref, prompt, style, status, reservation_id,
                   staged_image_ref, ai_cost_cents, error_message, created_at, updated_at
            FROM staging_jobs WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find staging job: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<StagingJob>, DomainError> {
        let rows: Vec<StagingJobRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, room_image_ref, prompt, style, status, reservation_id,
                   staged_image_ref, ai_cost_cents, error_message, created_at, updated_at
            FROM staging_jobs
            WHERE organization_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list staging jobs: {}", e)))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips() {
        for status in [
            StagingJobStatus::Pending,
            StagingJobStatus::Reserved,
            StagingJobStatus::Processing,
            StagingJobStatus::Completed,
            StagingJobStatus::Failed,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_database_error() {
        let err = parse_status("queued").unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn row_rebuilds_job() {
        let row = StagingJobRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            room_image_ref: "uploads/room.jpg".to_string(),
            prompt: "light and airy".to_string(),
            style: "coastal".to_string(),
            status: "completed".to_string(),
            reservation_id: Some(Uuid::new_v4()),
            staged_image_ref: Some("staged/room.jpg".to_string()),
            ai_cost_cents: Some(42),
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let job: StagingJob = row.try_into().unwrap();
        assert_eq!(job.status(), StagingJobStatus::Completed);
        assert_eq!(job.style(), StagingStyle::Coastal);
        assert_eq!(job.ai_cost_cents(), Some(42));
    }
}
