//! In-memory implementation of StagingJobRepository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, StagingJobId};
use crate::domain::staging::StagingJob;
use crate::ports::StagingJobRepository;

/// In-memory staging job store keyed by job id.
#[derive(Default)]
pub struct InMemoryStagingJobRepository {
    jobs: Arc<RwLock<HashMap<StagingJobId, StagingJob>>>,
}

impl InMemoryStagingJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StagingJobRepository for InMemoryStagingJobRepository {
    async fn insert(&self, job: &StagingJob) -> Result<(), DomainError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(job.id()) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("staging job {} already exists", job.id()),
            ));
        }
        jobs.insert(*job.id(), job.clone());
        Ok(())
    }

    async fn update(&self, job: &StagingJob) -> Result<(), DomainError> {
        let mut jobs = self.jobs.write().await;
        if !jobs.contains_key(job.id()) {
            return Err(DomainError::new(
                ErrorCode::JobNotFound,
                format!("staging job {} not found", job.id()),
            ));
        }
        jobs.insert(*job.id(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &StagingJobId) -> Result<Option<StagingJob>, DomainError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(id).cloned())
    }

    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<StagingJob>, DomainError> {
        let jobs = self.jobs.read().await;
        let mut matched: Vec<StagingJob> = jobs
            .values()
            .filter(|j| j.organization_id() == organization_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::staging::StagingStyle;

    fn job_for(org: OrganizationId) -> StagingJob {
        StagingJob::new(org, "uploads/room.jpg", "", StagingStyle::Modern).unwrap()
    }

    #[tokio::test]
    async fn insert_then_find_returns_job() {
        let repo = InMemoryStagingJobRepository::new();
        let job = job_for(OrganizationId::new());

        repo.insert(&job).await.unwrap();

        let found = repo.find_by_id(job.id()).await.unwrap();
        assert_eq!(found, Some(job));
    }

    #[tokio::test]
    async fn insert_duplicate_id_fails() {
        let repo = InMemoryStagingJobRepository::new();
        let job = job_for(OrganizationId::new());

        repo.insert(&job).await.unwrap();
        assert!(repo.insert(&job).await.is_err());
    }

    #[tokio::test]
    async fn update_missing_job_fails() {
        let repo = InMemoryStagingJobRepository::new();
        let job = job_for(OrganizationId::new());

        let err = repo.update(&job).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::JobNotFound);
    }

    #[tokio::test]
    async fn update_persists_transitions() {
        let repo = InMemoryStagingJobRepository::new();
        let mut job = job_for(OrganizationId::new());
        repo.insert(&job).await.unwrap();

        job.fail("provider exploded").unwrap();
        repo.update(&job).await.unwrap();

        let found = repo.find_by_id(job.id()).await.unwrap().unwrap();
        assert_eq!(found.error_message(), Some("provider exploded"));
    }

    #[tokio::test]
    async fn find_by_organization_filters_and_orders() {
        let repo = InMemoryStagingJobRepository::new();
        let org = OrganizationId::new();
        repo.insert(&job_for(org)).await.unwrap();
        repo.insert(&job_for(org)).await.unwrap();
        repo.insert(&job_for(OrganizationId::new())).await.unwrap();

        let jobs = repo.find_by_organization(&org).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].created_at() >= jobs[1].created_at());
    }
}
