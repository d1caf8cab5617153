//! StagingJobRepository port - staging job persistence.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrganizationId, StagingJobId};
use crate::domain::staging::StagingJob;

/// Port for storing and retrieving staging jobs.
///
/// The orchestrator persists the job after every transition so that a crash
/// mid-flight leaves an inspectable record rather than a phantom job.
#[async_trait]
pub trait StagingJobRepository: Send + Sync {
    /// Inserts a new job. The job id must not already exist.
    async fn insert(&self, job: &StagingJob) -> Result<(), DomainError>;

    /// Persists the job's current state over the stored one.
    async fn update(&self, job: &StagingJob) -> Result<(), DomainError>;

    /// Finds a job by id. Returns `None` if it does not exist.
    async fn find_by_id(&self, id: &StagingJobId) -> Result<Option<StagingJob>, DomainError>;

    /// All jobs for an organization, newest first.
    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<StagingJob>, DomainError>;
}
