//! GetStagingJobHandler - read one staging job.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, OrganizationId, StagingJobId};
use crate::domain::staging::StagingJob;
use crate::ports::StagingJobRepository;

/// Query for a single staging job.
#[derive(Debug, Clone)]
pub struct GetStagingJobQuery {
    pub organization_id: OrganizationId,
    pub job_id: StagingJobId,
}

/// Handler returning a job's current state.
pub struct GetStagingJobHandler {
    jobs: Arc<dyn StagingJobRepository>,
}

impl GetStagingJobHandler {
    pub fn new(jobs: Arc<dyn StagingJobRepository>) -> Self {
        Self { jobs }
    }

    /// Returns the job, or `None` when it does not exist or belongs to a
    /// different organization.
    pub async fn handle(&self, query: GetStagingJobQuery) -> Result<Option<StagingJob>, DomainError> {
        let job = self.jobs.find_by_id(&query.job_id).await?;
        Ok(job.filter(|j| j.organization_id() == &query.organization_id))
    }
}
