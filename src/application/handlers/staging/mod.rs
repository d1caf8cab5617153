//! Staging job handlers.

mod get_staging_job;
mod submit_staging_job;

pub use get_staging_job::{GetStagingJobHandler, GetStagingJobQuery};
pub use submit_staging_job::{SubmitStagingJobCommand, SubmitStagingJobHandler};
