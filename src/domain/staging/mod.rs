//! Staging domain - the staging-job aggregate and its state machine.

mod errors;
mod job;
mod style;

pub use errors::StagingError;
pub use job::{StagingJob, StagingJobStatus};
pub use style::StagingStyle;
