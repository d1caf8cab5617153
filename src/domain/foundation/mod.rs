//! Foundation - shared value objects for the domain layer.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{LedgerEntryId, OrganizationId, ReservationId, StagingJobId};
pub use timestamp::Timestamp;
