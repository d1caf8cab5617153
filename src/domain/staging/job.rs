//! Staging job aggregate - one request to furnish one room photo.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{OrganizationId, ReservationId, StagingJobId, Timestamp};

use super::{StagingError, StagingStyle};

/// Lifecycle of a staging job.
///
/// `Completed` and `Failed` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingJobStatus {
    /// Accepted, credits not yet reserved.
    Pending,
    /// Credits reserved, provider call not yet started.
    Reserved,
    /// Provider call in flight.
    Processing,
    /// Staged image stored, reservation committed.
    Completed,
    /// Attempt failed, reservation refunded.
    Failed,
}

impl StagingJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StagingJobStatus::Completed | StagingJobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StagingJobStatus::Pending => "pending",
            StagingJobStatus::Reserved => "reserved",
            StagingJobStatus::Processing => "processing",
            StagingJobStatus::Completed => "completed",
            StagingJobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StagingJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single staging request and everything recorded about its attempt.
///
/// Fields are private; the only way to move a job through its lifecycle is
/// the transition methods below, which enforce
/// pending -> reserved -> processing -> completed | failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingJob {
    id: StagingJobId,
    organization_id: OrganizationId,
    room_image_ref: String,
    prompt: String,
    style: StagingStyle,
    status: StagingJobStatus,
    reservation_id: Option<ReservationId>,
    staged_image_ref: Option<String>,
    ai_cost_cents: Option<i64>,
    error_message: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl StagingJob {
    /// Creates a pending job after validating the request.
    pub fn new(
        organization_id: OrganizationId,
        room_image_ref: impl Into<String>,
        prompt: impl Into<String>,
        style: StagingStyle,
    ) -> Result<Self, StagingError> {
        let room_image_ref = room_image_ref.into();
        if room_image_ref.trim().is_empty() {
            return Err(StagingError::validation(
                "room_image_ref",
                "must not be empty",
            ));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: StagingJobId::new(),
            organization_id,
            room_image_ref,
            prompt: prompt.into(),
            style,
            status: StagingJobStatus::Pending,
            reservation_id: None,
            staged_image_ref: None,
            ai_cost_cents: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a job from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: StagingJobId,
        organization_id: OrganizationId,
        room_image_ref: String,
        prompt: String,
        style: StagingStyle,
        status: StagingJobStatus,
        reservation_id: Option<ReservationId>,
        staged_image_ref: Option<String>,
        ai_cost_cents: Option<i64>,
        error_message: Option<String>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            organization_id,
            room_image_ref,
            prompt,
            style,
            status,
            reservation_id,
            staged_image_ref,
            ai_cost_cents,
            error_message,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &StagingJobId {
        &self.id
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn room_image_ref(&self) -> &str {
        &self.room_image_ref
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn style(&self) -> StagingStyle {
        self.style
    }

    pub fn status(&self) -> StagingJobStatus {
        self.status
    }

    pub fn reservation_id(&self) -> Option<&ReservationId> {
        self.reservation_id.as_ref()
    }

    pub fn staged_image_ref(&self) -> Option<&str> {
        self.staged_image_ref.as_deref()
    }

    pub fn ai_cost_cents(&self) -> Option<i64> {
        self.ai_cost_cents
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Records the credit reservation backing this job.
    pub fn reserve(&mut self, reservation_id: ReservationId) -> Result<(), StagingError> {
        self.transition(StagingJobStatus::Pending, StagingJobStatus::Reserved)?;
        self.reservation_id = Some(reservation_id);
        Ok(())
    }

    /// Marks the provider call as started.
    pub fn start_processing(&mut self) -> Result<(), StagingError> {
        self.transition(StagingJobStatus::Reserved, StagingJobStatus::Processing)
    }

    /// Records the staged result and closes the job successfully.
    pub fn complete(
        &mut self,
        staged_image_ref: impl Into<String>,
        ai_cost_cents: i64,
    ) -> Result<(), StagingError> {
        self.transition(StagingJobStatus::Processing, StagingJobStatus::Completed)?;
        self.staged_image_ref = Some(staged_image_ref.into());
        self.ai_cost_cents = Some(ai_cost_cents);
        Ok(())
    }

    /// Closes the job as failed. Allowed from any non-terminal state so a
    /// failure before the provider call (or even before reservation) still
    /// lands the job in a terminal, inspectable state.
    pub fn fail(&mut self, error_message: impl Into<String>) -> Result<(), StagingError> {
        if self.status.is_terminal() {
            return Err(StagingError::InvalidTransition {
                from: self.status,
                to: StagingJobStatus::Failed,
            });
        }
        self.status = StagingJobStatus::Failed;
        self.error_message = Some(error_message.into());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    fn transition(
        &mut self,
        expected: StagingJobStatus,
        to: StagingJobStatus,
    ) -> Result<(), StagingError> {
        if self.status != expected {
            return Err(StagingError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_job() -> StagingJob {
        StagingJob::new(
            OrganizationId::new(),
            "uploads/living-room.jpg",
            "warm wood tones",
            StagingStyle::Modern,
        )
        .unwrap()
    }

    #[test]
    fn new_job_starts_pending() {
        let job = pending_job();
        assert_eq!(job.status(), StagingJobStatus::Pending);
        assert!(job.reservation_id().is_none());
        assert!(job.staged_image_ref().is_none());
    }

    #[test]
    fn empty_room_image_ref_is_rejected() {
        let result = StagingJob::new(OrganizationId::new(), "   ", "", StagingStyle::Coastal);
        assert!(matches!(result, Err(StagingError::Validation { .. })));
    }

    #[test]
    fn happy_path_walks_the_full_lifecycle() {
        let mut job = pending_job();
        let reservation_id = ReservationId::new();
        job.reserve(reservation_id).unwrap();
        assert_eq!(job.status(), StagingJobStatus::Reserved);
        assert_eq!(job.reservation_id(), Some(&reservation_id));

        job.start_processing().unwrap();
        assert_eq!(job.status(), StagingJobStatus::Processing);

        job.complete("staged/living-room.jpg", 42).unwrap();
        assert_eq!(job.status(), StagingJobStatus::Completed);
        assert_eq!(job.staged_image_ref(), Some("staged/living-room.jpg"));
        assert_eq!(job.ai_cost_cents(), Some(42));
    }

    #[test]
    fn cannot_process_before_reserving() {
        let mut job = pending_job();
        assert!(matches!(
            job.start_processing(),
            Err(StagingError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn cannot_complete_without_processing() {
        let mut job = pending_job();
        job.reserve(ReservationId::new()).unwrap();
        assert!(matches!(
            job.complete("staged/x.jpg", 1),
            Err(StagingError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn fail_is_reachable_from_any_non_terminal_state() {
        let mut pending = pending_job();
        pending.fail("validation blew up").unwrap();
        assert_eq!(pending.status(), StagingJobStatus::Failed);
        assert_eq!(pending.error_message(), Some("validation blew up"));

        let mut processing = pending_job();
        processing.reserve(ReservationId::new()).unwrap();
        processing.start_processing().unwrap();
        processing.fail("provider timed out").unwrap();
        assert_eq!(processing.status(), StagingJobStatus::Failed);
    }

    #[test]
    fn terminal_states_are_immutable() {
        let mut job = pending_job();
        job.reserve(ReservationId::new()).unwrap();
        job.start_processing().unwrap();
        job.complete("staged/x.jpg", 10).unwrap();

        assert!(job.fail("too late").is_err());
        assert!(job.start_processing().is_err());

        let mut failed = pending_job();
        failed.fail("boom").unwrap();
        assert!(failed.fail("boom again").is_err());
    }
}
