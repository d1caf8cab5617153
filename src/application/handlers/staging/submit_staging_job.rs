//! SubmitStagingJobHandler - the staging job orchestrator.
//!
//! Drives one staging attempt end-to-end with a reserve-before-call /
//! refund-on-failure credit flow:
//!
//! 1. Validate the request and build a pending job.
//! 2. Reserve one credit. Insufficient credits reject the request before
//!    anything is persisted.
//! 3. Persist the job in `processing`. The reserve transaction has already
//!    committed, so no database lock is held across the provider call.
//! 4. Call the AI provider under a deadline.
//! 5. On success: store the artifact, complete the job, commit the
//!    reservation.
//! 6. On any downstream failure: mark the job `failed` and refund the
//!    reservation. A timed-out provider call is abandoned; a late result is
//!    discarded.
//!
//! There is no automatic retry. A retry is a new submission that reserves a
//! fresh credit.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::OrganizationId;
use crate::domain::ledger::LedgerError;
use crate::domain::staging::{StagingError, StagingJob, StagingStyle};
use crate::ports::{AiProvider, AiProviderError, CreditLedger, ObjectStore, StagingJobRepository};

/// Credits debited per staging attempt. The provider's variable cost in
/// cents is recorded on the job but never changes this debit.
const CREDITS_PER_JOB: i64 = 1;

/// Command to submit a staging job.
#[derive(Debug, Clone)]
pub struct SubmitStagingJobCommand {
    pub organization_id: OrganizationId,
    pub room_image_ref: String,
    pub prompt: String,
    pub style: StagingStyle,
}

/// Handler orchestrating a single staging attempt.
pub struct SubmitStagingJobHandler {
    ledger: Arc<dyn CreditLedger>,
    jobs: Arc<dyn StagingJobRepository>,
    provider: Arc<dyn AiProvider>,
    store: Arc<dyn ObjectStore>,
    provider_timeout: Duration,
}

impl SubmitStagingJobHandler {
    pub fn new(
        ledger: Arc<dyn CreditLedger>,
        jobs: Arc<dyn StagingJobRepository>,
        provider: Arc<dyn AiProvider>,
        store: Arc<dyn ObjectStore>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            jobs,
            provider,
            store,
            provider_timeout,
        }
    }

    /// Runs one staging attempt.
    ///
    /// Returns the job in its terminal (or committed-in-flight) state. A
    /// failed provider call is not an error at this level: the job comes
    /// back `failed` with the credit already refunded. Errors are reserved
    /// for requests that never became a persisted job (validation,
    /// insufficient credits), for persistence failures after the credit has
    /// been refunded, and for refund failures, which must surface as a 5xx
    /// so the held reservation is reconciled.
    pub async fn handle(&self, cmd: SubmitStagingJobCommand) -> Result<StagingJob, StagingError> {
        let mut job =
            StagingJob::new(cmd.organization_id, cmd.room_image_ref, cmd.prompt, cmd.style)?;

        // 1. Reserve before anything else. No job row exists if this fails.
        let reservation_id = match self
            .ledger
            .reserve(&cmd.organization_id, CREDITS_PER_JOB, job.id())
            .await
        {
            Ok(id) => id,
            // An organization that never opened an account has zero credits.
            Err(LedgerError::AccountNotFound(_)) => {
                return Err(StagingError::InsufficientCredits { remaining: 0 })
            }
            Err(e) => return Err(e.into()),
        };

        job.reserve(reservation_id)?;
        job.start_processing()?;

        // 2. Persist in `processing`. If this fails the credit must come back.
        if let Err(e) = self.jobs.insert(&job).await {
            self.refund_or_escalate(&job, &reservation_id).await?;
            return Err(StagingError::infrastructure(e));
        }

        // 3. Provider call, outside any ledger transaction, under a deadline.
        let outcome = tokio::time::timeout(
            self.provider_timeout,
            self.provider
                .stage(job.room_image_ref(), job.prompt(), job.style()),
        )
        .await;

        let staged = match outcome {
            Ok(Ok(staged)) => staged,
            Ok(Err(e)) => return self.fail_and_refund(job, &reservation_id, e.to_string()).await,
            Err(_) => {
                let message =
                    AiProviderError::Timeout(self.provider_timeout.as_secs()).to_string();
                return self.fail_and_refund(job, &reservation_id, message).await;
            }
        };

        // 4. Persist the artifact.
        let key = format!("staged/{}.jpg", job.id());
        let staged_image_ref = match self.store.put(&key, staged.image).await {
            Ok(object_ref) => object_ref,
            Err(e) => {
                return self
                    .fail_and_refund(job, &reservation_id, format!("artifact store: {}", e))
                    .await
            }
        };

        job.complete(staged_image_ref, staged.cost_cents)?;
        // If the completed state never persists, the stored row still says
        // processing and the caller gets an error with no usable result, so
        // the credit must come back just like any other downstream failure.
        if let Err(e) = self.jobs.update(&job).await {
            self.refund_or_escalate(&job, &reservation_id).await?;
            return Err(StagingError::infrastructure(e));
        }

        // 5. Finalize the reservation. The job already succeeded; a commit
        // failure leaves the reservation held for reconciliation but must
        // not fail the request - the balance is already correct.
        if let Err(e) = self.ledger.commit(&reservation_id).await {
            tracing::error!(
                job_id = %job.id(),
                reservation_id = %reservation_id,
                error = %e,
                "failed to commit reservation for completed job"
            );
        }

        Ok(job)
    }

    /// Marks the job failed, persists it, and refunds the reservation.
    async fn fail_and_refund(
        &self,
        mut job: StagingJob,
        reservation_id: &crate::domain::foundation::ReservationId,
        error_message: String,
    ) -> Result<StagingJob, StagingError> {
        tracing::warn!(
            job_id = %job.id(),
            error = %error_message,
            "staging attempt failed, refunding reservation"
        );

        job.fail(error_message)?;
        if let Err(e) = self.jobs.update(&job).await {
            tracing::error!(job_id = %job.id(), error = %e, "failed to persist failed job");
        }

        self.refund_or_escalate(&job, reservation_id).await?;
        Ok(job)
    }

    /// Refunds the reservation; a refund failure is escalated so the caller
    /// returns a 5xx and the held reservation can be reconciled later.
    async fn refund_or_escalate(
        &self,
        job: &StagingJob,
        reservation_id: &crate::domain::foundation::ReservationId,
    ) -> Result<(), StagingError> {
        if let Err(e) = self.ledger.refund(reservation_id).await {
            tracing::error!(
                job_id = %job.id(),
                reservation_id = %reservation_id,
                error = %e,
                "refund failed, reservation left held for reconciliation"
            );
            return Err(e.into());
        }
        Ok(())
    }
}
