//! Reservation - a provisional debit held while staging work is in flight.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrganizationId, ReservationId, StagingJobId, Timestamp};

use super::LedgerError;

/// Lifecycle of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    /// Credits debited, outcome of the staging attempt unknown.
    Held,
    /// Attempt succeeded; the debit is final.
    Committed,
    /// Attempt failed; the debit was reversed.
    Refunded,
}

/// Outcome of applying commit/refund to a reservation.
///
/// `AlreadyApplied` means the reservation was already in the target state:
/// the caller must not write a second entry or touch the balance again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    AlreadyApplied,
}

/// A provisional debit against one account.
///
/// The state machine guards idempotence: committing twice or refunding twice
/// is a no-op, while crossing the two terminal states (refund after commit or
/// commit after refund) is an invariant violation — it would double-spend or
/// double-credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    organization_id: OrganizationId,
    amount: i64,
    job_id: StagingJobId,
    state: ReservationState,
    created_at: Timestamp,
}

impl Reservation {
    /// Creates a freshly-held reservation.
    pub fn hold(organization_id: OrganizationId, amount: i64, job_id: StagingJobId) -> Self {
        Self {
            id: ReservationId::new(),
            organization_id,
            amount,
            job_id,
            state: ReservationState::Held,
            created_at: Timestamp::now(),
        }
    }

    /// Rebuilds a reservation from persisted state.
    pub fn reconstitute(
        id: ReservationId,
        organization_id: OrganizationId,
        amount: i64,
        job_id: StagingJobId,
        state: ReservationState,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            organization_id,
            amount,
            job_id,
            state,
            created_at,
        }
    }

    pub fn id(&self) -> &ReservationId {
        &self.id
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn job_id(&self) -> &StagingJobId {
        &self.job_id
    }

    pub fn state(&self) -> ReservationState {
        self.state
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Marks the reservation final. Idempotent when already committed.
    pub fn commit(&mut self) -> Result<TransitionOutcome, LedgerError> {
        match self.state {
            ReservationState::Held => {
                self.state = ReservationState::Committed;
                Ok(TransitionOutcome::Applied)
            }
            ReservationState::Committed => Ok(TransitionOutcome::AlreadyApplied),
            ReservationState::Refunded => Err(LedgerError::invariant(format!(
                "commit of refunded reservation {}",
                self.id
            ))),
        }
    }

    /// Reverses the reservation. Idempotent when already refunded; a refund
    /// of a committed reservation is the double-credit case and is rejected.
    pub fn refund(&mut self) -> Result<TransitionOutcome, LedgerError> {
        match self.state {
            ReservationState::Held => {
                self.state = ReservationState::Refunded;
                Ok(TransitionOutcome::Applied)
            }
            ReservationState::Refunded => Ok(TransitionOutcome::AlreadyApplied),
            ReservationState::Committed => Err(LedgerError::invariant(format!(
                "refund of committed reservation {}",
                self.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held_reservation() -> Reservation {
        Reservation::hold(OrganizationId::new(), 1, StagingJobId::new())
    }

    #[test]
    fn new_reservation_is_held() {
        let reservation = held_reservation();
        assert_eq!(reservation.state(), ReservationState::Held);
        assert_eq!(reservation.amount(), 1);
    }

    #[test]
    fn commit_finalizes_held_reservation() {
        let mut reservation = held_reservation();
        assert_eq!(reservation.commit().unwrap(), TransitionOutcome::Applied);
        assert_eq!(reservation.state(), ReservationState::Committed);
    }

    #[test]
    fn commit_twice_is_idempotent() {
        let mut reservation = held_reservation();
        reservation.commit().unwrap();
        assert_eq!(
            reservation.commit().unwrap(),
            TransitionOutcome::AlreadyApplied
        );
    }

    #[test]
    fn refund_reverses_held_reservation() {
        let mut reservation = held_reservation();
        assert_eq!(reservation.refund().unwrap(), TransitionOutcome::Applied);
        assert_eq!(reservation.state(), ReservationState::Refunded);
    }

    #[test]
    fn refund_twice_is_idempotent_no_double_credit() {
        let mut reservation = held_reservation();
        reservation.refund().unwrap();
        assert_eq!(
            reservation.refund().unwrap(),
            TransitionOutcome::AlreadyApplied
        );
    }

    #[test]
    fn refund_after_commit_is_invariant_violation() {
        let mut reservation = held_reservation();
        reservation.commit().unwrap();
        assert!(matches!(
            reservation.refund(),
            Err(LedgerError::InvariantViolation(_))
        ));
    }

    #[test]
    fn commit_after_refund_is_invariant_violation() {
        let mut reservation = held_reservation();
        reservation.refund().unwrap();
        assert!(matches!(
            reservation.commit(),
            Err(LedgerError::InvariantViolation(_))
        ));
    }
}
