//! In-memory implementation of the CreditLedger port.
//!
//! All ledger state lives behind one async mutex, so every operation is
//! linearized exactly like the Postgres adapter's row-locked transactions.
//! Applied grants are recorded through the shared payment event repository,
//! whose uniqueness check doubles as the grant deduplication mechanism.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::adapters::memory::InMemoryPaymentEventRepository;
use crate::domain::billing::PaymentEvent;
use crate::domain::foundation::{OrganizationId, ReservationId, StagingJobId};
use crate::domain::ledger::{
    CreditAccount, LedgerEntry, LedgerError, Reservation, TransitionOutcome,
};
use crate::ports::{
    CommitOutcome, CreditLedger, GrantOutcome, PaymentEventRepository, RefundOutcome, SaveResult,
};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<OrganizationId, CreditAccount>,
    reservations: HashMap<ReservationId, Reservation>,
    entries: HashMap<OrganizationId, Vec<LedgerEntry>>,
}

/// In-memory credit ledger.
pub struct InMemoryCreditLedger {
    state: Mutex<LedgerState>,
    payment_events: Arc<InMemoryPaymentEventRepository>,
}

impl InMemoryCreditLedger {
    pub fn new(payment_events: Arc<InMemoryPaymentEventRepository>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            payment_events,
        }
    }

    async fn apply_grant(
        &self,
        state: &mut LedgerState,
        organization_id: &OrganizationId,
        credits: i64,
        external_event_id: &str,
        amount_cents: i64,
    ) -> Result<GrantOutcome, LedgerError> {
        let account = state
            .accounts
            .get_mut(organization_id)
            .ok_or(LedgerError::AccountNotFound(*organization_id))?;

        let record = PaymentEvent::applied(external_event_id, *organization_id, credits, amount_cents);
        match self
            .payment_events
            .save(&record)
            .await
            .map_err(|e| LedgerError::storage(e.to_string()))?
        {
            SaveResult::AlreadyExists => return Ok(GrantOutcome::AlreadyApplied),
            SaveResult::Inserted => {}
        }

        account.credit(credits)?;
        let balance_after = account.balance();
        state
            .entries
            .entry(*organization_id)
            .or_default()
            .push(LedgerEntry::grant(
                *organization_id,
                credits,
                external_event_id,
                balance_after,
            ));
        Ok(GrantOutcome::Applied { balance_after })
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn open_account(
        &self,
        organization_id: &OrganizationId,
        signup_bonus: i64,
    ) -> Result<i64, LedgerError> {
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(organization_id) {
            return Err(LedgerError::AccountAlreadyExists(*organization_id));
        }
        let account = CreditAccount::open(*organization_id, 0)?;
        state.accounts.insert(*organization_id, account);

        if signup_bonus > 0 {
            let event_id = format!("signup:{}", organization_id);
            self.apply_grant(&mut state, organization_id, signup_bonus, &event_id, 0)
                .await?;
        }

        let balance = state
            .accounts
            .get(organization_id)
            .map(CreditAccount::balance)
            .unwrap_or(0);
        Ok(balance)
    }

    async fn balance(&self, organization_id: &OrganizationId) -> Result<i64, LedgerError> {
        let state = self.state.lock().await;
        state
            .accounts
            .get(organization_id)
            .map(CreditAccount::balance)
            .ok_or(LedgerError::AccountNotFound(*organization_id))
    }

    async fn reserve(
        &self,
        organization_id: &OrganizationId,
        amount: i64,
        job_id: &StagingJobId,
    ) -> Result<ReservationId, LedgerError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(organization_id)
            .ok_or(LedgerError::AccountNotFound(*organization_id))?;

        account.debit(amount)?;
        let balance_after = account.balance();

        let reservation = Reservation::hold(*organization_id, amount, *job_id);
        let reservation_id = *reservation.id();
        state.reservations.insert(reservation_id, reservation);
        state
            .entries
            .entry(*organization_id)
            .or_default()
            .push(LedgerEntry::reserve(
                *organization_id,
                amount,
                *job_id,
                balance_after,
            ));
        Ok(reservation_id)
    }

    async fn commit(&self, reservation_id: &ReservationId) -> Result<CommitOutcome, LedgerError> {
        let mut state = self.state.lock().await;
        let reservation = state
            .reservations
            .get_mut(reservation_id)
            .ok_or(LedgerError::ReservationNotFound(*reservation_id))?;

        match reservation.commit()? {
            TransitionOutcome::AlreadyApplied => Ok(CommitOutcome::AlreadyCommitted),
            TransitionOutcome::Applied => {
                let organization_id = *reservation.organization_id();
                let job_id = *reservation.job_id();
                let balance_after = state
                    .accounts
                    .get(&organization_id)
                    .map(CreditAccount::balance)
                    .ok_or(LedgerError::AccountNotFound(organization_id))?;
                state
                    .entries
                    .entry(organization_id)
                    .or_default()
                    .push(LedgerEntry::commit(
                        organization_id,
                        Some(job_id),
                        balance_after,
                    ));
                Ok(CommitOutcome::Committed)
            }
        }
    }

    async fn refund(&self, reservation_id: &ReservationId) -> Result<RefundOutcome, LedgerError> {
        let mut state = self.state.lock().await;
        let reservation = state
            .reservations
            .get_mut(reservation_id)
            .ok_or(LedgerError::ReservationNotFound(*reservation_id))?;

        match reservation.refund()? {
            TransitionOutcome::AlreadyApplied => Ok(RefundOutcome::AlreadyRefunded),
            TransitionOutcome::Applied => {
                let organization_id = *reservation.organization_id();
                let amount = reservation.amount();
                let job_id = *reservation.job_id();
                let account = state
                    .accounts
                    .get_mut(&organization_id)
                    .ok_or(LedgerError::AccountNotFound(organization_id))?;
                account.credit(amount)?;
                let balance_after = account.balance();
                state
                    .entries
                    .entry(organization_id)
                    .or_default()
                    .push(LedgerEntry::refund(
                        organization_id,
                        amount,
                        Some(job_id),
                        balance_after,
                    ));
                Ok(RefundOutcome::Refunded { balance_after })
            }
        }
    }

    async fn grant(
        &self,
        organization_id: &OrganizationId,
        credits: i64,
        external_event_id: &str,
        amount_cents: i64,
    ) -> Result<GrantOutcome, LedgerError> {
        let mut state = self.state.lock().await;
        self.apply_grant(
            &mut state,
            organization_id,
            credits,
            external_event_id,
            amount_cents,
        )
        .await
    }

    async fn entries(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .get(organization_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::sum_amounts;
    use proptest::prelude::*;

    fn ledger() -> InMemoryCreditLedger {
        InMemoryCreditLedger::new(Arc::new(InMemoryPaymentEventRepository::new()))
    }

    async fn ledger_with_balance(balance: i64) -> (InMemoryCreditLedger, OrganizationId) {
        let ledger = ledger();
        let org = OrganizationId::new();
        ledger.open_account(&org, 0).await.unwrap();
        if balance > 0 {
            ledger.grant(&org, balance, "evt_seed", 0).await.unwrap();
        }
        (ledger, org)
    }

    // ══════════════════════════════════════════════════════════════
    // Account Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn open_account_with_signup_bonus() {
        let ledger = ledger();
        let org = OrganizationId::new();

        let balance = ledger.open_account(&org, 3).await.unwrap();

        assert_eq!(balance, 3);
        assert_eq!(ledger.balance(&org).await.unwrap(), 3);
        let entries = ledger.entries(&org).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, 3);
    }

    #[tokio::test]
    async fn open_account_twice_fails() {
        let ledger = ledger();
        let org = OrganizationId::new();
        ledger.open_account(&org, 0).await.unwrap();

        assert!(matches!(
            ledger.open_account(&org, 0).await,
            Err(LedgerError::AccountAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn balance_of_unknown_account_fails() {
        let err = ledger().balance(&OrganizationId::new()).await.unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
    }

    // ══════════════════════════════════════════════════════════════
    // Reserve Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn reserve_debits_and_writes_entry() {
        let (ledger, org) = ledger_with_balance(10).await;

        ledger.reserve(&org, 1, &StagingJobId::new()).await.unwrap();

        assert_eq!(ledger.balance(&org).await.unwrap(), 9);
        let entries = ledger.entries(&org).await.unwrap();
        assert_eq!(entries.last().unwrap().amount, -1);
        assert_eq!(entries.last().unwrap().balance_after, 9);
    }

    #[tokio::test]
    async fn reserve_with_empty_balance_fails_cleanly() {
        let (ledger, org) = ledger_with_balance(0).await;

        let err = ledger
            .reserve(&org, 1, &StagingJobId::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientCredits { remaining: 0, .. }
        ));
        // No trace in the ledger.
        assert_eq!(ledger.entries(&org).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn concurrent_reserves_on_last_credit_admit_exactly_one() {
        let (ledger, org) = ledger_with_balance(1).await;
        let ledger = Arc::new(ledger);

        let a = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.reserve(&org, 1, &StagingJobId::new()).await })
        };
        let b = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.reserve(&org, 1, &StagingJobId::new()).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let insufficient = results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::InsufficientCredits { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);
        assert_eq!(ledger.balance(&org).await.unwrap(), 0);
    }

    // ══════════════════════════════════════════════════════════════
    // Commit / Refund Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn commit_writes_zero_entry_without_moving_balance() {
        let (ledger, org) = ledger_with_balance(10).await;
        let reservation = ledger.reserve(&org, 1, &StagingJobId::new()).await.unwrap();

        let outcome = ledger.commit(&reservation).await.unwrap();

        assert_eq!(outcome, CommitOutcome::Committed);
        assert_eq!(ledger.balance(&org).await.unwrap(), 9);
        let entries = ledger.entries(&org).await.unwrap();
        assert_eq!(entries.last().unwrap().amount, 0);
    }

    #[tokio::test]
    async fn commit_twice_is_idempotent() {
        let (ledger, org) = ledger_with_balance(10).await;
        let reservation = ledger.reserve(&org, 1, &StagingJobId::new()).await.unwrap();

        ledger.commit(&reservation).await.unwrap();
        let outcome = ledger.commit(&reservation).await.unwrap();

        assert_eq!(outcome, CommitOutcome::AlreadyCommitted);
        let entries = ledger.entries(&org).await.unwrap();
        assert_eq!(sum_amounts(&entries), 9);
    }

    #[tokio::test]
    async fn refund_restores_balance() {
        let (ledger, org) = ledger_with_balance(10).await;
        let reservation = ledger.reserve(&org, 1, &StagingJobId::new()).await.unwrap();

        let outcome = ledger.refund(&reservation).await.unwrap();

        assert_eq!(outcome, RefundOutcome::Refunded { balance_after: 10 });
        assert_eq!(ledger.balance(&org).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn refund_twice_credits_once() {
        let (ledger, org) = ledger_with_balance(10).await;
        let reservation = ledger.reserve(&org, 1, &StagingJobId::new()).await.unwrap();

        ledger.refund(&reservation).await.unwrap();
        let outcome = ledger.refund(&reservation).await.unwrap();

        assert_eq!(outcome, RefundOutcome::AlreadyRefunded);
        assert_eq!(ledger.balance(&org).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn refund_after_commit_is_invariant_violation() {
        let (ledger, org) = ledger_with_balance(10).await;
        let reservation = ledger.reserve(&org, 1, &StagingJobId::new()).await.unwrap();
        ledger.commit(&reservation).await.unwrap();

        assert!(matches!(
            ledger.refund(&reservation).await,
            Err(LedgerError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn commit_unknown_reservation_fails() {
        let (ledger, _org) = ledger_with_balance(10).await;
        assert!(matches!(
            ledger.commit(&ReservationId::new()).await,
            Err(LedgerError::ReservationNotFound(_))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Grant Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn grant_applies_once_per_event_id() {
        let (ledger, org) = ledger_with_balance(0).await;

        let first = ledger.grant(&org, 10, "evt_1", 999).await.unwrap();
        let second = ledger.grant(&org, 10, "evt_1", 999).await.unwrap();

        assert_eq!(first, GrantOutcome::Applied { balance_after: 10 });
        assert_eq!(second, GrantOutcome::AlreadyApplied);
        assert_eq!(ledger.balance(&org).await.unwrap(), 10);
        // Exactly one grant entry.
        let entries = ledger.entries(&org).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn grant_to_unknown_account_fails() {
        let err = ledger()
            .grant(&OrganizationId::new(), 10, "evt_1", 999)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
    }

    // ══════════════════════════════════════════════════════════════
    // Invariant Properties
    // ══════════════════════════════════════════════════════════════

    #[derive(Debug, Clone)]
    enum Op {
        Grant { credits: i64, event: u8 },
        ReserveThenCommit { amount: i64 },
        ReserveThenRefund { amount: i64 },
        ReserveOnly { amount: i64 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..20, any::<u8>()).prop_map(|(credits, event)| Op::Grant { credits, event }),
            (1i64..5).prop_map(|amount| Op::ReserveThenCommit { amount }),
            (1i64..5).prop_map(|amount| Op::ReserveThenRefund { amount }),
            (1i64..5).prop_map(|amount| Op::ReserveOnly { amount }),
        ]
    }

    proptest! {
        /// Any sequence of ledger operations keeps the balance non-negative
        /// and equal to the sum of entry amounts.
        #[test]
        fn balance_never_negative_and_entries_conserve(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let (ledger, org) = ledger_with_balance(0).await;

                for (i, op) in ops.into_iter().enumerate() {
                    match op {
                        Op::Grant { credits, event } => {
                            // Duplicate event ids are expected and must no-op.
                            let _ = ledger
                                .grant(&org, credits, &format!("evt_{}", event), 0)
                                .await
                                .unwrap();
                        }
                        Op::ReserveThenCommit { amount } => {
                            if let Ok(id) = ledger.reserve(&org, amount, &StagingJobId::new()).await {
                                ledger.commit(&id).await.unwrap();
                            }
                        }
                        Op::ReserveThenRefund { amount } => {
                            if let Ok(id) = ledger.reserve(&org, amount, &StagingJobId::new()).await {
                                ledger.refund(&id).await.unwrap();
                            }
                        }
                        Op::ReserveOnly { amount } => {
                            let _ = ledger.reserve(&org, amount, &StagingJobId::new()).await;
                        }
                    }

                    let balance = ledger.balance(&org).await.unwrap();
                    let entries = ledger.entries(&org).await.unwrap();
                    prop_assert!(balance >= 0, "balance went negative at op {}", i);
                    prop_assert_eq!(sum_amounts(&entries), balance);
                }
                Ok(())
            })?;
        }
    }
}
