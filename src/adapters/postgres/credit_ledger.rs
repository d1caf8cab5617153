//! PostgreSQL implementation of the CreditLedger port.
//!
//! Every operation runs in one transaction that it owns end-to-end. The
//! balance row is taken `FOR UPDATE` before any read-check-write sequence,
//! which linearizes operations per organization: two concurrent reserves
//! against a balance of 1 serialize on the row lock, and the second one sees
//! the drained balance. Grants are deduplicated by the unique index on
//! `payment_events.external_event_id` inside the same transaction that moves
//! the balance, so a redelivered webhook can never double-credit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::adapters::postgres::is_unique_violation;
use crate::domain::foundation::{
    LedgerEntryId, OrganizationId, ReservationId, StagingJobId, Timestamp,
};
use crate::domain::ledger::{
    LedgerEntry, LedgerEntryKind, LedgerError, Reservation, ReservationState, TransitionOutcome,
};
use crate::ports::{CommitOutcome, CreditLedger, GrantOutcome, RefundOutcome};

/// PostgreSQL credit ledger.
pub struct PostgresCreditLedger {
    pool: PgPool,
}

impl PostgresCreditLedger {
    /// Creates a new ledger backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    organization_id: Uuid,
    amount: i64,
    job_id: Uuid,
    state: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = LedgerError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation::reconstitute(
            ReservationId::from_uuid(row.id),
            OrganizationId::from_uuid(row.organization_id),
            row.amount,
            StagingJobId::from_uuid(row.job_id),
            parse_reservation_state(&row.state)?,
            Timestamp::from_datetime(row.created_at),
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerEntryRow {
    id: Uuid,
    organization_id: Uuid,
    kind: String,
    amount: i64,
    related_job_id: Option<Uuid>,
    related_payment_id: Option<String>,
    balance_after: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        Ok(LedgerEntry {
            id: LedgerEntryId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            kind: parse_entry_kind(&row.kind)?,
            amount: row.amount,
            related_job_id: row.related_job_id.map(StagingJobId::from_uuid),
            related_payment_id: row.related_payment_id,
            balance_after: row.balance_after,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_reservation_state(s: &str) -> Result<ReservationState, LedgerError> {
    match s {
        "held" => Ok(ReservationState::Held),
        "committed" => Ok(ReservationState::Committed),
        "refunded" => Ok(ReservationState::Refunded),
        _ => Err(LedgerError::storage(format!(
            "invalid reservation state: {}",
            s
        ))),
    }
}

fn reservation_state_to_str(state: ReservationState) -> &'static str {
    match state {
        ReservationState::Held => "held",
        ReservationState::Committed => "committed",
        ReservationState::Refunded => "refunded",
    }
}

fn parse_entry_kind(s: &str) -> Result<LedgerEntryKind, LedgerError> {
    match s {
        "reserve" => Ok(LedgerEntryKind::Reserve),
        "commit" => Ok(LedgerEntryKind::Commit),
        "refund" => Ok(LedgerEntryKind::Refund),
        "grant" => Ok(LedgerEntryKind::Grant),
        _ => Err(LedgerError::storage(format!("invalid entry kind: {}", s))),
    }
}

fn entry_kind_to_str(kind: LedgerEntryKind) -> &'static str {
    match kind {
        LedgerEntryKind::Reserve => "reserve",
        LedgerEntryKind::Commit => "commit",
        LedgerEntryKind::Refund => "refund",
        LedgerEntryKind::Grant => "grant",
    }
}

/// Locks the account's balance row and returns the balance.
async fn lock_balance(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    organization_id: &OrganizationId,
) -> Result<i64, LedgerError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT balance FROM credit_accounts WHERE organization_id = $1 FOR UPDATE")
            .bind(organization_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(LedgerError::storage)?;
    row.map(|(balance,)| balance)
        .ok_or(LedgerError::AccountNotFound(*organization_id))
}

async fn set_balance(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    organization_id: &OrganizationId,
    balance: i64,
) -> Result<(), LedgerError> {
    sqlx::query("UPDATE credit_accounts SET balance = $2, updated_at = NOW() WHERE organization_id = $1")
        .bind(organization_id.as_uuid())
        .bind(balance)
        .execute(&mut **tx)
        .await
        .map_err(LedgerError::storage)?;
    Ok(())
}

async fn insert_entry(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: &LedgerEntry,
) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        INSERT INTO ledger_entries (
            id, organization_id, kind, amount, related_job_id,
            related_payment_id, balance_after, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.organization_id.as_uuid())
    .bind(entry_kind_to_str(entry.kind))
    .bind(entry.amount)
    .bind(entry.related_job_id.as_ref().map(|id| *id.as_uuid()))
    .bind(&entry.related_payment_id)
    .bind(entry.balance_after)
    .bind(entry.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(LedgerError::storage)?;
    Ok(())
}

/// Locks a reservation row and rebuilds the aggregate.
async fn lock_reservation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    reservation_id: &ReservationId,
) -> Result<Reservation, LedgerError> {
    let row: Option<ReservationRow> = sqlx::query_as(
        r#"
        SELECT id, organization_id, amount, job_id, state, created_at
        FROM reservations WHERE id = $1 FOR UPDATE
        "#,
    )
    .bind(reservation_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(LedgerError::storage)?;

    row.ok_or(LedgerError::ReservationNotFound(*reservation_id))?
        .try_into()
}

async fn set_reservation_state(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    reservation_id: &ReservationId,
    state: ReservationState,
) -> Result<(), LedgerError> {
    sqlx::query("UPDATE reservations SET state = $2 WHERE id = $1")
        .bind(reservation_id.as_uuid())
        .bind(reservation_state_to_str(state))
        .execute(&mut **tx)
        .await
        .map_err(LedgerError::storage)?;
    Ok(())
}

/// Inserts the applied payment event that deduplicates a grant.
///
/// Returns false when the external event id was already recorded, meaning
/// the grant must not be applied again.
async fn insert_applied_payment_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    organization_id: &OrganizationId,
    credits: i64,
    external_event_id: &str,
    amount_cents: i64,
) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        r#"
        INSERT INTO payment_events (
            external_event_id, organization_id, credits_granted,
            amount_cents, status, processed_at
        ) VALUES ($1, $2, $3, $4, 'applied', NOW())
        ON CONFLICT (external_event_id) DO NOTHING
        "#,
    )
    .bind(external_event_id)
    .bind(organization_id.as_uuid())
    .bind(credits)
    .bind(amount_cents)
    .execute(&mut **tx)
    .await
    .map_err(LedgerError::storage)?;

    Ok(result.rows_affected() == 1)
}

async fn apply_grant(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    organization_id: &OrganizationId,
    credits: i64,
    external_event_id: &str,
    amount_cents: i64,
) -> Result<GrantOutcome, LedgerError> {
    if credits <= 0 {
        return Err(LedgerError::invariant(format!(
            "grant amount must be positive, got {}",
            credits
        )));
    }

    let balance = lock_balance(tx, organization_id).await?;

    if !insert_applied_payment_event(tx, organization_id, credits, external_event_id, amount_cents)
        .await?
    {
        return Ok(GrantOutcome::AlreadyApplied);
    }

    let balance_after = balance + credits;
    set_balance(tx, organization_id, balance_after).await?;
    insert_entry(
        tx,
        &LedgerEntry::grant(*organization_id, credits, external_event_id, balance_after),
    )
    .await?;
    Ok(GrantOutcome::Applied { balance_after })
}

#[async_trait]
impl CreditLedger for PostgresCreditLedger {
    async fn open_account(
        &self,
        organization_id: &OrganizationId,
        signup_bonus: i64,
    ) -> Result<i64, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(LedgerError::storage)?;

        sqlx::query(
            r#"
            INSERT INTO credit_accounts (organization_id, balance, created_at, updated_at)
            VALUES ($1, 0, NOW(), NOW())
            "#,
        )
        .bind(organization_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::AccountAlreadyExists(*organization_id)
            } else {
                LedgerError::storage(e)
            }
        })?;

        let mut balance = 0;
        if signup_bonus > 0 {
            let event_id = format!("signup:{}", organization_id);
            if let GrantOutcome::Applied { balance_after } =
                apply_grant(&mut tx, organization_id, signup_bonus, &event_id, 0).await?
            {
                balance = balance_after;
            }
        }

        tx.commit().await.map_err(LedgerError::storage)?;
        Ok(balance)
    }

    async fn balance(&self, organization_id: &OrganizationId) -> Result<i64, LedgerError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT balance FROM credit_accounts WHERE organization_id = $1")
                .bind(organization_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(LedgerError::storage)?;
        row.map(|(balance,)| balance)
            .ok_or(LedgerError::AccountNotFound(*organization_id))
    }

    async fn reserve(
        &self,
        organization_id: &OrganizationId,
        amount: i64,
        job_id: &StagingJobId,
    ) -> Result<ReservationId, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invariant(format!(
                "reserve amount must be positive, got {}",
                amount
            )));
        }

        let mut tx = self.pool.begin().await.map_err(LedgerError::storage)?;

        let balance = lock_balance(&mut tx, organization_id).await?;
        if balance < amount {
            return Err(LedgerError::InsufficientCredits {
                remaining: balance,
                requested: amount,
            });
        }

        let balance_after = balance - amount;
        set_balance(&mut tx, organization_id, balance_after).await?;

        let reservation = Reservation::hold(*organization_id, amount, *job_id);
        sqlx::query(
            r#"
            INSERT INTO reservations (id, organization_id, amount, job_id, state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reservation.id().as_uuid())
        .bind(organization_id.as_uuid())
        .bind(amount)
        .bind(job_id.as_uuid())
        .bind(reservation_state_to_str(reservation.state()))
        .bind(reservation.created_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(LedgerError::storage)?;

        insert_entry(
            &mut tx,
            &LedgerEntry::reserve(*organization_id, amount, *job_id, balance_after),
        )
        .await?;

        let reservation_id = *reservation.id();
        tx.commit().await.map_err(LedgerError::storage)?;
        Ok(reservation_id)
    }

    async fn commit(&self, reservation_id: &ReservationId) -> Result<CommitOutcome, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(LedgerError::storage)?;

        let mut reservation = lock_reservation(&mut tx, reservation_id).await?;
        match reservation.commit()? {
            TransitionOutcome::AlreadyApplied => Ok(CommitOutcome::AlreadyCommitted),
            TransitionOutcome::Applied => {
                let organization_id = *reservation.organization_id();
                set_reservation_state(&mut tx, reservation_id, reservation.state()).await?;

                let balance = lock_balance(&mut tx, &organization_id).await?;
                insert_entry(
                    &mut tx,
                    &LedgerEntry::commit(organization_id, Some(*reservation.job_id()), balance),
                )
                .await?;

                tx.commit().await.map_err(LedgerError::storage)?;
                Ok(CommitOutcome::Committed)
            }
        }
    }

    async fn refund(&self, reservation_id: &ReservationId) -> Result<RefundOutcome, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(LedgerError::storage)?;

        let mut reservation = lock_reservation(&mut tx, reservation_id).await?;
        match reservation.refund()? {
            TransitionOutcome::AlreadyApplied => Ok(RefundOutcome::AlreadyRefunded),
            TransitionOutcome::Applied => {
                let organization_id = *reservation.organization_id();
                let amount = reservation.amount();
                set_reservation_state(&mut tx, reservation_id, reservation.state()).await?;

                let balance = lock_balance(&mut tx, &organization_id).await?;
                let balance_after = balance + amount;
                set_balance(&mut tx, &organization_id, balance_after).await?;
                insert_entry(
                    &mut tx,
                    &LedgerEntry::refund(
                        organization_id,
                        amount,
                        Some(*reservation.job_id()),
                        balance_after,
                    ),
                )
                .await?;

                tx.commit().await.map_err(LedgerError::storage)?;
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
        let mut tx = self.pool.begin().await.map_err(LedgerError::storage)?;
        let outcome = apply_grant(
            &mut tx,
            organization_id,
            credits,
            external_event_id,
            amount_cents,
        )
        .await?;
        tx.commit().await.map_err(LedgerError::storage)?;
        Ok(outcome)
    }

    async fn entries(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let rows: Vec<LedgerEntryRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, kind, amount, related_job_id,
                   related_payment_id, balance_after, created_at
            FROM ledger_entries
            WHERE organization_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(LedgerError::storage)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_state_roundtrips() {
        for state in [
            ReservationState::Held,
            ReservationState::Committed,
            ReservationState::Refunded,
        ] {
            let parsed = parse_reservation_state(reservation_state_to_str(state)).unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn unknown_reservation_state_is_storage_error() {
        assert!(matches!(
            parse_reservation_state("pending"),
            Err(LedgerError::Storage(_))
        ));
    }

    #[test]
    fn entry_kind_roundtrips() {
        for kind in [
            LedgerEntryKind::Reserve,
            LedgerEntryKind::Commit,
            LedgerEntryKind::Refund,
            LedgerEntryKind::Grant,
        ] {
            assert_eq!(parse_entry_kind(entry_kind_to_str(kind)).unwrap(), kind);
        }
    }

    #[test]
    fn reservation_row_rebuilds_aggregate() {
        let row = ReservationRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            amount: 1,
            job_id: Uuid::new_v4(),
            state: "held".to_string(),
            created_at: Utc::now(),
        };

        let reservation: Reservation = row.try_into().unwrap();
        assert_eq!(reservation.state(), ReservationState::Held);
        assert_eq!(reservation.amount(), 1);
    }
}
