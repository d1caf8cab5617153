//! PostgreSQL adapter implementations.

mod credit_ledger;
mod payment_event_repository;
mod staging_job_repository;

pub use credit_ledger::PostgresCreditLedger;
pub use payment_event_repository::PostgresPaymentEventRepository;
pub use staging_job_repository::PostgresStagingJobRepository;

/// True when the error is a Postgres unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().as_deref() == Some("23505");
    }
    false
}
