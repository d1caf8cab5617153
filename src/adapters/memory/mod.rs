//! In-memory adapter implementations.
//!
//! Used by tests and local development where a database is unavailable.
//! The ledger linearizes all operations behind a single async mutex, which
//! gives the same per-account ordering guarantees the Postgres adapter gets
//! from row locks.

mod credit_ledger;
mod object_store;
mod payment_event_repository;
mod staging_job_repository;

pub use credit_ledger::InMemoryCreditLedger;
pub use object_store::InMemoryObjectStore;
pub use payment_event_repository::InMemoryPaymentEventRepository;
pub use staging_job_repository::InMemoryStagingJobRepository;
