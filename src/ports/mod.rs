//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Ledger Ports
//!
//! - `CreditLedger` - The only interface allowed to mutate credit balances
//!
//! ## Persistence Ports
//!
//! - `StagingJobRepository` - Staging job storage
//! - `PaymentEventRepository` - Payment webhook audit trail and dedupe reads
//!
//! ## Collaborator Ports
//!
//! - `AiProvider` - External AI staging service
//! - `ObjectStore` - Binary storage for generated images

mod ai_provider;
mod credit_ledger;
mod object_store;
mod payment_event_repository;
mod staging_job_repository;

pub use ai_provider::{AiProvider, AiProviderError, StagedImage};
pub use credit_ledger::{CommitOutcome, CreditLedger, GrantOutcome, RefundOutcome};
pub use object_store::ObjectStore;
pub use payment_event_repository::{PaymentEventRepository, SaveResult};
pub use staging_job_repository::StagingJobRepository;
