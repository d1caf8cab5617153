//! Domain layer - business entities, value objects, and invariants.
//!
//! Modules:
//! - `foundation`: shared value objects (ids, timestamps, errors)
//! - `ledger`: credit accounts, reservations, and the audit trail
//! - `staging`: the staging-job aggregate and its state machine
//! - `billing`: payment-provider events and webhook verification

pub mod billing;
pub mod foundation;
pub mod ledger;
pub mod staging;
