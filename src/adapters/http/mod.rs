//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter for endpoint exposure.

pub mod billing;
pub mod middleware;
pub mod staging;

pub use billing::{billing_routes, BillingHandlers};
pub use staging::{staging_routes, StagingHandlers};
