//! HTTP adapter for billing endpoints: payment webhook and credit balance.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingHandlers;
pub use routes::billing_routes;
