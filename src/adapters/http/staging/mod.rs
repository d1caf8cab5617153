//! HTTP adapter for staging job endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::StagingHandlers;
pub use routes::staging_routes;
