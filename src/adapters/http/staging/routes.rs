//! HTTP routes for staging job endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_staging_job, submit_staging_job, StagingHandlers};

/// Creates the staging job router with all endpoints.
pub fn staging_routes(handlers: StagingHandlers) -> Router {
    Router::new()
        .route("/", post(submit_staging_job))
        .route("/:id", get(get_staging_job))
        .with_state(handlers)
}
