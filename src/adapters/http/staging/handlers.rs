//! HTTP handlers for staging job endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::OrganizationContext;
use crate::application::handlers::staging::{
    GetStagingJobHandler, GetStagingJobQuery, SubmitStagingJobCommand, SubmitStagingJobHandler,
};
use crate::domain::foundation::StagingJobId;
use crate::domain::staging::StagingError;

use super::dto::{ErrorResponse, StagingJobResponse, SubmitStagingJobRequest};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct StagingHandlers {
    submit_handler: Arc<SubmitStagingJobHandler>,
    get_handler: Arc<GetStagingJobHandler>,
}

impl StagingHandlers {
    pub fn new(
        submit_handler: Arc<SubmitStagingJobHandler>,
        get_handler: Arc<GetStagingJobHandler>,
    ) -> Self {
        Self {
            submit_handler,
            get_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/staging-jobs - Submit a staging job
///
/// Returns 201 with the job in its terminal state. A provider failure is
/// not an HTTP error: the job comes back `failed` with the credit already
/// refunded. 402 means no job was created and nothing was charged.
pub async fn submit_staging_job(
    State(handlers): State<StagingHandlers>,
    OrganizationContext(organization_id): OrganizationContext,
    Json(req): Json<SubmitStagingJobRequest>,
) -> Response {
    let cmd = SubmitStagingJobCommand {
        organization_id,
        room_image_ref: req.room_image_ref,
        prompt: req.prompt,
        style: req.style,
    };

    match handlers.submit_handler.handle(cmd).await {
        Ok(job) => {
            let response = StagingJobResponse::from(&job);
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => handle_staging_error(e),
    }
}

/// GET /api/staging-jobs/:id - Get one staging job
pub async fn get_staging_job(
    State(handlers): State<StagingHandlers>,
    OrganizationContext(organization_id): OrganizationContext,
    Path(id): Path<String>,
) -> Response {
    let job_id = match id.parse::<StagingJobId>() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("Invalid job ID")),
            )
                .into_response()
        }
    };

    let query = GetStagingJobQuery {
        organization_id,
        job_id,
    };

    match handlers.get_handler.handle(query).await {
        Ok(Some(job)) => {
            let response = StagingJobResponse::from(&job);
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Staging job", &id)),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal(e.message)),
        )
            .into_response(),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_staging_error(error: StagingError) -> Response {
    match error {
        StagingError::InsufficientCredits { remaining } => (
            StatusCode::PAYMENT_REQUIRED,
            Json(serde_json::json!({
                "error": "insufficient_credits",
                "credits_remaining": remaining,
            })),
        )
            .into_response(),
        StagingError::Validation { .. } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(error.to_string())),
        )
            .into_response(),
        StagingError::NotFound(job_id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Staging job", &job_id.to_string())),
        )
            .into_response(),
        _ => {
            tracing::error!(error = %error, "staging request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("An unexpected error occurred")),
            )
                .into_response()
        }
    }
}
