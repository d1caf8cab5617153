//! HTTP DTOs for staging job endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::staging::{StagingJob, StagingStyle};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to submit a staging job.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitStagingJobRequest {
    pub room_image_ref: String,
    /// Free-text styling instructions passed through to the model. May be
    /// empty; the provider falls back to a style-derived prompt.
    #[serde(default)]
    pub prompt: String,
    pub style: StagingStyle,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// A staging job as exposed over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct StagingJobResponse {
    pub id: String,
    pub status: String,
    pub style: StagingStyle,
    pub room_image_ref: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged_image_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&StagingJob> for StagingJobResponse {
    fn from(job: &StagingJob) -> Self {
        Self {
            id: job.id().to_string(),
            status: job.status().as_str().to_string(),
            style: job.style(),
            room_image_ref: job.room_image_ref().to_string(),
            prompt: job.prompt().to_string(),
            staged_image_ref: job.staged_image_ref().map(String::from),
            error_message: job.error_message().map(String::from),
            created_at: *job.created_at(),
            updated_at: *job.updated_at(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}
