//! Webhook error types for payment webhook handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing or malformed in the webhook event.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Referenced credit account could not be found.
    #[error("Credit account not found")]
    AccountNotFound,

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    ///
    /// Retryable errors indicate temporary failures that may succeed on
    /// subsequent attempts; redelivery is safe because `externalEventId`
    /// deduplication makes the grant idempotent.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_) | WebhookError::AccountNotFound
        )
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine the provider's retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Signature failures are treated as malformed deliveries: the
            // provider must not redeliver a payload that will never verify.
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,

            // Ignored events are acknowledged as success
            WebhookError::Ignored(_) => StatusCode::OK,

            // Server errors, provider will redeliver
            WebhookError::AccountNotFound | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Retryability Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn database_error_is_retryable() {
        let err = WebhookError::Database("connection failed".to_string());
        assert!(err.is_retryable());
    }

    #[test]
    fn account_not_found_is_retryable() {
        // Might be eventual consistency between signup and first purchase
        let err = WebhookError::AccountNotFound;
        assert!(err.is_retryable());
    }

    #[test]
    fn invalid_signature_is_not_retryable() {
        assert!(!WebhookError::InvalidSignature.is_retryable());
    }

    #[test]
    fn parse_error_is_not_retryable() {
        assert!(!WebhookError::ParseError("bad json".to_string()).is_retryable());
    }

    #[test]
    fn ignored_is_not_retryable() {
        assert!(!WebhookError::Ignored("already processed".to_string()).is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_returns_bad_request() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn timestamp_out_of_range_returns_bad_request() {
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_timestamp_returns_bad_request() {
        assert_eq!(
            WebhookError::InvalidTimestamp.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_metadata_returns_bad_request() {
        let err = WebhookError::InvalidMetadata("organizationId".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ignored_returns_ok() {
        // Ignored events must be acknowledged to stop redelivery
        let err = WebhookError::Ignored("not relevant".to_string());
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn database_error_returns_internal_error() {
        let err = WebhookError::Database("connection lost".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn account_not_found_returns_internal_error() {
        assert_eq!(
            WebhookError::AccountNotFound.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
