//! HTTP handlers for billing endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::application::handlers::billing::{
    GetCreditBalanceHandler, GetCreditBalanceQuery, ProcessPaymentWebhookCommand,
    ProcessPaymentWebhookHandler, ProcessPaymentWebhookResult,
};
use crate::domain::foundation::OrganizationId;

use super::dto::{CreditBalanceResponse, ErrorResponse, LedgerEntryResponse};

/// Header carrying the payment provider's request signature.
pub const SIGNATURE_HEADER: &str = "Payment-Signature";

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct BillingHandlers {
    webhook_handler: Arc<ProcessPaymentWebhookHandler>,
    balance_handler: Arc<GetCreditBalanceHandler>,
}

impl BillingHandlers {
    pub fn new(
        webhook_handler: Arc<ProcessPaymentWebhookHandler>,
        balance_handler: Arc<GetCreditBalanceHandler>,
    ) -> Self {
        Self {
            webhook_handler,
            balance_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/payment - Receive a payment provider event
///
/// The raw body bytes are passed through untouched; the signature covers
/// the exact payload the provider sent, so re-serialization would break
/// verification. Status codes drive the provider's redelivery: 2xx
/// acknowledges, 4xx drops, 5xx redelivers.
pub async fn process_payment_webhook(
    State(handlers): State<BillingHandlers>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok()) {
        Some(s) => s.to_string(),
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Missing Payment-Signature header"
                })),
            )
                .into_response()
        }
    };

    let cmd = ProcessPaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match handlers.webhook_handler.handle(cmd).await {
        Ok(ProcessPaymentWebhookResult::Applied { balance_after }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "applied",
                "balance_after": balance_after,
            })),
        )
            .into_response(),
        Ok(ProcessPaymentWebhookResult::Duplicate) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "duplicate" })),
        )
            .into_response(),
        Ok(ProcessPaymentWebhookResult::Rejected) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "rejected" })),
        )
            .into_response(),
        Ok(ProcessPaymentWebhookResult::Ignored) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ignored" })),
        )
            .into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                tracing::error!(error = %e, "webhook processing failed");
            }
            (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}

/// GET /api/organizations/:id/credits - Credit balance and ledger history
pub async fn get_credit_balance(
    State(handlers): State<BillingHandlers>,
    Path(id): Path<String>,
) -> Response {
    let organization_id = match id.parse::<OrganizationId>() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("Invalid organization ID")),
            )
                .into_response()
        }
    };

    let query = GetCreditBalanceQuery { organization_id };

    match handlers.balance_handler.handle(query).await {
        Ok(Some(view)) => {
            let response = CreditBalanceResponse {
                balance: view.balance,
                entries: view.entries.iter().map(LedgerEntryResponse::from).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Credit account", &id)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "balance lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("An unexpected error occurred")),
            )
                .into_response()
        }
    }
}
