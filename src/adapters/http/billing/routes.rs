//! HTTP routes for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_credit_balance, process_payment_webhook, BillingHandlers};

/// Creates the billing router. Nested under `/api`.
pub fn billing_routes(handlers: BillingHandlers) -> Router {
    Router::new()
        .route("/webhooks/payment", post(process_payment_webhook))
        .route("/organizations/:id/credits", get(get_credit_balance))
        .with_state(handlers)
}
