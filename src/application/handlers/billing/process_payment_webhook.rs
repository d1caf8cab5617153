//! ProcessPaymentWebhookHandler - idempotent webhook processing.
//!
//! The provider delivers events at-least-once, so every path here must be
//! safe to replay. Grant deduplication happens inside the ledger transaction
//! via the unique external event id; this handler only decides what each
//! event type means and keeps signature failures side-effect free.

use std::sync::Arc;

use crate::domain::billing::{
    PaymentEvent, PaymentEventType, PaymentProviderEvent, PaymentWebhookVerifier, WebhookError,
};
use crate::domain::foundation::OrganizationId;
use crate::domain::ledger::LedgerError;
use crate::ports::{CreditLedger, GrantOutcome, PaymentEventRepository};

/// Command carrying the raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessPaymentWebhookCommand {
    /// Raw request body, exactly as signed by the provider.
    pub payload: Vec<u8>,
    /// Payment-Signature header value.
    pub signature: String,
}

/// Outcome of processing one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessPaymentWebhookResult {
    /// Credits were granted.
    Applied { balance_after: i64 },
    /// The event id was seen before; nothing changed.
    Duplicate,
    /// Failed-payment event recorded, no balance change.
    Rejected,
    /// Unknown event type, acknowledged without action.
    Ignored,
}

/// Handler for payment provider webhooks.
pub struct ProcessPaymentWebhookHandler {
    verifier: PaymentWebhookVerifier,
    ledger: Arc<dyn CreditLedger>,
    payment_events: Arc<dyn PaymentEventRepository>,
    /// Credits seeded into an account opened on first payment.
    signup_bonus: i64,
}

impl ProcessPaymentWebhookHandler {
    pub fn new(
        verifier: PaymentWebhookVerifier,
        ledger: Arc<dyn CreditLedger>,
        payment_events: Arc<dyn PaymentEventRepository>,
        signup_bonus: i64,
    ) -> Self {
        Self {
            verifier,
            ledger,
            payment_events,
            signup_bonus,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessPaymentWebhookCommand,
    ) -> Result<ProcessPaymentWebhookResult, WebhookError> {
        // 1. Verify before anything touches storage.
        let event = self.verifier.verify_and_parse(&cmd.payload, &cmd.signature)?;

        let organization_id = parse_organization(&event)?;

        // 2. Dispatch on event type.
        match event.parsed_type() {
            PaymentEventType::PaymentSucceeded => {
                self.handle_payment_succeeded(&event, &organization_id).await
            }
            PaymentEventType::PaymentFailed => {
                self.handle_payment_failed(&event, &organization_id).await
            }
            PaymentEventType::Unknown => {
                tracing::warn!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    "ignoring unknown payment event type"
                );
                Ok(ProcessPaymentWebhookResult::Ignored)
            }
        }
    }

    async fn handle_payment_succeeded(
        &self,
        event: &PaymentProviderEvent,
        organization_id: &OrganizationId,
    ) -> Result<ProcessPaymentWebhookResult, WebhookError> {
        let credits = event.metadata.credits;
        if credits <= 0 {
            return Err(WebhookError::InvalidMetadata(format!(
                "credits must be positive, got {}",
                credits
            )));
        }

        let outcome = match self
            .ledger
            .grant(organization_id, credits, &event.event_id, event.amount_cents)
            .await
        {
            Ok(outcome) => outcome,
            // First payment from an organization we have not seen: open the
            // account lazily and replay the grant. The synthetic signup event
            // id keeps the bonus idempotent if two deliveries race here.
            Err(LedgerError::AccountNotFound(_)) => {
                match self
                    .ledger
                    .open_account(organization_id, self.signup_bonus)
                    .await
                {
                    Ok(_) | Err(LedgerError::AccountAlreadyExists(_)) => {}
                    Err(e) => return Err(map_ledger_error(e)),
                }
                self.ledger
                    .grant(organization_id, credits, &event.event_id, event.amount_cents)
                    .await
                    .map_err(map_ledger_error)?
            }
            Err(e) => return Err(map_ledger_error(e)),
        };

        match outcome {
            GrantOutcome::Applied { balance_after } => {
                tracing::info!(
                    event_id = %event.event_id,
                    organization_id = %organization_id,
                    credits,
                    balance_after,
                    "credits granted"
                );
                Ok(ProcessPaymentWebhookResult::Applied { balance_after })
            }
            GrantOutcome::AlreadyApplied => Ok(ProcessPaymentWebhookResult::Duplicate),
        }
    }

    async fn handle_payment_failed(
        &self,
        event: &PaymentProviderEvent,
        organization_id: &OrganizationId,
    ) -> Result<ProcessPaymentWebhookResult, WebhookError> {
        let record =
            PaymentEvent::rejected(&event.event_id, *organization_id, event.amount_cents);
        // AlreadyExists means a redelivery; both outcomes acknowledge.
        self.payment_events
            .save(&record)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?;
        Ok(ProcessPaymentWebhookResult::Rejected)
    }
}

fn parse_organization(event: &PaymentProviderEvent) -> Result<OrganizationId, WebhookError> {
    event.metadata.organization_id.parse().map_err(|_| {
        WebhookError::InvalidMetadata(format!(
            "organizationId is not a valid id: {}",
            event.metadata.organization_id
        ))
    })
}

fn map_ledger_error(err: LedgerError) -> WebhookError {
    match err {
        LedgerError::AccountNotFound(_) => WebhookError::AccountNotFound,
        other => WebhookError::Database(other.to_string()),
    }
}
