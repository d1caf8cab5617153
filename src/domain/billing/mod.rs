//! Billing domain - payment provider events and webhook verification.

mod payment_event;
mod provider_event;
mod webhook_errors;
mod webhook_verifier;

pub use payment_event::{PaymentEvent, PaymentEventStatus};
pub use provider_event::{PaymentEventType, PaymentMetadata, PaymentProviderEvent};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{PaymentWebhookVerifier, SignatureHeader};

#[cfg(test)]
pub use provider_event::PaymentProviderEventBuilder;
#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
