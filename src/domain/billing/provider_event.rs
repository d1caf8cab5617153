//! Payment provider webhook event types.
//!
//! The provider delivers a camelCase JSON envelope; only the fields we
//! process are captured here.

use serde::{Deserialize, Serialize};

/// Webhook event envelope as delivered by the payment provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProviderEvent {
    /// Provider-unique identifier for the event. Used as the idempotency key.
    pub event_id: String,

    /// Type of event (e.g., "payment.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Amount paid, in cents.
    pub amount_cents: i64,

    /// Metadata attached at checkout time.
    pub metadata: PaymentMetadata,
}

/// Checkout metadata identifying the purchasing organization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    /// Organization whose account the purchased credits belong to.
    pub organization_id: String,

    /// Number of credits purchased.
    pub credits: i64,
}

impl PaymentProviderEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> PaymentEventType {
        PaymentEventType::parse(&self.event_type)
    }
}

/// Known provider event types that we handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventType {
    /// Payment settled; credits should be granted.
    PaymentSucceeded,
    /// Payment failed; recorded for audit, no balance change.
    PaymentFailed,
    /// Unknown or unhandled event type.
    Unknown,
}

impl PaymentEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "payment.succeeded" => Self::PaymentSucceeded,
            "payment.failed" => Self::PaymentFailed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentSucceeded => "payment.succeeded",
            Self::PaymentFailed => "payment.failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Builder for creating test events.
#[cfg(test)]
pub struct PaymentProviderEventBuilder {
    event_id: String,
    event_type: String,
    amount_cents: i64,
    organization_id: String,
    credits: i64,
}

#[cfg(test)]
impl Default for PaymentProviderEventBuilder {
    fn default() -> Self {
        Self {
            event_id: "evt_test_123".to_string(),
            event_type: "payment.succeeded".to_string(),
            amount_cents: 999,
            organization_id: uuid::Uuid::new_v4().to_string(),
            credits: 10,
        }
    }
}

#[cfg(test)]
impl PaymentProviderEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn amount_cents(mut self, amount_cents: i64) -> Self {
        self.amount_cents = amount_cents;
        self
    }

    pub fn organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = organization_id.into();
        self
    }

    pub fn credits(mut self, credits: i64) -> Self {
        self.credits = credits;
        self
    }

    pub fn build(self) -> PaymentProviderEvent {
        PaymentProviderEvent {
            event_id: self.event_id,
            event_type: self.event_type,
            amount_cents: self.amount_cents,
            metadata: PaymentMetadata {
                organization_id: self.organization_id,
                credits: self.credits,
            },
        }
    }
}
