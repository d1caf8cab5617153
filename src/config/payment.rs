//! Payment provider configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider configuration (webhook verification, credit grants)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Webhook signing secret shared with the payment provider
    pub webhook_secret: String,

    /// Credits seeded when an account is first opened
    #[serde(default)]
    pub signup_bonus: i64,
}

impl PaymentConfig {
    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_WEBHOOK_SECRET"));
        }
        if self.signup_bonus < 0 {
            return Err(ValidationError::InvalidSignupBonus);
        }
        Ok(())
    }
}
