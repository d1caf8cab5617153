//! Billing handlers.

mod get_credit_balance;
mod process_payment_webhook;

pub use get_credit_balance::{CreditBalanceView, GetCreditBalanceHandler, GetCreditBalanceQuery};
pub use process_payment_webhook::{
    ProcessPaymentWebhookCommand, ProcessPaymentWebhookHandler, ProcessPaymentWebhookResult,
};
