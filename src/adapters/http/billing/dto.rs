//! HTTP DTOs for billing endpoints.

use serde::Serialize;

use crate::domain::foundation::Timestamp;
use crate::domain::ledger::{LedgerEntry, LedgerEntryKind};

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// One ledger entry in an organization's history.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntryResponse {
    pub id: String,
    pub kind: LedgerEntryKind,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_payment_id: Option<String>,
    pub balance_after: i64,
    pub created_at: Timestamp,
}

impl From<&LedgerEntry> for LedgerEntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            kind: entry.kind,
            amount: entry.amount,
            related_job_id: entry.related_job_id.map(|id| id.to_string()),
            related_payment_id: entry.related_payment_id.clone(),
            balance_after: entry.balance_after,
            created_at: entry.created_at,
        }
    }
}

/// An organization's credit position.
#[derive(Debug, Clone, Serialize)]
pub struct CreditBalanceResponse {
    pub balance: i64,
    pub entries: Vec<LedgerEntryResponse>,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}
