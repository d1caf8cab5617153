//! GetCreditBalanceHandler - balance and ledger history for one account.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, OrganizationId};
use crate::domain::ledger::{LedgerEntry, LedgerError};
use crate::ports::CreditLedger;

/// Query for an organization's credit position.
#[derive(Debug, Clone)]
pub struct GetCreditBalanceQuery {
    pub organization_id: OrganizationId,
}

/// Balance plus the entries that produced it, oldest first.
#[derive(Debug, Clone)]
pub struct CreditBalanceView {
    pub balance: i64,
    pub entries: Vec<LedgerEntry>,
}

/// Handler for the credit read surface.
pub struct GetCreditBalanceHandler {
    ledger: Arc<dyn CreditLedger>,
}

impl GetCreditBalanceHandler {
    pub fn new(ledger: Arc<dyn CreditLedger>) -> Self {
        Self { ledger }
    }

    /// Returns the account's view, or `None` when no account exists.
    pub async fn handle(
        &self,
        query: GetCreditBalanceQuery,
    ) -> Result<Option<CreditBalanceView>, DomainError> {
        let balance = match self.ledger.balance(&query.organization_id).await {
            Ok(balance) => balance,
            Err(LedgerError::AccountNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entries = self.ledger.entries(&query.organization_id).await?;
        Ok(Some(CreditBalanceView { balance, entries }))
    }
}
