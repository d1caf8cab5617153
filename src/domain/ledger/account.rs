//! CreditAccount - per-organization prepaid credit balance.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::OrganizationId;

use super::LedgerError;

/// Per-organization credit balance.
///
/// The balance is a non-negative integer number of credits; one credit pays
/// for one staging attempt. The only mutators are `debit` and `credit`, and
/// `debit` refuses to take the balance below zero, so the invariant
/// `balance >= 0` holds at every observable point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAccount {
    organization_id: OrganizationId,
    balance: i64,
}

impl CreditAccount {
    /// Opens an account with the given starting balance.
    pub fn open(organization_id: OrganizationId, starting_balance: i64) -> Result<Self, LedgerError> {
        if starting_balance < 0 {
            return Err(LedgerError::invariant(format!(
                "account for {} cannot open with negative balance {}",
                organization_id, starting_balance
            )));
        }
        Ok(Self {
            organization_id,
            balance: starting_balance,
        })
    }

    /// Rebuilds an account from persisted state.
    pub fn reconstitute(organization_id: OrganizationId, balance: i64) -> Self {
        Self {
            organization_id,
            balance,
        }
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Removes `amount` credits from the spendable balance.
    ///
    /// Fails with `InsufficientCredits` when the balance cannot cover the
    /// amount; the balance is left untouched in that case.
    pub fn debit(&mut self, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invariant(format!(
                "debit amount must be positive, got {}",
                amount
            )));
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientCredits {
                remaining: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Adds `amount` credits to the balance (grant or refund).
    pub fn credit(&mut self, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invariant(format!(
                "credit amount must be positive, got {}",
                amount
            )));
        }
        self.balance += amount;
        Ok(())
    }
}
