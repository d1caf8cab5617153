//! Credit ledger domain - accounts, reservations, and the audit trail.
//!
//! The ledger is the only code path allowed to mutate a credit balance.
//! Every mutation is one of four operations (reserve, commit, refund, grant),
//! each producing exactly one immutable [`LedgerEntry`], so that for any
//! organization the running sum of entry amounts equals the current balance.

mod account;
mod entry;
mod errors;
mod reservation;

pub use account::CreditAccount;
pub use entry::{sum_amounts, LedgerEntry, LedgerEntryKind};
pub use errors::LedgerError;
pub use reservation::{Reservation, ReservationState, TransitionOutcome};
