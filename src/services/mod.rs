//! Service layer
//!
//! Orchestration on top of the stores and the rate resolver.

mod accounts;
mod transactions;

pub use accounts::{AccountBalances, AccountService, BalanceEntry, BalanceView};
pub use transactions::{PendingOutcome, TransactionOutcome, TransactionService};
