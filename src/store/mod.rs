//! Ledger store
//!
//! sqlx repositories over the Postgres schema in `migrations/`. Each
//! repository is a cheap `Clone` over the shared pool.

mod accounts;
mod balances;
mod pending;
mod prefs;
mod rates;
mod transactions;
mod users;

pub use accounts::{Account, AccountStore};
pub use balances::{AccountBalance, BalanceStore};
pub use pending::{NewPending, PendingStore, PendingTransaction};
pub use prefs::UserPrefsStore;
pub use rates::{RateStore, StoredRate};
pub use transactions::{NewTransaction, TransactionQuery, TransactionRecord, TransactionStore};
pub use users::{User, UserStore};

use rust_decimal::Decimal;

/// Store-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Insufficient balance: required {required} {currency}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
        currency: String,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(uuid::Uuid),

    #[error("User not found: {0}")]
    UserNotFound(uuid::Uuid),
}
