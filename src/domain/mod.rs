//! Domain module
//!
//! Money utilities, currency resolution, core enums and the transaction
//! intent — everything the engine needs before it touches a store.

pub mod error;
pub mod intent;
pub mod money;
pub mod symbol;
pub mod types;

pub use error::DomainError;
pub use intent::{normalize_account_name, TransactionIntent, MAX_DESCRIPTION_LEN};
pub use symbol::{is_generic_symbol, resolve_currency_symbol, SymbolResolution};
pub use types::{
    AccountKind, PendingStatus, TrackBalance, TrackingMode, TransactionKind,
};
