//! cambio
//!
//! Multi-currency transaction ledger with deferred exchange-rate
//! resolution. Re-exports modules for integration testing and embedding.

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod fx;
pub mod jobs;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use services::{AccountService, TransactionOutcome, TransactionService};
