//! Error handling module
//!
//! Centralized application error type. Presentation layers (bot, REST)
//! map these onto their own surfaces; the engine itself only distinguishes
//! rejected (validation / policy) from infrastructure failures. Pricing
//! unavailability is deliberately *not* here for income/expense/transfer —
//! it is a `TransactionOutcome::Queued`, not an error.

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Synchronous validation rejection; nothing was mutated.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// STRICT-mode floor violation or other store-level policy failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A conversion asked for a live rate that no provider could supply.
    /// Only the conversion auto-fetch path surfaces this; the other
    /// transaction kinds queue instead.
    #[error("Could not fetch exchange rate for {pair}")]
    RateUnavailable { pair: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// True for errors the caller caused (bad input, policy violation)
    /// rather than infrastructure trouble.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::Store(StoreError::InsufficientBalance { .. })
                | AppError::RateUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let err = AppError::Validation(DomainError::NonPositiveAmount);
        assert!(err.is_client_error());

        let err = AppError::Internal("boom".into());
        assert!(!err.is_client_error());

        let err = AppError::RateUnavailable {
            pair: "USD/ARS".into(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Could not fetch exchange rate for USD/ARS");
    }
}
