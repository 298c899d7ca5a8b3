//! Domain error types
//!
//! Validation and business-rule failures, independent of the store and
//! provider layers. These are always synchronous rejections: nothing has
//! been mutated when one is returned.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid transaction type: {0}")]
    InvalidKind(String),

    #[error("Amount must be greater than 0")]
    NonPositiveAmount,

    #[error("Amount cannot have more than 8 decimal places")]
    TooManyDecimals,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("{kind} transactions require {field}")]
    MissingAccount { kind: &'static str, field: &'static str },

    #[error("{kind} transactions should not have {field}")]
    UnexpectedAccount { kind: &'static str, field: &'static str },

    #[error("Source and destination accounts must be different for transfers")]
    SameAccountTransfer,

    #[error("Source and destination currencies must be different for conversions")]
    SameCurrencyConversion,

    #[error("Conversion transactions require a destination currency")]
    MissingConversionCurrency,

    #[error("Description cannot exceed {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("Start date must be before end date")]
    InvalidDateRange,

    #[error("'{symbol}' does not match any currency held by the account (holds: {held})")]
    SymbolMismatch { symbol: String, held: String },
}

impl DomainError {
    pub fn symbol_mismatch(symbol: String, account_currencies: Vec<String>) -> Self {
        Self::SymbolMismatch {
            symbol,
            held: account_currencies.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DomainError::MissingAccount {
            kind: "expense",
            field: "a source account",
        };
        assert_eq!(err.to_string(), "expense transactions require a source account");

        let err = DomainError::symbol_mismatch("pesos".into(), vec!["USD".into(), "USDT".into()]);
        assert!(err.to_string().contains("USD, USDT"));
    }
}
