//! Transaction intents
//!
//! The structured command an upstream layer (chat agent, REST handler)
//! hands to the transaction service. Validation here is the synchronous
//! gate: an intent that fails never touches the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::money::{normalize_currency_code, MONEY_SCALE};
use super::symbol::is_generic_symbol;
use super::types::TransactionKind;

pub const MAX_DESCRIPTION_LEN: usize = 500;

/// A requested money movement, as stated by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub kind: TransactionKind,
    pub amount: Decimal,
    /// Currency code or a generic symbol ("$", "pesos") resolved at the
    /// service boundary.
    pub currency: String,
    pub account_from: Option<String>,
    pub account_to: Option<String>,
    pub currency_to: Option<String>,
    pub amount_to: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl TransactionIntent {
    pub fn new(kind: TransactionKind, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            currency: currency.into(),
            account_from: None,
            account_to: None,
            currency_to: None,
            amount_to: None,
            exchange_rate: None,
            date: None,
            description: None,
        }
    }

    pub fn with_account_from(mut self, name: impl Into<String>) -> Self {
        self.account_from = Some(name.into());
        self
    }

    pub fn with_account_to(mut self, name: impl Into<String>) -> Self {
        self.account_to = Some(name.into());
        self
    }

    pub fn with_destination(mut self, currency_to: impl Into<String>, amount_to: Decimal) -> Self {
        self.currency_to = Some(currency_to.into());
        self.amount_to = Some(amount_to);
        self
    }

    pub fn with_currency_to(mut self, currency_to: impl Into<String>) -> Self {
        self.currency_to = Some(currency_to.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate the intent before any state is touched.
    ///
    /// Currency fields may still be generic symbols at this point; the
    /// service resolves them against account holdings and re-checks the
    /// resolved codes.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_amount(self.amount)?;
        validate_currency_field(&self.currency)?;

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(DomainError::DescriptionTooLong {
                    max: MAX_DESCRIPTION_LEN,
                });
            }
        }

        if let Some(rate) = self.exchange_rate {
            if rate <= Decimal::ZERO {
                return Err(DomainError::NonPositiveAmount);
            }
        }

        match self.kind {
            TransactionKind::Income => {
                if self.account_to.is_none() {
                    return Err(DomainError::MissingAccount {
                        kind: "income",
                        field: "a destination account",
                    });
                }
                if self.account_from.is_some() {
                    return Err(DomainError::UnexpectedAccount {
                        kind: "income",
                        field: "a source account",
                    });
                }
            }
            TransactionKind::Expense => {
                if self.account_from.is_none() {
                    return Err(DomainError::MissingAccount {
                        kind: "expense",
                        field: "a source account",
                    });
                }
                if self.account_to.is_some() {
                    return Err(DomainError::UnexpectedAccount {
                        kind: "expense",
                        field: "a destination account",
                    });
                }
            }
            TransactionKind::Transfer => {
                let (Some(from), Some(to)) = (&self.account_from, &self.account_to) else {
                    return Err(DomainError::MissingAccount {
                        kind: "transfer",
                        field: "both source and destination accounts",
                    });
                };
                if normalize_account_name(from) == normalize_account_name(to) {
                    return Err(DomainError::SameAccountTransfer);
                }
                if let Some(amount_to) = self.amount_to {
                    validate_amount(amount_to)?;
                }
                if let Some(currency_to) = &self.currency_to {
                    validate_currency_field(currency_to)?;
                }
            }
            TransactionKind::Conversion => {
                if self.account_from.is_none() {
                    return Err(DomainError::MissingAccount {
                        kind: "conversion",
                        field: "a source account",
                    });
                }
                let Some(currency_to) = &self.currency_to else {
                    return Err(DomainError::MissingConversionCurrency);
                };
                validate_currency_field(currency_to)?;
                if let Some(amount_to) = self.amount_to {
                    validate_amount(amount_to)?;
                }
                // Symbols may resolve to the same code later; the service
                // re-checks after resolution.
                if !is_generic_symbol(&self.currency)
                    && !is_generic_symbol(currency_to)
                    && normalize_currency_code(&self.currency)
                        == normalize_currency_code(currency_to)
                {
                    return Err(DomainError::SameCurrencyConversion);
                }
            }
        }

        Ok(())
    }
}

fn validate_amount(amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::NonPositiveAmount);
    }
    if amount.scale() > MONEY_SCALE {
        return Err(DomainError::TooManyDecimals);
    }
    Ok(())
}

fn validate_currency_field(currency: &str) -> Result<(), DomainError> {
    if is_generic_symbol(currency) {
        return Ok(());
    }
    normalize_currency_code(currency)
        .map(|_| ())
        .ok_or_else(|| DomainError::InvalidCurrency(currency.to_string()))
}

/// Account names match case/whitespace-insensitively: trimmed, inner runs
/// of whitespace collapsed, lowercased.
pub fn normalize_account_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_income_requires_destination() {
        let intent = TransactionIntent::new(TransactionKind::Income, dec!(100), "USD");
        assert!(matches!(
            intent.validate(),
            Err(DomainError::MissingAccount { kind: "income", .. })
        ));

        let intent = intent.with_account_to("Deel");
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_income_rejects_source_account() {
        let intent = TransactionIntent::new(TransactionKind::Income, dec!(100), "USD")
            .with_account_to("Deel")
            .with_account_from("Cash");
        assert!(matches!(
            intent.validate(),
            Err(DomainError::UnexpectedAccount { .. })
        ));
    }

    #[test]
    fn test_expense_requires_source() {
        let intent = TransactionIntent::new(TransactionKind::Expense, dec!(50), "ARS");
        assert!(intent.validate().is_err());
        let intent = intent.with_account_from("MercadoPago");
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let intent = TransactionIntent::new(TransactionKind::Expense, dec!(0), "USD")
            .with_account_from("Cash");
        assert_eq!(intent.validate(), Err(DomainError::NonPositiveAmount));

        let intent = TransactionIntent::new(TransactionKind::Expense, dec!(-10), "USD")
            .with_account_from("Cash");
        assert_eq!(intent.validate(), Err(DomainError::NonPositiveAmount));
    }

    #[test]
    fn test_excessive_scale_rejected() {
        let intent = TransactionIntent::new(
            TransactionKind::Income,
            Decimal::new(123456789, 9),
            "BTC",
        )
        .with_account_to("Wallet");
        assert_eq!(intent.validate(), Err(DomainError::TooManyDecimals));
    }

    #[test]
    fn test_transfer_same_account_rejected() {
        let intent = TransactionIntent::new(TransactionKind::Transfer, dec!(10), "USD")
            .with_account_from("  galicia ")
            .with_account_to("Galicia");
        assert_eq!(intent.validate(), Err(DomainError::SameAccountTransfer));
    }

    #[test]
    fn test_conversion_same_currency_rejected() {
        let intent = TransactionIntent::new(TransactionKind::Conversion, dec!(100), "usd")
            .with_account_from("Wise")
            .with_destination("USD", dec!(100));
        assert_eq!(intent.validate(), Err(DomainError::SameCurrencyConversion));
    }

    #[test]
    fn test_conversion_without_amount_to_is_valid() {
        let intent = TransactionIntent::new(TransactionKind::Conversion, dec!(100), "USD")
            .with_account_from("Wise")
            .with_currency_to("ARS");
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_generic_symbol_accepted_as_currency() {
        let intent = TransactionIntent::new(TransactionKind::Expense, dec!(400), "$")
            .with_account_from("mercadopago");
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_description_length_cap() {
        let intent = TransactionIntent::new(TransactionKind::Income, dec!(1), "USD")
            .with_account_to("Deel")
            .with_description("x".repeat(501));
        assert!(matches!(
            intent.validate(),
            Err(DomainError::DescriptionTooLong { .. })
        ));
    }

    #[test]
    fn test_normalize_account_name() {
        assert_eq!(normalize_account_name("  Mercado   Pago "), "mercado pago");
        assert_eq!(normalize_account_name("GALICIA"), "galicia");
    }
}
