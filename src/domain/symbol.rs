//! Currency symbol resolution
//!
//! Chat input arrives with generic symbols ("$", "pesos", "dollars") instead
//! of currency codes. Resolution is a pure function of the symbol and the
//! currencies the governing account actually holds; a symbol that cannot be
//! reconciled with those currencies is a first-class mismatch, never a
//! silent default.

use rust_decimal::Decimal;

/// Peso-family currencies, in resolution priority order.
const PESO_CURRENCIES: &[&str] = &["ARS", "MXN", "COP", "CLP", "UYU", "PEN"];

const DOLLAR_WORDS: &[&str] = &["dollars", "dollar", "dolares", "dolar"];
const PESO_WORDS: &[&str] = &["pesos", "peso"];

/// Outcome of resolving a currency symbol against an account's holdings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolResolution {
    /// Resolved to a concrete currency code.
    Resolved(String),
    /// The symbol names a currency family the account does not hold.
    Mismatch {
        symbol: String,
        account_currencies: Vec<String>,
    },
}

/// True when the input is a generic symbol or currency word rather than a
/// concrete code.
pub fn is_generic_symbol(input: &str) -> bool {
    let lower = input.trim().to_ascii_lowercase();
    matches!(input.trim(), "$" | "€" | "£" | "¥" | "₱")
        || DOLLAR_WORDS.contains(&lower.as_str())
        || PESO_WORDS.contains(&lower.as_str())
}

/// Resolve a generic currency symbol using the account's balance rows.
///
/// `balances` holds the governing account's `(currency, balance)` pairs;
/// currencies with a positive balance drive the choice. Concrete codes pass
/// through unchanged.
pub fn resolve_currency_symbol(symbol: &str, balances: &[(String, Decimal)]) -> SymbolResolution {
    let trimmed = symbol.trim();
    let lower = trimmed.to_ascii_lowercase();

    if !is_generic_symbol(trimmed) {
        return SymbolResolution::Resolved(trimmed.to_ascii_uppercase());
    }

    let held: Vec<String> = balances
        .iter()
        .filter(|(_, balance)| *balance > Decimal::ZERO)
        .map(|(currency, _)| currency.to_ascii_uppercase())
        .collect();

    if trimmed == "$" || DOLLAR_WORDS.contains(&lower.as_str()) {
        // USD takes priority for "$"; ARS second in a rioplatense context.
        if held.iter().any(|c| c == "USD") {
            return SymbolResolution::Resolved("USD".to_string());
        }
        if held.iter().any(|c| c == "ARS") {
            return SymbolResolution::Resolved("ARS".to_string());
        }
        return SymbolResolution::Resolved("USD".to_string());
    }

    if PESO_WORDS.contains(&lower.as_str()) {
        for peso in PESO_CURRENCIES {
            if held.iter().any(|c| c == peso) {
                return SymbolResolution::Resolved(peso.to_string());
            }
        }
        if !held.is_empty() {
            return SymbolResolution::Mismatch {
                symbol: trimmed.to_string(),
                account_currencies: held,
            };
        }
        return SymbolResolution::Resolved("ARS".to_string());
    }

    let code = match trimmed {
        "€" => "EUR",
        "£" => "GBP",
        "¥" => "JPY",
        "₱" => "PHP",
        _ => "USD",
    };
    SymbolResolution::Resolved(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn held(pairs: &[(&str, Decimal)]) -> Vec<(String, Decimal)> {
        pairs.iter().map(|(c, b)| (c.to_string(), *b)).collect()
    }

    #[test]
    fn test_concrete_code_passes_through() {
        let balances = held(&[("ARS", dec!(100))]);
        assert_eq!(
            resolve_currency_symbol("usdt", &balances),
            SymbolResolution::Resolved("USDT".to_string())
        );
    }

    #[test]
    fn test_dollar_sign_prefers_usd_over_ars() {
        let balances = held(&[("ARS", dec!(200000)), ("USD", dec!(50))]);
        assert_eq!(
            resolve_currency_symbol("$", &balances),
            SymbolResolution::Resolved("USD".to_string())
        );
    }

    #[test]
    fn test_dollar_sign_falls_back_to_ars() {
        let balances = held(&[("ARS", dec!(200000))]);
        assert_eq!(
            resolve_currency_symbol("$", &balances),
            SymbolResolution::Resolved("ARS".to_string())
        );
    }

    #[test]
    fn test_pesos_picks_held_peso_currency() {
        let balances = held(&[("MXN", dec!(500)), ("USD", dec!(10))]);
        assert_eq!(
            resolve_currency_symbol("pesos", &balances),
            SymbolResolution::Resolved("MXN".to_string())
        );
    }

    #[test]
    fn test_pesos_mismatch_is_explicit() {
        let balances = held(&[("USD", dec!(100)), ("USDT", dec!(40))]);
        match resolve_currency_symbol("pesos", &balances) {
            SymbolResolution::Mismatch {
                symbol,
                account_currencies,
            } => {
                assert_eq!(symbol, "pesos");
                assert_eq!(account_currencies, vec!["USD", "USDT"]);
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_pesos_default_on_empty_account() {
        assert_eq!(
            resolve_currency_symbol("pesos", &[]),
            SymbolResolution::Resolved("ARS".to_string())
        );
    }

    #[test]
    fn test_zero_balances_do_not_count_as_held() {
        let balances = held(&[("USD", dec!(0)), ("ARS", dec!(10))]);
        assert_eq!(
            resolve_currency_symbol("$", &balances),
            SymbolResolution::Resolved("ARS".to_string())
        );
    }

    #[test]
    fn test_unicode_symbols() {
        assert_eq!(
            resolve_currency_symbol("€", &[]),
            SymbolResolution::Resolved("EUR".to_string())
        );
        assert_eq!(
            resolve_currency_symbol("¥", &[]),
            SymbolResolution::Resolved("JPY".to_string())
        );
    }
}
