//! Money utilities
//!
//! Exact fixed-point arithmetic helpers, currency classification and
//! per-currency quantization. All ledger amounts are `rust_decimal::Decimal`
//! with at most [`MONEY_SCALE`] fractional digits.

use rust_decimal::{Decimal, RoundingStrategy};

/// Storage scale for all monetary columns.
pub const MONEY_SCALE: u32 = 8;

const HIGH_PRECISION_CRYPTOS: &[&str] = &["BTC", "ETH"];

const CRYPTO_CURRENCIES: &[&str] = &[
    "BTC", "ETH", "USDT", "USDC", "DAI", "BUSD", "BNB", "ADA", "DOT", "LINK", "UNI", "AAVE",
];

const FIAT_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "ARS", "BRL", "CLP", "COP", "MXN", "PEN",
    "UYU",
];

/// Quantize an amount for display based on currency precision: 8 digits
/// for the high-precision cryptos, 2 for stablecoins and fiat.
pub fn quantize_money(amount: Decimal, currency: &str) -> Decimal {
    let code = currency.to_ascii_uppercase();
    if HIGH_PRECISION_CRYPTOS.contains(&code.as_str()) {
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
    } else {
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Clamp an amount to the ledger storage scale.
pub fn quantize_storage(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn is_crypto_currency(currency: &str) -> bool {
    CRYPTO_CURRENCIES.contains(&currency.to_ascii_uppercase().as_str())
}

pub fn is_fiat_currency(currency: &str) -> bool {
    FIAT_CURRENCIES.contains(&currency.to_ascii_uppercase().as_str())
}

/// Normalize a currency code: uppercase, trimmed, 2-10 alphanumeric chars.
/// Returns `None` when the input is not a plausible code.
pub fn normalize_currency_code(currency: &str) -> Option<String> {
    let code = currency.trim().to_ascii_uppercase();
    if code.len() < 2 || code.len() > 10 {
        return None;
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(code)
}

/// Parse a human-entered amount, accepting thousands separators and K/M
/// suffixes ("1,000.50", "426K", "1.5M"). Only positive amounts parse.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let mut s = input.trim().to_ascii_uppercase();
    if s.is_empty() {
        return None;
    }

    let mut multiplier = Decimal::ONE;
    if let Some(stripped) = s.strip_suffix('K') {
        multiplier = Decimal::from(1_000);
        s = stripped.to_string();
    } else if let Some(stripped) = s.strip_suffix('M') {
        multiplier = Decimal::from(1_000_000);
        s = stripped.to_string();
    }

    let s = s.replace(',', "");
    let amount = s.parse::<Decimal>().ok()? * multiplier;
    if amount > Decimal::ZERO {
        Some(amount)
    } else {
        None
    }
}

/// Format an amount for confirmation strings, with thousands separators
/// above 1000.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let quantized = quantize_money(amount, currency);
    if quantized.abs() >= Decimal::from(1_000) {
        let whole = quantized.trunc().abs();
        let frac = (quantized.abs() - whole).round_dp(2);
        let mut digits = whole.to_string();
        let mut grouped = String::new();
        while digits.len() > 3 {
            let split = digits.len() - 3;
            grouped = format!(",{}{}", &digits[split..], grouped);
            digits.truncate(split);
        }
        let sign = if quantized.is_sign_negative() { "-" } else { "" };
        let cents = frac.to_string();
        let cents = cents.strip_prefix("0.").unwrap_or("00");
        format!("{}{}{}.{:0<2}", sign, digits, grouped, cents)
    } else {
        quantized.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantize_by_currency() {
        assert_eq!(quantize_money(dec!(0.123456789), "BTC"), dec!(0.12345679));
        assert_eq!(quantize_money(dec!(10.555), "USD"), dec!(10.56));
        assert_eq!(quantize_money(dec!(10.555), "USDT"), dec!(10.56));
    }

    #[test]
    fn test_classification() {
        assert!(is_crypto_currency("btc"));
        assert!(is_crypto_currency("USDT"));
        assert!(is_fiat_currency("ars"));
        assert!(!is_fiat_currency("USDT"));
        assert!(!is_crypto_currency("ARS"));
    }

    #[test]
    fn test_normalize_currency_code() {
        assert_eq!(normalize_currency_code(" usd "), Some("USD".to_string()));
        assert_eq!(normalize_currency_code("usdt"), Some("USDT".to_string()));
        assert_eq!(normalize_currency_code("U"), None);
        assert_eq!(normalize_currency_code("US-D"), None);
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("1,000.50"), Some(dec!(1000.50)));
        assert_eq!(parse_amount("426k"), Some(dec!(426000)));
        assert_eq!(parse_amount("1.5M"), Some(dec!(1500000)));
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_format_money_grouping() {
        assert_eq!(format_money(dec!(1234567.891), "USD"), "1,234,567.89");
        assert_eq!(format_money(dec!(999.99), "USD"), "999.99");
        assert_eq!(format_money(dec!(1000), "ARS"), "1,000.00");
    }
}
