//! CoinGecko provider
//!
//! Handles crypto↔fiat directly and crypto↔crypto as a cross-rate through
//! USD. Fiat↔fiat pairs (other than the regional USD/ARS source) are not
//! supported and report as unavailable.

use rust_decimal::Decimal;
use std::collections::HashMap;

use super::{with_retry, FxError, RateQuote};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const SOURCE_LABEL: &str = "coingecko";

/// Fiat currencies CoinGecko can quote against.
const VS_FIAT: &[&str] = &["USD", "EUR", "ARS", "BRL"];

/// Map ticker symbols to CoinGecko asset ids.
fn crypto_id(code: &str) -> Option<&'static str> {
    match code {
        "BTC" => Some("bitcoin"),
        "ETH" => Some("ethereum"),
        "USDT" => Some("tether"),
        "USDC" => Some("usd-coin"),
        "DAI" => Some("dai"),
        "BUSD" => Some("binance-usd"),
        _ => None,
    }
}

fn is_supported_fiat(code: &str) -> bool {
    VS_FIAT.contains(&code)
}

type SimplePrice = HashMap<String, HashMap<String, Decimal>>;

#[derive(Debug, Clone)]
pub struct CoinGeckoProvider {
    http: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Get a rate for any pair this provider understands. `Ok(None)` means
    /// the pair is outside its coverage, which is not an error.
    pub async fn get_rate(&self, base: &str, quote: &str) -> Result<Option<RateQuote>, FxError> {
        let base = base.to_ascii_uppercase();
        let quote = quote.to_ascii_uppercase();

        match (crypto_id(&base), crypto_id(&quote)) {
            // crypto -> fiat
            (Some(base_id), None) if is_supported_fiat(&quote) => {
                let rate = self.simple_price(base_id, &quote).await?;
                Ok(rate.map(|rate| RateQuote {
                    rate,
                    source: SOURCE_LABEL.to_string(),
                }))
            }
            // fiat -> crypto, quoted as the inverse of crypto -> fiat
            (None, Some(quote_id)) if is_supported_fiat(&base) => {
                let rate = self.simple_price(quote_id, &base).await?;
                Ok(rate.and_then(invert_rate).map(|rate| RateQuote {
                    rate,
                    source: SOURCE_LABEL.to_string(),
                }))
            }
            // crypto -> crypto, crossed through USD
            (Some(base_id), Some(quote_id)) => {
                let base_usd = self.simple_price(base_id, "USD").await?;
                let quote_usd = self.simple_price(quote_id, "USD").await?;
                Ok(cross_rate(base_usd, quote_usd).map(|rate| RateQuote {
                    rate,
                    source: SOURCE_LABEL.to_string(),
                }))
            }
            _ => Ok(None),
        }
    }

    async fn simple_price(&self, id: &str, fiat: &str) -> Result<Option<Decimal>, FxError> {
        let fiat_lower = fiat.to_ascii_lowercase();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            BASE_URL, id, fiat_lower
        );

        let prices: SimplePrice = with_retry("coingecko", || async {
            let prices = self
                .http
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok(prices)
        })
        .await?;

        Ok(extract_price(&prices, id, &fiat_lower))
    }
}

fn extract_price(prices: &SimplePrice, id: &str, fiat: &str) -> Option<Decimal> {
    prices.get(id).and_then(|quotes| quotes.get(fiat)).copied()
}

fn invert_rate(rate: Decimal) -> Option<Decimal> {
    if rate.is_zero() {
        None
    } else {
        Some(Decimal::ONE / rate)
    }
}

fn cross_rate(base_usd: Option<Decimal>, quote_usd: Option<Decimal>) -> Option<Decimal> {
    match (base_usd, quote_usd) {
        (Some(base), Some(quote)) if !quote.is_zero() => Some(base / quote),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_crypto_id_mapping() {
        assert_eq!(crypto_id("BTC"), Some("bitcoin"));
        assert_eq!(crypto_id("USDT"), Some("tether"));
        assert_eq!(crypto_id("ARS"), None);
    }

    #[test]
    fn test_simple_price_decoding() {
        let prices: SimplePrice =
            serde_json::from_str(r#"{"bitcoin": {"usd": 64250.12}}"#).unwrap();
        assert_eq!(extract_price(&prices, "bitcoin", "usd"), Some(dec!(64250.12)));
        assert_eq!(extract_price(&prices, "bitcoin", "ars"), None);
        assert_eq!(extract_price(&prices, "ethereum", "usd"), None);
    }

    #[test]
    fn test_invert_rate() {
        assert_eq!(invert_rate(dec!(4)), Some(dec!(0.25)));
        assert_eq!(invert_rate(dec!(0)), None);
    }

    #[test]
    fn test_cross_rate_through_usd() {
        // BTC at 60k, ETH at 3k -> BTC/ETH = 20
        assert_eq!(cross_rate(Some(dec!(60000)), Some(dec!(3000))), Some(dec!(20)));
        assert_eq!(cross_rate(Some(dec!(60000)), None), None);
        assert_eq!(cross_rate(None, Some(dec!(3000))), None);
        assert_eq!(cross_rate(Some(dec!(1)), Some(dec!(0))), None);
    }
}
