//! USD/ARS provider
//!
//! Argentina runs several parallel dollar rates; dolarapi.com exposes the
//! blue, official and MEP quotes. Which one the ledger uses is an operator
//! choice (`ARS_SOURCE`).

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;

use super::{with_retry, FxError, RateQuote};

const BASE_URL: &str = "https://dolarapi.com/v1/dolares";

/// Which Argentine dollar quote to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArsSource {
    Blue,
    Official,
    Mep,
}

impl ArsSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "blue" => Some(Self::Blue),
            "official" | "oficial" => Some(Self::Official),
            "mep" => Some(Self::Mep),
            _ => None,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Official => "oficial",
            Self::Mep => "bolsa",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Blue => "dolarapi_blue",
            Self::Official => "dolarapi_official",
            Self::Mep => "dolarapi_mep",
        }
    }
}

impl fmt::Display for ArsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blue => write!(f, "blue"),
            Self::Official => write!(f, "official"),
            Self::Mep => write!(f, "mep"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DolarQuote {
    venta: Decimal,
}

#[derive(Debug, Clone)]
pub struct DolarApiProvider {
    http: reqwest::Client,
}

impl DolarApiProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch the USD/ARS sell rate from the configured source.
    pub async fn get_rate(&self, source: ArsSource) -> Result<RateQuote, FxError> {
        with_retry("dolarapi", || self.fetch_once(source)).await
    }

    async fn fetch_once(&self, source: ArsSource) -> Result<RateQuote, FxError> {
        let url = format!("{}/{}", BASE_URL, source.path());
        let quote: DolarQuote = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        quote_from_venta(quote.venta, source)
    }
}

fn quote_from_venta(venta: Decimal, source: ArsSource) -> Result<RateQuote, FxError> {
    if venta <= Decimal::ZERO {
        return Err(FxError::UnexpectedResponse(format!(
            "non-positive venta {} from {}",
            venta, source
        )));
    }
    Ok(RateQuote {
        rate: venta,
        source: source.label().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_source_parsing() {
        assert_eq!(ArsSource::parse("blue"), Some(ArsSource::Blue));
        assert_eq!(ArsSource::parse("OFICIAL"), Some(ArsSource::Official));
        assert_eq!(ArsSource::parse("mep"), Some(ArsSource::Mep));
        assert_eq!(ArsSource::parse("crypto"), None);
    }

    #[test]
    fn test_mep_hits_bolsa_endpoint() {
        assert_eq!(ArsSource::Mep.path(), "bolsa");
        assert_eq!(ArsSource::Mep.label(), "dolarapi_mep");
    }

    #[test]
    fn test_quote_decoding() {
        let quote: DolarQuote =
            serde_json::from_str(r#"{"compra": 1420, "venta": 1455.5, "nombre": "Blue"}"#)
                .unwrap();
        let quote = quote_from_venta(quote.venta, ArsSource::Blue).unwrap();
        assert_eq!(quote.rate, dec!(1455.5));
        assert_eq!(quote.source, "dolarapi_blue");
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        assert!(quote_from_venta(dec!(0), ArsSource::Blue).is_err());
    }
}
