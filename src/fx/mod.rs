//! Rate resolver
//!
//! Two-tier cached exchange-rate lookup: a 5-minute in-process cache in
//! front of the persisted `exchange_rates` tier (1 hour), in front of the
//! external providers. Unavailability is a normal outcome (`None`), never
//! an error; provider and store failures degrade to the same `None`.

pub mod providers;

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::store::RateStore;

pub use providers::{ArsSource, CoinGeckoProvider, DolarApiProvider, FxError, RateQuote};

/// In-process cache freshness window.
const MEMORY_TTL_MINUTES: i64 = 5;
/// Persisted tier freshness window.
const STORE_TTL_HOURS: i64 = 1;

/// Normalized cache/provider lookup key: `"BASE/QUOTE"`, uppercased.
pub fn pair_key(base: &str, quote: &str) -> String {
    format!(
        "{}/{}",
        base.trim().to_ascii_uppercase(),
        quote.trim().to_ascii_uppercase()
    )
}

#[derive(Debug, Clone)]
struct CachedRate {
    rate: RateQuote,
    fetched_at: DateTime<Utc>,
}

impl CachedRate {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at < Duration::minutes(MEMORY_TTL_MINUTES)
    }
}

/// The FX service. Cheap to clone; all clones share the in-process cache.
#[derive(Clone)]
pub struct FxService {
    rates: RateStore,
    dolarapi: DolarApiProvider,
    coingecko: CoinGeckoProvider,
    ars_source: ArsSource,
    cache: Arc<Mutex<HashMap<String, CachedRate>>>,
}

impl FxService {
    pub fn new(rates: RateStore, ars_source: ArsSource, timeout: std::time::Duration) -> Self {
        let http = providers::http_client(timeout);
        Self {
            rates,
            dolarapi: DolarApiProvider::new(http.clone()),
            coingecko: CoinGeckoProvider::new(http),
            ars_source,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolve a rate for `base -> quote`.
    ///
    /// Returns `None` when no tier can produce a rate; callers treat that
    /// as the expected "defer it" outcome.
    pub async fn get_rate(&self, base: &str, quote: &str) -> Option<RateQuote> {
        let pair = pair_key(base, quote);
        let now = Utc::now();

        if let Some(cached) = self.memory_lookup(&pair, now) {
            return Some(cached);
        }

        // Persisted tier; a read failure only means we go to the providers.
        match self
            .rates
            .latest_within(&pair, Duration::hours(STORE_TTL_HOURS))
            .await
        {
            Ok(Some(stored)) => {
                let quote = RateQuote {
                    rate: stored.value,
                    source: stored.source,
                };
                self.memory_insert(&pair, quote.clone(), stored.fetched_at);
                return Some(quote);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(pair = %pair, error = %e, "persisted rate cache read failed");
            }
        }

        let fresh = self.fetch_fresh(base, quote).await?;
        let fetched_at = Utc::now();

        self.memory_insert(&pair, fresh.clone(), fetched_at);
        if let Err(e) = self
            .rates
            .insert(&pair, fresh.rate, &fresh.source, fetched_at)
            .await
        {
            tracing::warn!(pair = %pair, error = %e, "persisted rate cache write failed");
        }

        Some(fresh)
    }

    fn memory_lookup(&self, pair: &str, now: DateTime<Utc>) -> Option<RateQuote> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(pair)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.rate.clone())
    }

    fn memory_insert(&self, pair: &str, rate: RateQuote, fetched_at: DateTime<Utc>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(pair.to_string(), CachedRate { rate, fetched_at });
        }
    }

    async fn fetch_fresh(&self, base: &str, quote: &str) -> Option<RateQuote> {
        let base_upper = base.trim().to_ascii_uppercase();
        let quote_upper = quote.trim().to_ascii_uppercase();

        let result = if base_upper == "USD" && quote_upper == "ARS" {
            self.dolarapi.get_rate(self.ars_source).await.map(Some)
        } else if base_upper == "ARS" && quote_upper == "USD" {
            self.dolarapi.get_rate(self.ars_source).await.map(|quote| {
                if quote.rate.is_zero() {
                    None
                } else {
                    Some(RateQuote {
                        rate: rust_decimal::Decimal::ONE / quote.rate,
                        source: quote.source,
                    })
                }
            })
        } else {
            self.coingecko.get_rate(&base_upper, &quote_upper).await
        };

        match result {
            Ok(Some(quote)) => Some(quote),
            Ok(None) => {
                tracing::debug!(base = %base_upper, quote = %quote_upper, "pair not covered by any provider");
                None
            }
            Err(e) => {
                tracing::warn!(base = %base_upper, quote = %quote_upper, error = %e, "providers unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pair_key_normalization() {
        assert_eq!(pair_key("usd", "ars"), "USD/ARS");
        assert_eq!(pair_key(" btc ", "usdt"), "BTC/USDT");
    }

    #[test]
    fn test_cached_rate_freshness_window() {
        let now = Utc::now();
        let entry = CachedRate {
            rate: RateQuote {
                rate: dec!(1000),
                source: "test".into(),
            },
            fetched_at: now - Duration::minutes(4),
        };
        assert!(entry.is_fresh(now));

        let stale = CachedRate {
            fetched_at: now - Duration::minutes(6),
            ..entry
        };
        assert!(!stale.is_fresh(now));
    }
}
