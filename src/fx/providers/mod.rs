//! Rate providers
//!
//! External price sources. Every call carries a short timeout and a small
//! bounded retry-with-backoff budget; a provider that keeps failing is
//! reported upward as plain unavailability, never as a crash.

mod coingecko;
mod dolarapi;

pub use coingecko::CoinGeckoProvider;
pub use dolarapi::{ArsSource, DolarApiProvider};

use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;

/// A rate plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuote {
    pub rate: Decimal,
    pub source: String,
}

/// Provider-level failures. These never reach transaction callers; the
/// resolver degrades them to "rate not available".
#[derive(Debug, thiserror::Error)]
pub enum FxError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected provider response: {0}")]
    UnexpectedResponse(String),
}

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Run a provider call up to [`MAX_ATTEMPTS`] times with exponential
/// backoff between failures.
pub(crate) async fn with_retry<T, F, Fut>(what: &str, mut call: F) -> Result<T, FxError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FxError>>,
{
    let mut last_error = None;
    for attempt in 0..MAX_ATTEMPTS {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt + 1 < MAX_ATTEMPTS {
                    let delay = BACKOFF_BASE * 2u32.pow(attempt);
                    tracing::debug!(
                        provider = what,
                        attempt = attempt + 1,
                        error = %e,
                        "provider call failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| FxError::UnexpectedResponse("no attempts made".into())))
}

/// Build the shared HTTP client with the provider timeout.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_with_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(FxError::UnexpectedResponse("transient".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FxError::UnexpectedResponse("down".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
