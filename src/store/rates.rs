//! Exchange rate repository
//!
//! The persisted tier of the rate cache: append-only rows, the most recent
//! one inside the freshness window wins. Survives restarts and is shared
//! across processes.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredRate {
    pub pair: String,
    pub value: Decimal,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RateStore {
    pool: PgPool,
}

impl RateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        pair: &str,
        value: Decimal,
        source: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO exchange_rates (pair, value, source, fetched_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(pair)
        .bind(value)
        .bind(source)
        .bind(fetched_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent rate for the pair no older than `max_age`.
    pub async fn latest_within(
        &self,
        pair: &str,
        max_age: Duration,
    ) -> Result<Option<StoredRate>, StoreError> {
        let cutoff = Utc::now() - max_age;
        let row = sqlx::query_as::<_, StoredRate>(
            r#"
            SELECT pair, value, source, fetched_at
            FROM exchange_rates
            WHERE pair = $1 AND fetched_at >= $2
            ORDER BY fetched_at DESC
            LIMIT 1
            "#,
        )
        .bind(pair)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
