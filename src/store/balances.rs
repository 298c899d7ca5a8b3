//! Account balance repository
//!
//! One row per `(account, currency)`. The mutation path is a single
//! guarded UPDATE so concurrent deltas against the same row serialize at
//! the database instead of losing updates. Multi-leg callers run the
//! `_in` variants inside one transaction so both legs land atomically.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountBalance {
    pub account_id: Uuid,
    pub currency: String,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BalanceStore {
    pool: PgPool,
}

impl BalanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add `delta` (possibly negative) to the balance, atomically, in its
    /// own transaction.
    ///
    /// With `enforce_floor` the update only applies when the result stays
    /// non-negative; a violation returns `InsufficientBalance` and leaves
    /// the row untouched.
    pub async fn apply_delta(
        &self,
        account_id: Uuid,
        currency: &str,
        delta: Decimal,
        enforce_floor: bool,
    ) -> Result<Decimal, StoreError> {
        let mut tx = self.pool.begin().await?;
        let balance =
            Self::apply_delta_in(&mut tx, account_id, currency, delta, enforce_floor).await?;
        tx.commit().await?;
        Ok(balance)
    }

    /// Transaction-scoped delta. The guarded UPDATE is the whole
    /// read-modify-write: concurrent callers serialize on the row lock.
    pub async fn apply_delta_in(
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
        currency: &str,
        delta: Decimal,
        enforce_floor: bool,
    ) -> Result<Decimal, StoreError> {
        // Zero row on first touch.
        sqlx::query(
            r#"
            INSERT INTO account_balances (account_id, currency, balance)
            VALUES ($1, $2, 0)
            ON CONFLICT (account_id, currency) DO NOTHING
            "#,
        )
        .bind(account_id)
        .bind(currency)
        .execute(&mut **tx)
        .await?;

        let updated: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE account_balances
            SET balance = balance + $3, updated_at = NOW()
            WHERE account_id = $1
              AND currency = $2
              AND (NOT $4 OR balance + $3 >= 0)
            RETURNING balance
            "#,
        )
        .bind(account_id)
        .bind(currency)
        .bind(delta)
        .bind(enforce_floor)
        .fetch_optional(&mut **tx)
        .await?;

        match updated {
            Some(balance) => Ok(balance),
            None => {
                let available: Option<Decimal> = sqlx::query_scalar(
                    r#"
                    SELECT balance FROM account_balances
                    WHERE account_id = $1 AND currency = $2
                    "#,
                )
                .bind(account_id)
                .bind(currency)
                .fetch_optional(&mut **tx)
                .await?;

                Err(StoreError::InsufficientBalance {
                    required: -delta,
                    available: available.unwrap_or(Decimal::ZERO),
                    currency: currency.to_string(),
                })
            }
        }
    }

    pub async fn get(
        &self,
        account_id: Uuid,
        currency: &str,
    ) -> Result<Option<AccountBalance>, StoreError> {
        let row = sqlx::query_as::<_, AccountBalance>(
            r#"
            SELECT account_id, currency, balance, updated_at
            FROM account_balances
            WHERE account_id = $1 AND currency = $2
            "#,
        )
        .bind(account_id)
        .bind(currency)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<AccountBalance>, StoreError> {
        let rows = sqlx::query_as::<_, AccountBalance>(
            r#"
            SELECT account_id, currency, balance, updated_at
            FROM account_balances
            WHERE account_id = $1
            ORDER BY currency
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
