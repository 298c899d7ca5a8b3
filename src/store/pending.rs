//! Pending transaction repository
//!
//! Queue of transactions that could not be priced. Rows are claimed
//! (`waiting` → `processing`) before the sweep touches them so overlapping
//! sweep runs never double-apply a row, and rows that hit the retry budget
//! move to the terminal `exhausted` state instead of being retried forever.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{PendingStatus, TransactionKind};

use super::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub account_from_id: Option<Uuid>,
    pub account_to_id: Option<Uuid>,
    pub currency: String,
    pub amount: Decimal,
    pub currency_to: Option<String>,
    pub amount_to: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub status: PendingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a queued transaction.
#[derive(Debug, Clone)]
pub struct NewPending {
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub account_from_id: Option<Uuid>,
    pub account_to_id: Option<Uuid>,
    pub currency: String,
    pub amount: Decimal,
    pub currency_to: Option<String>,
    pub amount_to: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub last_error: String,
}

const SELECT_COLUMNS: &str = "id, user_id, kind, account_from_id, account_to_id, currency, \
     amount, currency_to, amount_to, exchange_rate, description, date, \
     retry_count, last_error, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PendingStore {
    pool: PgPool,
}

impl PendingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, pending: NewPending) -> Result<PendingTransaction, StoreError> {
        let row = sqlx::query_as::<_, PendingTransaction>(&format!(
            r#"
            INSERT INTO pending_transactions (
                user_id, kind, account_from_id, account_to_id,
                currency, amount, currency_to, amount_to,
                exchange_rate, description, date, retry_count, last_error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0, $12)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(pending.user_id)
        .bind(pending.kind)
        .bind(pending.account_from_id)
        .bind(pending.account_to_id)
        .bind(&pending.currency)
        .bind(pending.amount)
        .bind(&pending.currency_to)
        .bind(pending.amount_to)
        .bind(pending.exchange_rate)
        .bind(&pending.description)
        .bind(pending.date)
        .bind(&pending.last_error)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Claim a batch of retryable rows, oldest first. Claimed rows flip to
    /// `processing` so a concurrently running sweep skips them
    /// (`FOR UPDATE SKIP LOCKED` keeps the claim itself race-free).
    pub async fn claim_batch(
        &self,
        max_retry: i32,
        limit: i64,
    ) -> Result<Vec<PendingTransaction>, StoreError> {
        let rows = sqlx::query_as::<_, PendingTransaction>(&format!(
            r#"
            UPDATE pending_transactions
            SET status = 'processing', updated_at = NOW()
            WHERE id IN (
                SELECT id FROM pending_transactions
                WHERE status = 'waiting' AND retry_count < $1
                ORDER BY created_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(max_retry)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Record a failed retry: bump the count, remember the error, and either
    /// return the row to the queue or park it as exhausted.
    pub async fn record_failure(
        &self,
        id: Uuid,
        error: &str,
        max_retry: i32,
    ) -> Result<PendingStatus, StoreError> {
        let status: PendingStatus = sqlx::query_scalar(
            r#"
            UPDATE pending_transactions
            SET retry_count = retry_count + 1,
                last_error = $2,
                status = CASE WHEN retry_count + 1 >= $3
                              THEN 'exhausted'::pending_status
                              ELSE 'waiting'::pending_status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING status
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(max_retry)
        .fetch_one(&self.pool)
        .await?;

        Ok(status)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM pending_transactions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Transaction-scoped delete: the sweeper removes the row in the same
    /// transaction that applies its balance mutations and record.
    pub async fn delete_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM pending_transactions WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Return rows stuck in `processing` (a crashed sweep) to the queue.
    pub async fn release_stale(&self, older_than_secs: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_transactions
            SET status = 'waiting', updated_at = NOW()
            WHERE status = 'processing'
              AND updated_at < NOW() - ($1 || ' seconds')::interval
            "#,
        )
        .bind(older_than_secs.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_exhausted(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pending_transactions WHERE status = 'exhausted'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PendingTransaction>, StoreError> {
        let rows = sqlx::query_as::<_, PendingTransaction>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM pending_transactions
            WHERE user_id = $1
            ORDER BY created_at
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<PendingTransaction>, StoreError> {
        let row = sqlx::query_as::<_, PendingTransaction>(&format!(
            "SELECT {SELECT_COLUMNS} FROM pending_transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
