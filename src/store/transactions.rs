//! Transaction repository
//!
//! Completed transactions are append-only: the engine inserts them after a
//! balance mutation succeeds and never updates or deletes them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::domain::TransactionKind;

use super::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRecord {
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
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a completed transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
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
}

/// Filters for date-ranged listings.
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub account_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub limit: i64,
    pub offset: i64,
}

impl TransactionQuery {
    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            account_id: None,
            kind: None,
            limit: 10,
            offset: 0,
        }
    }
}

const SELECT_COLUMNS: &str = "id, user_id, kind, account_from_id, account_to_id, currency, \
     amount, currency_to, amount_to, exchange_rate, description, date, created_at";

#[derive(Debug, Clone)]
pub struct TransactionStore {
    pool: PgPool,
}

impl TransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, tx: NewTransaction) -> Result<TransactionRecord, StoreError> {
        let mut db_tx = self.pool.begin().await?;
        let record = Self::insert_in(&mut db_tx, tx).await?;
        db_tx.commit().await?;
        Ok(record)
    }

    /// Transaction-scoped insert, used by the orchestration layer so the
    /// record and its balance mutations commit together.
    pub async fn insert_in(
        db_tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tx: NewTransaction,
    ) -> Result<TransactionRecord, StoreError> {
        let record = sqlx::query_as::<_, TransactionRecord>(&format!(
            r#"
            INSERT INTO transactions (
                user_id, kind, account_from_id, account_to_id,
                currency, amount, currency_to, amount_to,
                exchange_rate, description, date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(tx.user_id)
        .bind(tx.kind)
        .bind(tx.account_from_id)
        .bind(tx.account_to_id)
        .bind(&tx.currency)
        .bind(tx.amount)
        .bind(&tx.currency_to)
        .bind(tx.amount_to)
        .bind(tx.exchange_rate)
        .bind(&tx.description)
        .bind(tx.date)
        .fetch_one(&mut **db_tx)
        .await?;

        Ok(record)
    }

    pub async fn list_by_date_range(
        &self,
        user_id: Uuid,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {SELECT_COLUMNS} FROM transactions WHERE user_id = "
        ));
        builder.push_bind(user_id);
        builder.push(" AND date >= ").push_bind(query.start);
        builder.push(" AND date <= ").push_bind(query.end);
        if let Some(account_id) = query.account_id {
            builder
                .push(" AND (account_from_id = ")
                .push_bind(account_id)
                .push(" OR account_to_id = ")
                .push_bind(account_id)
                .push(")");
        }
        if let Some(kind) = query.kind {
            builder.push(" AND kind = ").push_bind(kind);
        }
        builder.push(" ORDER BY date DESC");
        builder.push(" LIMIT ").push_bind(query.limit);
        builder.push(" OFFSET ").push_bind(query.offset);

        let records = builder
            .build_query_as::<TransactionRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Sum of as-stated amounts for one kind in a period, optionally
    /// restricted to a single currency.
    pub async fn total_by_kind(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kind: TransactionKind,
        currency: Option<&str>,
    ) -> Result<Decimal, StoreError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount) FROM transactions
            WHERE user_id = $1
              AND date >= $2 AND date <= $3
              AND kind = $4
              AND ($5::text IS NULL OR currency = $5)
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(kind)
        .bind(currency)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    pub async fn largest_in_period(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kind: Option<TransactionKind>,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let record = sqlx::query_as::<_, TransactionRecord>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM transactions
            WHERE user_id = $1
              AND date >= $2 AND date <= $3
              AND ($4::transaction_kind IS NULL OR kind = $4)
            ORDER BY amount DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
