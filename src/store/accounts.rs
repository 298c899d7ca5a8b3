//! Account repository
//!
//! Accounts are created lazily the first time a name is mentioned.
//! Name matching is case/whitespace-insensitive; the display form the user
//! first typed is what gets stored.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{normalize_account_name, AccountKind, TrackBalance};

use super::StoreError;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub track_balance: TrackBalance,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    kind: AccountKind,
    track_balance: Option<bool>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            kind: row.kind,
            track_balance: TrackBalance::from_column(row.track_balance),
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, user_id, name, kind, track_balance, created_at";

#[derive(Debug, Clone)]
pub struct AccountStore {
    pool: PgPool,
}

impl AccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::from).ok_or(StoreError::AccountNotFound(id))
    }

    pub async fn get_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Account>, StoreError> {
        let normalized = normalize_account_name(name);
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM accounts
            WHERE user_id = $1 AND LOWER(name) = $2
            "#
        ))
        .bind(user_id)
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    /// Get-or-create by normalized name. Concurrent duplicate calls are
    /// resolved by the unique index on `(user_id, LOWER(name))`: the losing
    /// insert is a no-op and the existing row is re-read.
    pub async fn get_or_create(
        &self,
        user_id: Uuid,
        name: &str,
        kind: AccountKind,
    ) -> Result<Account, StoreError> {
        if let Some(account) = self.get_by_name(user_id, name).await? {
            return Ok(account);
        }

        let display_name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts (user_id, name, kind)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, LOWER(name)) DO NOTHING
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&display_name)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            // Lost the insert race; the row exists now.
            None => Ok(self
                .get_by_name(user_id, name)
                .await?
                .expect("account row must exist after conflict")),
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM accounts
            WHERE user_id = $1
            ORDER BY created_at
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn set_track_balance(
        &self,
        id: Uuid,
        track: TrackBalance,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE accounts SET track_balance = $2 WHERE id = $1")
            .bind(id)
            .bind(track.to_column())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AccountNotFound(id));
        }
        Ok(())
    }
}
