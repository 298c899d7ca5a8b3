//! Per-user preference store
//!
//! Durable key/value records for agent-side preferences (merchant
//! classification choices and the like). Lives in the same store as the
//! ledger so it survives restarts and is shared across instances.

use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;

#[derive(Debug, Clone)]
pub struct UserPrefsStore {
    pool: PgPool,
}

impl UserPrefsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn set(&self, user_id: Uuid, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_prefs (user_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, key)
            DO UPDATE SET value = $3, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, user_id: Uuid, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM user_prefs WHERE user_id = $1 AND key = $2",
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    pub async fn delete(&self, user_id: Uuid, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_prefs WHERE user_id = $1 AND key = $2")
            .bind(user_id)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
