//! User repository
//!
//! Users are created on first contact and never hard-deleted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::TrackingMode;

use super::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub display_name: Option<String>,
    pub tracking_mode: TrackingMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, display_name, tracking_mode, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(StoreError::UserNotFound(id))
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, display_name, tracking_mode, created_at, updated_at
            FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Look up a user by their external identity, creating the row on first
    /// contact. Safe under concurrent duplicate calls: the insert is
    /// conflict-tolerant and the loser re-reads the winner's row.
    pub async fn get_or_create(
        &self,
        external_id: &str,
        display_name: Option<&str>,
    ) -> Result<User, StoreError> {
        if let Some(user) = self.get_by_external_id(external_id).await? {
            return Ok(user);
        }

        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (external_id, display_name)
            VALUES ($1, $2)
            ON CONFLICT (external_id) DO NOTHING
            RETURNING id, external_id, display_name, tracking_mode, created_at, updated_at
            "#,
        )
        .bind(external_id)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(user) => Ok(user),
            // Lost the insert race; the row exists now.
            None => Ok(self
                .get_by_external_id(external_id)
                .await?
                .expect("user row must exist after conflict")),
        }
    }

    pub async fn set_tracking_mode(
        &self,
        id: Uuid,
        mode: TrackingMode,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET tracking_mode = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(mode)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(id));
        }
        Ok(())
    }
}
