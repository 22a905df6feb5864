//! Block list repository

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// A blocked user, as listed to the blocker
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeniedUserRecord {
    pub user_hash: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub denied_at: DateTime<Utc>,
}

pub struct DenyRepository;

impl DenyRepository {
    /// Remove a block; returns whether one existed
    pub async fn remove(pool: &PgPool, user_id: i64, deny_user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM denies_users WHERE user_id = $1 AND deny_user_id = $2")
            .bind(user_id)
            .bind(deny_user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn add(pool: &PgPool, user_id: i64, deny_user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO denies_users (user_id, deny_user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, deny_user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(deny_user_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn list(pool: &PgPool, user_id: i64) -> Result<Vec<DeniedUserRecord>> {
        let rows = sqlx::query_as::<_, DeniedUserRecord>(
            r#"
            SELECT u.view_hash AS user_hash, u.nickname, u.profile_image, d.created_at AS denied_at
            FROM denies_users d
            JOIN users u ON u.id = d.deny_user_id
            WHERE d.user_id = $1
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
