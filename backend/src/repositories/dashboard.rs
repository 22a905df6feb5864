//! Admin dashboard aggregates

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DashboardRecord {
    pub total_users: i64,
    pub total_feeds: i64,
    pub total_communities: i64,
    pub last_feed_at: Option<DateTime<Utc>>,
    pub last_user_at: Option<DateTime<Utc>>,
    pub last_notice_at: Option<DateTime<Utc>>,
}

pub struct DashboardRepository;

impl DashboardRepository {
    pub async fn stats(pool: &PgPool) -> Result<DashboardRecord> {
        let stats = sqlx::query_as::<_, DashboardRecord>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE is_active AND deleted_at IS NULL) AS total_users,
                (SELECT COUNT(*) FROM feeds WHERE deleted_at IS NULL) AS total_feeds,
                (SELECT COUNT(*) FROM communities
                  WHERE is_active = 'Y' AND deleted_at IS NULL) AS total_communities,
                (SELECT MAX(created_at) FROM feeds WHERE deleted_at IS NULL) AS last_feed_at,
                (SELECT MAX(created_at) FROM users) AS last_user_at,
                (SELECT MAX(created_at) FROM notices WHERE status <> 'deleted') AS last_notice_at
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }
}
