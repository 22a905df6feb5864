//! Notice repository

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoticeRecord {
    pub id: i64,
    pub admin_id: i64,
    pub admin_name: Option<String>,
    pub category_id: i64,
    pub category_text: Option<String>,
    pub title: String,
    pub content: String,
    pub is_important: String,
    pub ip: String,
    pub view_hash: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NoticeFields<'a> {
    pub category_id: i64,
    pub title: &'a str,
    pub content: &'a str,
    pub is_important: &'a str,
    pub status: &'a str,
}

pub struct NoticeRepository;

impl NoticeRepository {
    /// Active notices, important ones first
    pub async fn list_active(pool: &PgPool) -> Result<Vec<NoticeRecord>> {
        let notices = sqlx::query_as::<_, NoticeRecord>(
            r#"
            SELECT n.*, u.nickname AS admin_name, cc.value AS category_text
            FROM notices n
            LEFT JOIN users u ON u.id = n.admin_id
            LEFT JOIN categories_codes cc ON cc.id = n.category_id
            WHERE n.status = 'active'
            ORDER BY n.is_important DESC, n.created_at DESC, n.id DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(notices)
    }

    /// Any non-deleted notice by hash
    pub async fn find_by_hash(pool: &PgPool, view_hash: &str) -> Result<Option<NoticeRecord>> {
        let notice = sqlx::query_as::<_, NoticeRecord>(
            r#"
            SELECT n.*, u.nickname AS admin_name, cc.value AS category_text
            FROM notices n
            LEFT JOIN users u ON u.id = n.admin_id
            LEFT JOIN categories_codes cc ON cc.id = n.category_id
            WHERE n.view_hash = $1 AND n.status <> 'deleted'
            "#,
        )
        .bind(view_hash)
        .fetch_optional(pool)
        .await?;

        Ok(notice)
    }

    pub async fn create(
        pool: &PgPool,
        admin_id: i64,
        ip: &str,
        view_hash: &str,
        fields: NoticeFields<'_>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notices (admin_id, category_id, title, content, is_important, ip,
                                 view_hash, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(admin_id)
        .bind(fields.category_id)
        .bind(fields.title)
        .bind(fields.content)
        .bind(fields.is_important)
        .bind(ip)
        .bind(view_hash)
        .bind(fields.status)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn update(pool: &PgPool, id: i64, fields: NoticeFields<'_>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notices SET
                category_id = $2, title = $3, content = $4, is_important = $5, status = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.category_id)
        .bind(fields.title)
        .bind(fields.content)
        .bind(fields.is_important)
        .bind(fields.status)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn mark_deleted(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query("UPDATE notices SET status = 'deleted', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
