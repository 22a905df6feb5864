//! Comment repository
//!
//! Feed and community comments have the same columns and differ only in the
//! table and the foreign key of the commented row.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Which table a comment lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Feed,
    Community,
}

impl CommentTarget {
    const fn table(self) -> &'static str {
        match self {
            CommentTarget::Feed => "feed_comments",
            CommentTarget::Community => "community_comments",
        }
    }

    const fn foreign_key(self) -> &'static str {
        match self {
            CommentTarget::Feed => "feed_id",
            CommentTarget::Community => "community_id",
        }
    }
}

/// Comment row joined with its author
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: i64,
    pub target_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub view_hash: String,
    pub parent_hash: Option<String>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_hash: String,
    pub nickname: String,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment<'a> {
    pub target_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub view_hash: &'a str,
    pub parent_hash: Option<&'a str>,
    pub comment: &'a str,
}

fn select_sql(target: CommentTarget, condition: &str) -> String {
    format!(
        r#"
        SELECT c.id, c.{fk} AS target_id, c.user_id, c.parent_id, c.view_hash, c.parent_hash,
               c.comment, c.created_at, c.updated_at, c.deleted_at,
               u.view_hash AS user_hash, u.nickname, u.profile_image
        FROM {table} c
        JOIN users u ON u.id = c.user_id
        WHERE {condition}
        "#,
        fk = target.foreign_key(),
        table = target.table(),
    )
}

pub struct CommentRepository;

impl CommentRepository {
    pub async fn create(pool: &PgPool, target: CommentTarget, new: NewComment<'_>) -> Result<i64> {
        let sql = format!(
            r#"
            INSERT INTO {table} ({fk}, user_id, parent_id, view_hash, parent_hash, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
            table = target.table(),
            fk = target.foreign_key(),
        );
        let id = sqlx::query_scalar::<_, i64>(&sql)
            .bind(new.target_id)
            .bind(new.user_id)
            .bind(new.parent_id)
            .bind(new.view_hash)
            .bind(new.parent_hash)
            .bind(new.comment)
            .fetch_one(pool)
            .await?;

        Ok(id)
    }

    pub async fn find_by_hash(
        pool: &PgPool,
        target: CommentTarget,
        view_hash: &str,
    ) -> Result<Option<CommentRecord>> {
        let sql = select_sql(target, "c.view_hash = $1");
        let comment = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(view_hash)
            .fetch_optional(pool)
            .await?;

        Ok(comment)
    }

    /// One page of comments, oldest first
    pub async fn list(
        pool: &PgPool,
        target: CommentTarget,
        target_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentRecord>> {
        let sql = format!(
            "{} ORDER BY c.created_at ASC, c.id ASC LIMIT $2 OFFSET $3",
            select_sql(target, &format!("c.{} = $1", target.foreign_key()))
        );
        let comments = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(target_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(comments)
    }

    pub async fn update_text(
        pool: &PgPool,
        target: CommentTarget,
        id: i64,
        comment: &str,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET comment = $2, updated_at = NOW() WHERE id = $1",
            target.table()
        );
        sqlx::query(&sql).bind(id).bind(comment).execute(pool).await?;

        Ok(())
    }

    /// Blank the text and stamp `deleted_at`; the row stays in the thread
    pub async fn soft_delete(pool: &PgPool, target: CommentTarget, id: i64) -> Result<()> {
        let sql = format!(
            r#"
            UPDATE {} SET comment = '', deleted_at = COALESCE(deleted_at, NOW()), updated_at = NOW()
            WHERE id = $1
            "#,
            target.table()
        );
        sqlx::query(&sql).bind(id).execute(pool).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_uses_target_columns() {
        let sql = select_sql(CommentTarget::Community, "c.id = $1");
        assert!(sql.contains("c.community_id AS target_id"));
        assert!(sql.contains("FROM community_comments c"));

        let sql = select_sql(CommentTarget::Feed, "c.id = $1");
        assert!(sql.contains("c.feed_id AS target_id"));
        assert!(sql.contains("FROM feed_comments c"));
    }
}
