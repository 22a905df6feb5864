//! Feed repository: posts, images and likes

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};

/// Feed row joined with its author
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub is_public: String,
    pub view_count: i32,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_hash: String,
    pub nickname: String,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedImageRecord {
    pub id: i64,
    pub feed_id: i64,
    pub image_path: String,
    pub sort_order: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LikedFeedRecord {
    pub feed_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub liked_at: DateTime<Utc>,
}

/// Owner and deletion state, including deleted feeds
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct FeedOwnership {
    pub id: i64,
    pub user_id: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// List filters; `sort` is one of `created_at`, `likes`, `views`
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    pub viewer_id: Option<i64>,
    pub cursor: Option<i64>,
    pub title: Option<String>,
    pub nickname: Option<String>,
    pub target_user_hash: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort: &'static str,
    pub limit: i64,
    pub offset: i64,
}

pub struct FeedRepository;

impl FeedRepository {
    /// Visible feeds for a viewer, newest (or most liked/viewed) first
    pub async fn list(pool: &PgPool, filter: &FeedFilter) -> Result<Vec<FeedRecord>> {
        let feeds = sqlx::query_as::<_, FeedRecord>(
            r#"
            SELECT f.id, f.user_id, f.title, f.content, f.is_public, f.view_count, f.like_count,
                   f.created_at, f.updated_at, f.deleted_at,
                   u.view_hash AS user_hash, u.nickname, u.profile_image
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            WHERE f.deleted_at IS NULL
              AND (f.is_public = 'Y' OR f.user_id = $1)
              AND ($1::BIGINT IS NULL OR NOT EXISTS (
                    SELECT 1 FROM denies_users d
                    WHERE d.user_id = $1 AND d.deny_user_id = f.user_id))
              AND ($2::BIGINT IS NULL OR f.id < $2)
              AND ($3::TEXT IS NULL OR f.title ILIKE '%' || $3 || '%')
              AND ($4::TEXT IS NULL OR u.nickname ILIKE '%' || $4 || '%')
              AND ($5::TEXT IS NULL OR u.view_hash = $5)
              AND ($6::DATE IS NULL OR f.created_at >= $6)
              AND ($7::DATE IS NULL OR f.created_at < $7 + 1)
            ORDER BY
              CASE WHEN $8::TEXT = 'likes' THEN f.like_count END DESC NULLS LAST,
              CASE WHEN $8::TEXT = 'views' THEN f.view_count END DESC NULLS LAST,
              f.created_at DESC, f.id DESC
            LIMIT $9 OFFSET $10
            "#,
        )
        .bind(filter.viewer_id)
        .bind(filter.cursor)
        .bind(&filter.title)
        .bind(&filter.nickname)
        .bind(&filter.target_user_hash)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.sort)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

        Ok(feeds)
    }

    /// Non-deleted feed with its author
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<FeedRecord>> {
        let feed = sqlx::query_as::<_, FeedRecord>(
            r#"
            SELECT f.id, f.user_id, f.title, f.content, f.is_public, f.view_count, f.like_count,
                   f.created_at, f.updated_at, f.deleted_at,
                   u.view_hash AS user_hash, u.nickname, u.profile_image
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            WHERE f.id = $1 AND f.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(feed)
    }

    pub async fn find_ownership(pool: &PgPool, id: i64) -> Result<Option<FeedOwnership>> {
        let row = sqlx::query_as::<_, FeedOwnership>(
            "SELECT id, user_id, deleted_at FROM feeds WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    pub async fn increment_view(pool: &PgPool, id: i64) -> Result<i32> {
        let views = sqlx::query_scalar::<_, i32>(
            "UPDATE feeds SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(views)
    }

    pub async fn create(
        conn: &mut PgConnection,
        user_id: i64,
        title: &str,
        content: &str,
        is_public: &str,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO feeds (user_id, title, content, is_public)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(is_public)
        .fetch_one(conn)
        .await?;

        Ok(id)
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: i64,
        title: &str,
        content: &str,
        is_public: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE feeds SET title = $2, content = $3, is_public = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(is_public)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Keeps the first deletion time on repeated calls
    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query("UPDATE feeds SET deleted_at = COALESCE(deleted_at, NOW()) WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn images_for(pool: &PgPool, feed_ids: &[i64]) -> Result<Vec<FeedImageRecord>> {
        let images = sqlx::query_as::<_, FeedImageRecord>(
            r#"
            SELECT id, feed_id, image_path, sort_order, width, height
            FROM feed_images
            WHERE feed_id = ANY($1)
            ORDER BY feed_id, sort_order, id
            "#,
        )
        .bind(feed_ids)
        .fetch_all(pool)
        .await?;

        Ok(images)
    }

    pub async fn insert_image(
        pool: &PgPool,
        feed_id: i64,
        image_path: &str,
        sort_order: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feed_images (feed_id, image_path, sort_order, width, height)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(feed_id)
        .bind(image_path)
        .bind(sort_order)
        .bind(width)
        .bind(height)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Drop the image rows of a feed, returning their stored paths
    pub async fn delete_images(pool: &PgPool, feed_id: i64) -> Result<Vec<String>> {
        let paths = sqlx::query_scalar::<_, String>(
            "DELETE FROM feed_images WHERE feed_id = $1 RETURNING image_path",
        )
        .bind(feed_id)
        .fetch_all(pool)
        .await?;

        Ok(paths)
    }

    pub async fn is_liked(pool: &PgPool, feed_id: i64, user_id: i64) -> Result<bool> {
        let liked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM feed_likes WHERE feed_id = $1 AND user_id = $2)",
        )
        .bind(feed_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(liked)
    }

    /// Flip the like of a user; returns `(liked, like_count)`
    ///
    /// The counter is floored at zero.
    pub async fn toggle_like(pool: &PgPool, feed_id: i64, user_id: i64) -> Result<(bool, i32)> {
        let mut tx = pool.begin().await?;

        let removed = sqlx::query("DELETE FROM feed_likes WHERE feed_id = $1 AND user_id = $2")
            .bind(feed_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        let like_count = if removed {
            sqlx::query_scalar::<_, i32>(
                r#"
                UPDATE feeds SET like_count = GREATEST(like_count - 1, 0)
                WHERE id = $1
                RETURNING like_count
                "#,
            )
            .bind(feed_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query("INSERT INTO feed_likes (feed_id, user_id) VALUES ($1, $2)")
                .bind(feed_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query_scalar::<_, i32>(
                "UPDATE feeds SET like_count = like_count + 1 WHERE id = $1 RETURNING like_count",
            )
            .bind(feed_id)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;
        Ok((!removed, like_count))
    }

    /// Feeds a user liked, most recent like first. A feed made private since
    /// then is listed only to its author.
    pub async fn liked_by(
        pool: &PgPool,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LikedFeedRecord>> {
        let rows = sqlx::query_as::<_, LikedFeedRecord>(
            r#"
            SELECT f.id AS feed_id, f.title, f.content,
                   (SELECT i.image_path FROM feed_images i
                     WHERE i.feed_id = f.id ORDER BY i.sort_order, i.id LIMIT 1) AS image,
                   l.created_at AS liked_at
            FROM feed_likes l
            JOIN feeds f ON f.id = l.feed_id
            WHERE l.user_id = $1 AND f.deleted_at IS NULL
              AND (f.is_public = 'Y' OR f.user_id = $1)
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
