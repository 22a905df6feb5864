//! Community board repository

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

/// Post row with viewer-dependent columns
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommunityRecord {
    pub id: i64,
    pub category_code: i32,
    pub user_id: i64,
    pub user_nickname: String,
    pub user_ip: String,
    pub view_count: i32,
    pub like_count: i32,
    pub title: String,
    pub contents: String,
    pub is_secret: String,
    pub is_active: String,
    pub is_notice: String,
    pub pinned_at: Option<DateTime<Utc>>,
    pub view_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub comment_count: i64,
    pub is_liked: bool,
    pub user_hash: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommunityImageRecord {
    pub id: i64,
    pub image_path: String,
    pub sort_order: i32,
    pub width: i32,
    pub height: i32,
}

/// Board filters; `sort` is one of `latest`, `likes`, `views`
#[derive(Debug, Clone, Default)]
pub struct CommunityFilter {
    pub viewer_id: i64,
    pub category_code: Option<i32>,
    pub is_notice: Option<&'static str>,
    pub is_secret: Option<&'static str>,
    pub keyword: Option<String>,
    pub user_nickname: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub my_only: bool,
    pub cursor: Option<i64>,
    pub sort: &'static str,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct NewCommunity<'a> {
    pub category_code: i32,
    pub user_id: i64,
    pub user_nickname: &'a str,
    pub user_ip: &'a str,
    pub title: &'a str,
    pub contents: &'a str,
    pub is_secret: &'a str,
    pub view_hash: &'a str,
}

const SELECT_POST: &str = r#"
    SELECT c.*,
           (SELECT COUNT(*) FROM community_comments cc
             WHERE cc.community_id = c.id AND cc.deleted_at IS NULL) AS comment_count,
           EXISTS(SELECT 1 FROM community_likes l
             WHERE l.community_id = c.id AND l.user_id = $1) AS is_liked,
           u.view_hash AS user_hash, u.profile_image
    FROM communities c
    LEFT JOIN users u ON u.id = c.user_id
"#;

// Shared by the page query and the total count; binds $1..$9.
const BOARD_FILTER: &str = r#"
    WHERE c.is_active = 'Y' AND c.deleted_at IS NULL
      AND NOT EXISTS (SELECT 1 FROM denies_users d
                      WHERE d.user_id = $1 AND d.deny_user_id = c.user_id)
      AND ($2::INT IS NULL OR c.category_code = $2)
      AND ($3::TEXT IS NULL OR c.is_notice = $3)
      AND ($4::TEXT IS NULL OR c.is_secret = $4)
      AND ($5::TEXT IS NULL OR c.title ILIKE '%' || $5 || '%'
                            OR c.contents ILIKE '%' || $5 || '%'
                            OR c.user_nickname ILIKE '%' || $5 || '%')
      AND ($6::TEXT IS NULL OR c.user_nickname ILIKE '%' || $6 || '%')
      AND ($7::DATE IS NULL OR c.created_at >= $7)
      AND ($8::DATE IS NULL OR c.created_at < $8 + 1)
      AND ($9::BOOLEAN IS NOT TRUE OR c.user_id = $1)
"#;

pub struct CommunityRepository;

impl CommunityRepository {
    /// One board page and the total count without the cursor
    pub async fn list(
        pool: &PgPool,
        filter: &CommunityFilter,
    ) -> Result<(Vec<CommunityRecord>, i64)> {
        let page_sql = format!(
            r#"
            {SELECT_POST}
            {BOARD_FILTER}
              AND ($10::BIGINT IS NULL OR c.id < $10)
            ORDER BY c.is_notice DESC, c.pinned_at DESC NULLS LAST,
              CASE WHEN $11::TEXT = 'likes' THEN c.like_count END DESC NULLS LAST,
              CASE WHEN $11::TEXT = 'views' THEN c.view_count END DESC NULLS LAST,
              c.id DESC
            LIMIT $12
            "#
        );
        let posts = sqlx::query_as::<_, CommunityRecord>(&page_sql)
            .bind(filter.viewer_id)
            .bind(filter.category_code)
            .bind(filter.is_notice)
            .bind(filter.is_secret)
            .bind(&filter.keyword)
            .bind(&filter.user_nickname)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.my_only)
            .bind(filter.cursor)
            .bind(filter.sort)
            .bind(filter.limit)
            .fetch_all(pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM communities c {BOARD_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filter.viewer_id)
            .bind(filter.category_code)
            .bind(filter.is_notice)
            .bind(filter.is_secret)
            .bind(&filter.keyword)
            .bind(&filter.user_nickname)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.my_only)
            .fetch_one(pool)
            .await?;

        Ok((posts, total))
    }

    /// Active post by hash, as seen by `viewer_id`
    pub async fn find_by_hash(
        pool: &PgPool,
        view_hash: &str,
        viewer_id: i64,
    ) -> Result<Option<CommunityRecord>> {
        let sql = format!(
            "{SELECT_POST} WHERE c.view_hash = $2 AND c.is_active = 'Y' AND c.deleted_at IS NULL"
        );
        let post = sqlx::query_as::<_, CommunityRecord>(&sql)
            .bind(viewer_id)
            .bind(view_hash)
            .fetch_optional(pool)
            .await?;

        Ok(post)
    }

    pub async fn create(pool: &PgPool, new: NewCommunity<'_>) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO communities (category_code, user_id, user_nickname, user_ip,
                                     title, contents, is_secret, view_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(new.category_code)
        .bind(new.user_id)
        .bind(new.user_nickname)
        .bind(new.user_ip)
        .bind(new.title)
        .bind(new.contents)
        .bind(new.is_secret)
        .bind(new.view_hash)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        title: &str,
        contents: &str,
        is_secret: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE communities SET title = $2, contents = $3, is_secret = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(contents)
        .bind(is_secret)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE communities SET is_active = 'N', deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn increment_view(pool: &PgPool, id: i64) -> Result<i32> {
        let views = sqlx::query_scalar::<_, i32>(
            "UPDATE communities SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(views)
    }

    /// Flip the like of a user; returns `(liked, like_count)`
    pub async fn toggle_like(pool: &PgPool, id: i64, user_id: i64) -> Result<(bool, i32)> {
        let mut tx = pool.begin().await?;

        let removed =
            sqlx::query("DELETE FROM community_likes WHERE community_id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                > 0;

        let like_count = if removed {
            sqlx::query_scalar::<_, i32>(
                r#"
                UPDATE communities SET like_count = GREATEST(like_count - 1, 0)
                WHERE id = $1
                RETURNING like_count
                "#,
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query("INSERT INTO community_likes (community_id, user_id) VALUES ($1, $2)")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query_scalar::<_, i32>(
                "UPDATE communities SET like_count = like_count + 1 WHERE id = $1 RETURNING like_count",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;
        Ok((!removed, like_count))
    }

    pub async fn images(pool: &PgPool, id: i64) -> Result<Vec<CommunityImageRecord>> {
        let images = sqlx::query_as::<_, CommunityImageRecord>(
            r#"
            SELECT id, image_path, sort_order, width, height
            FROM community_images
            WHERE community_id = $1
            ORDER BY sort_order, id
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(images)
    }

    /// Sort order for the next appended image
    pub async fn next_image_order(pool: &PgPool, id: i64) -> Result<i32> {
        let next = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM community_images WHERE community_id = $1",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(next)
    }

    pub async fn insert_image(
        pool: &PgPool,
        id: i64,
        image_path: &str,
        sort_order: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO community_images (community_id, image_path, sort_order, width, height)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(image_path)
        .bind(sort_order)
        .bind(width)
        .bind(height)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn delete_images(pool: &PgPool, id: i64) -> Result<Vec<String>> {
        let paths = sqlx::query_scalar::<_, String>(
            "DELETE FROM community_images WHERE community_id = $1 RETURNING image_path",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(paths)
    }
}
