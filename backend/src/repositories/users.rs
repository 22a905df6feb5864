//! User repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub sns_login_type: String,
    pub sns_id: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub profile_image: Option<String>,
    pub description: Option<String>,
    pub marketing_agree: bool,
    pub push_agree: bool,
    pub is_active: bool,
    pub view_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Active and not withdrawn
    pub fn is_usable(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub sns_login_type: String,
    pub sns_id: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub phone: String,
    pub profile_image: Option<String>,
    pub marketing_agree: bool,
    pub push_agree: bool,
    pub view_hash: String,
}

/// Partial profile update; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub nickname: Option<String>,
    pub description: Option<String>,
    pub marketing_agree: Option<bool>,
    pub push_agree: Option<bool>,
    pub profile_image: Option<String>,
}

/// Admin list filters (substring matches)
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub sns_id: Option<String>,
    pub name: Option<String>,
    pub nickname: Option<String>,
}

/// Activity counters shown on the account page
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct UserCounts {
    pub feed_count: i64,
    pub liked_feed_count: i64,
    pub community_count: i64,
}

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    pub async fn create(pool: &PgPool, user: NewUser) -> Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (sns_login_type, sns_id, password_hash, name, nickname, email,
                               phone, profile_image, marketing_agree, push_agree, view_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(user.sns_login_type)
        .bind(user.sns_id)
        .bind(user.password_hash)
        .bind(user.name)
        .bind(user.nickname)
        .bind(user.email)
        .bind(user.phone)
        .bind(user.profile_image)
        .bind(user.marketing_agree)
        .bind(user.push_agree)
        .bind(user.view_hash)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT * FROM users
            WHERE email = $1 AND sns_login_type = 'EMAIL'
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Active user by public hash
    pub async fn find_active_by_hash(pool: &PgPool, view_hash: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT * FROM users
            WHERE view_hash = $1 AND is_active AND deleted_at IS NULL
            "#,
        )
        .bind(view_hash)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_sns(
        pool: &PgPool,
        sns_login_type: &str,
        sns_id: &str,
    ) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT * FROM users
            WHERE sns_login_type = $1 AND sns_id = $2
            "#,
        )
        .bind(sns_login_type)
        .bind(sns_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND email <> '')",
        )
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    pub async fn phone_exists(pool: &PgPool, phone: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE phone = $1 AND phone <> '')",
        )
        .bind(phone)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    pub async fn sns_exists(pool: &PgPool, sns_login_type: &str, sns_id: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE sns_login_type = $1 AND sns_id = $2 AND sns_id <> ''
            )
            "#,
        )
        .bind(sns_login_type)
        .bind(sns_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    pub async fn touch_last_login(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Undo a withdrawal and refresh the provider avatar
    pub async fn reactivate(
        pool: &PgPool,
        id: i64,
        profile_image: Option<&str>,
    ) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users SET
                deleted_at = NULL,
                is_active = TRUE,
                profile_image = COALESCE($2, profile_image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(profile_image)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn update_profile(
        pool: &PgPool,
        id: i64,
        updates: UpdateProfile,
    ) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users SET
                nickname = COALESCE($2, nickname),
                description = COALESCE($3, description),
                marketing_agree = COALESCE($4, marketing_agree),
                push_agree = COALESCE($5, push_agree),
                profile_image = COALESCE($6, profile_image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(updates.nickname)
        .bind(updates.description)
        .bind(updates.marketing_agree)
        .bind(updates.push_agree)
        .bind(updates.profile_image)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn update_password(pool: &PgPool, id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Withdraw: the row stays, the account stops working
    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET is_active = FALSE, deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn counts(pool: &PgPool, id: i64) -> Result<UserCounts> {
        let counts = sqlx::query_as::<_, UserCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM feeds WHERE user_id = $1 AND deleted_at IS NULL) AS feed_count,
                (SELECT COUNT(*) FROM feed_likes l JOIN feeds f ON f.id = l.feed_id
                  WHERE l.user_id = $1 AND f.deleted_at IS NULL) AS liked_feed_count,
                (SELECT COUNT(*) FROM communities
                  WHERE user_id = $1 AND is_active = 'Y' AND deleted_at IS NULL) AS community_count
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(counts)
    }

    /// Public feeds of a user, as shown on the profile page
    pub async fn public_feed_count(pool: &PgPool, id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM feeds
            WHERE user_id = $1 AND is_public = 'Y' AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Filtered page of users with the total match count
    pub async fn list(
        pool: &PgPool,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserRecord>, i64)> {
        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT * FROM users
            WHERE ($1::TEXT IS NULL OR sns_id ILIKE '%' || $1 || '%')
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
              AND ($3::TEXT IS NULL OR nickname ILIKE '%' || $3 || '%')
            ORDER BY id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&filter.sns_id)
        .bind(&filter.name)
        .bind(&filter.nickname)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::TEXT IS NULL OR sns_id ILIKE '%' || $1 || '%')
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
              AND ($3::TEXT IS NULL OR nickname ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(&filter.sns_id)
        .bind(&filter.name)
        .bind(&filter.nickname)
        .fetch_one(pool)
        .await?;

        Ok((users, total))
    }
}
