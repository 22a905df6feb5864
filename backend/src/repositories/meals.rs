//! Meal calendar repository

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MealRecord {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub refer_feed_id: Option<i64>,
    pub title: String,
    pub contents: String,
    pub month: String,
    pub input_date: NaiveDate,
    pub is_pre_made: String,
    pub is_public: String,
    pub meal_condition: String,
    pub image_path: Option<String>,
    pub view_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMeal<'a> {
    pub user_id: i64,
    pub category_id: i64,
    pub refer_feed_id: Option<i64>,
    pub title: &'a str,
    pub contents: &'a str,
    pub month: &'a str,
    pub input_date: NaiveDate,
    pub is_pre_made: &'a str,
    pub is_public: &'a str,
    pub meal_condition: &'a str,
    pub view_hash: &'a str,
}

pub struct MealRepository;

impl MealRepository {
    /// Entries of one month, by date then category order
    pub async fn list_month(
        pool: &PgPool,
        user_id: i64,
        month: &str,
        public_only: bool,
    ) -> Result<Vec<MealRecord>> {
        let meals = sqlx::query_as::<_, MealRecord>(
            r#"
            SELECT m.id, m.user_id, m.category_id, cc.value AS category_name, m.refer_feed_id,
                   m.title, m.contents, m.month, m.input_date, m.is_pre_made, m.is_public,
                   m.meal_condition, m.image_path, m.view_hash, m.created_at
            FROM meal_calendars m
            LEFT JOIN categories_codes cc ON cc.id = m.category_id
            WHERE m.user_id = $1 AND m.month = $2
              AND ($3 = FALSE OR m.is_public = 'Y')
            ORDER BY m.input_date, cc.sort, m.category_id
            "#,
        )
        .bind(user_id)
        .bind(month)
        .bind(public_only)
        .fetch_all(pool)
        .await?;

        Ok(meals)
    }

    pub async fn find_by_hash(pool: &PgPool, view_hash: &str) -> Result<Option<MealRecord>> {
        let meal = sqlx::query_as::<_, MealRecord>(
            r#"
            SELECT m.id, m.user_id, m.category_id, cc.value AS category_name, m.refer_feed_id,
                   m.title, m.contents, m.month, m.input_date, m.is_pre_made, m.is_public,
                   m.meal_condition, m.image_path, m.view_hash, m.created_at
            FROM meal_calendars m
            LEFT JOIN categories_codes cc ON cc.id = m.category_id
            WHERE m.view_hash = $1
            "#,
        )
        .bind(view_hash)
        .fetch_optional(pool)
        .await?;

        Ok(meal)
    }

    pub async fn slot_taken(
        pool: &PgPool,
        user_id: i64,
        input_date: NaiveDate,
        category_id: i64,
    ) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM meal_calendars
                WHERE user_id = $1 AND input_date = $2 AND category_id = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(input_date)
        .bind(category_id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    pub async fn create(conn: &mut PgConnection, new: NewMeal<'_>) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO meal_calendars (user_id, category_id, refer_feed_id, title, contents,
                                        month, input_date, is_pre_made, is_public,
                                        meal_condition, view_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(new.user_id)
        .bind(new.category_id)
        .bind(new.refer_feed_id)
        .bind(new.title)
        .bind(new.contents)
        .bind(new.month)
        .bind(new.input_date)
        .bind(new.is_pre_made)
        .bind(new.is_public)
        .bind(new.meal_condition)
        .bind(new.view_hash)
        .fetch_one(conn)
        .await?;

        Ok(id)
    }

    pub async fn set_image(pool: &PgPool, id: i64, image_path: &str) -> Result<()> {
        sqlx::query("UPDATE meal_calendars SET image_path = $2 WHERE id = $1")
            .bind(id)
            .bind(image_path)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Hard delete with tag mappings
    pub async fn delete(pool: &PgPool, id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM meal_tags WHERE meal_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM meal_calendars WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Category ids already recorded on a date
    pub async fn categories_on(pool: &PgPool, user_id: i64, date: NaiveDate) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT category_id FROM meal_calendars
            WHERE user_id = $1 AND input_date = $2
            ORDER BY category_id
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    pub async fn month_image(pool: &PgPool, user_id: i64, month: &str) -> Result<Option<String>> {
        let path = sqlx::query_scalar::<_, String>(
            "SELECT image_path FROM meal_calendar_images WHERE user_id = $1 AND month = $2",
        )
        .bind(user_id)
        .bind(month)
        .fetch_optional(pool)
        .await?;

        Ok(path)
    }

    /// Insert or replace the month image; returns the replaced path
    pub async fn upsert_month_image(
        pool: &PgPool,
        user_id: i64,
        month: &str,
        image_path: &str,
        width: i32,
        height: i32,
    ) -> Result<Option<String>> {
        let mut tx = pool.begin().await?;

        let previous = sqlx::query_scalar::<_, String>(
            r#"
            SELECT image_path FROM meal_calendar_images
            WHERE user_id = $1 AND month = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(month)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO meal_calendar_images (user_id, month, image_path, width, height)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, month) DO UPDATE SET
                image_path = EXCLUDED.image_path,
                width = EXCLUDED.width,
                height = EXCLUDED.height,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(month)
        .bind(image_path)
        .bind(width)
        .bind(height)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(previous)
    }
}
