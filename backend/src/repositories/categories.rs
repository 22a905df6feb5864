//! Category code and food item repositories

use anyhow::Result;
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRecord {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub category_type: String,
    pub code: String,
    pub value: String,
    pub sort: i32,
    pub is_active: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FoodRecord {
    pub id: i64,
    pub food_code: String,
    pub food_type: String,
    pub food_name: String,
}

pub struct CategoryRepository;

impl CategoryRepository {
    pub async fn list_active(pool: &PgPool, category_type: Option<&str>) -> Result<Vec<CategoryRecord>> {
        let rows = sqlx::query_as::<_, CategoryRecord>(
            r#"
            SELECT id, type, code, value, sort, is_active
            FROM categories_codes
            WHERE is_active = 'Y' AND ($1::TEXT IS NULL OR type = $1)
            ORDER BY type, sort
            "#,
        )
        .bind(category_type)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<CategoryRecord>> {
        let row = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, type, code, value, sort, is_active FROM categories_codes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    pub async fn find_active_by_id(pool: &PgPool, id: i64) -> Result<Option<CategoryRecord>> {
        let row = sqlx::query_as::<_, CategoryRecord>(
            r#"
            SELECT id, type, code, value, sort, is_active
            FROM categories_codes
            WHERE id = $1 AND is_active = 'Y'
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Whether another row of the type already uses `sort`
    pub async fn sort_taken(
        pool: &PgPool,
        category_type: &str,
        sort: i32,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories_codes
                WHERE type = $1 AND sort = $2 AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(category_type)
        .bind(sort)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    pub async fn value_taken(
        pool: &PgPool,
        category_type: &str,
        value: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories_codes
                WHERE type = $1 AND value = $2 AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(category_type)
        .bind(value)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    pub async fn code_taken(
        pool: &PgPool,
        category_type: &str,
        code: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories_codes
                WHERE type = $1 AND code = $2 AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(category_type)
        .bind(code)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    pub async fn create(
        pool: &PgPool,
        category_type: &str,
        code: &str,
        value: &str,
        sort: i32,
    ) -> Result<CategoryRecord> {
        let row = sqlx::query_as::<_, CategoryRecord>(
            r#"
            INSERT INTO categories_codes (type, code, value, sort)
            VALUES ($1, $2, $3, $4)
            RETURNING id, type, code, value, sort, is_active
            "#,
        )
        .bind(category_type)
        .bind(code)
        .bind(value)
        .bind(sort)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        category_type: &str,
        code: &str,
        value: &str,
        sort: i32,
    ) -> Result<CategoryRecord> {
        let row = sqlx::query_as::<_, CategoryRecord>(
            r#"
            UPDATE categories_codes SET type = $2, code = $3, value = $4, sort = $5,
                                        updated_at = NOW()
            WHERE id = $1
            RETURNING id, type, code, value, sort, is_active
            "#,
        )
        .bind(id)
        .bind(category_type)
        .bind(code)
        .bind(value)
        .bind(sort)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    pub async fn deactivate(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query("UPDATE categories_codes SET is_active = 'N', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

pub struct FoodRepository;

impl FoodRepository {
    pub async fn list(
        pool: &PgPool,
        food_type: Option<&str>,
        food_name: Option<&str>,
    ) -> Result<Vec<FoodRecord>> {
        let rows = sqlx::query_as::<_, FoodRecord>(
            r#"
            SELECT id, food_code, food_type, food_name
            FROM food_items
            WHERE ($1::TEXT IS NULL OR food_type = $1)
              AND ($2::TEXT IS NULL OR food_name ILIKE '%' || $2 || '%')
            ORDER BY food_type, food_name
            "#,
        )
        .bind(food_type)
        .bind(food_name)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn search(pool: &PgPool, food_name: &str, limit: i64) -> Result<Vec<FoodRecord>> {
        let rows = sqlx::query_as::<_, FoodRecord>(
            r#"
            SELECT id, food_code, food_type, food_name
            FROM food_items
            WHERE food_name ILIKE '%' || $1 || '%'
            ORDER BY LENGTH(food_name), food_name
            LIMIT $2
            "#,
        )
        .bind(food_name)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<FoodRecord>> {
        let row = sqlx::query_as::<_, FoodRecord>(
            "SELECT id, food_code, food_type, food_name FROM food_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    pub async fn name_taken(
        pool: &PgPool,
        food_type: &str,
        food_name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM food_items
                WHERE food_type = $1 AND food_name = $2 AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(food_type)
        .bind(food_name)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    /// Highest-numbered code issued under `{prefix}_`, whatever the row's
    /// current type
    pub async fn last_code(pool: &PgPool, prefix: &str) -> Result<Option<String>> {
        let code = sqlx::query_scalar::<_, String>(
            r#"
            SELECT food_code FROM food_items
            WHERE LEFT(food_code, LENGTH($1) + 1) = $1 || '_'
              AND SUBSTRING(food_code FROM LENGTH($1) + 2) ~ '^[0-9]+$'
            ORDER BY CAST(SUBSTRING(food_code FROM LENGTH($1) + 2) AS NUMERIC) DESC
            LIMIT 1
            "#,
        )
        .bind(prefix)
        .fetch_optional(pool)
        .await?;

        Ok(code)
    }

    pub async fn create(
        pool: &PgPool,
        food_code: &str,
        food_type: &str,
        food_name: &str,
    ) -> Result<FoodRecord> {
        let row = sqlx::query_as::<_, FoodRecord>(
            r#"
            INSERT INTO food_items (food_code, food_type, food_name)
            VALUES ($1, $2, $3)
            RETURNING id, food_code, food_type, food_name
            "#,
        )
        .bind(food_code)
        .bind(food_type)
        .bind(food_name)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        food_type: &str,
        food_name: &str,
    ) -> Result<FoodRecord> {
        let row = sqlx::query_as::<_, FoodRecord>(
            r#"
            UPDATE food_items SET food_type = $2, food_name = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, food_code, food_type, food_name
            "#,
        )
        .bind(id)
        .bind(food_type)
        .bind(food_name)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }
}
