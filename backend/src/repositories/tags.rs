//! Tag repository
//!
//! Tags are shared by feeds (`feed_tags`) and meal entries (`meal_tags`).

use anyhow::Result;
use sqlx::{PgConnection, PgPool};

/// Tag name attached to an owner row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedTag {
    pub owner_id: i64,
    pub name: String,
}

pub struct TagRepository;

impl TagRepository {
    pub async fn find_or_create(conn: &mut PgConnection, name: &str) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO tags (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_one(conn)
        .await?;

        Ok(id)
    }

    /// Replace the tag set of a feed, keeping the order of `names`
    pub async fn set_feed_tags(conn: &mut PgConnection, feed_id: i64, names: &[String]) -> Result<()> {
        sqlx::query("DELETE FROM feed_tags WHERE feed_id = $1")
            .bind(feed_id)
            .execute(&mut *conn)
            .await?;

        for (position, name) in (0_i32..).zip(names) {
            let tag_id = Self::find_or_create(&mut *conn, name).await?;
            sqlx::query(
                "INSERT INTO feed_tags (feed_id, tag_id, position) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            )
            .bind(feed_id)
            .bind(tag_id)
            .bind(position)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn set_meal_tags(conn: &mut PgConnection, meal_id: i64, names: &[String]) -> Result<()> {
        sqlx::query("DELETE FROM meal_tags WHERE meal_id = $1")
            .bind(meal_id)
            .execute(&mut *conn)
            .await?;

        for (position, name) in (0_i32..).zip(names) {
            let tag_id = Self::find_or_create(&mut *conn, name).await?;
            sqlx::query(
                "INSERT INTO meal_tags (meal_id, tag_id, position) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            )
            .bind(meal_id)
            .bind(tag_id)
            .bind(position)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn for_feeds(pool: &PgPool, feed_ids: &[i64]) -> Result<Vec<OwnedTag>> {
        let rows = sqlx::query_as::<_, OwnedTag>(
            r#"
            SELECT ft.feed_id AS owner_id, t.name
            FROM feed_tags ft
            JOIN tags t ON t.id = ft.tag_id
            WHERE ft.feed_id = ANY($1)
            ORDER BY ft.feed_id, ft.position, t.id
            "#,
        )
        .bind(feed_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn for_meals(pool: &PgPool, meal_ids: &[i64]) -> Result<Vec<OwnedTag>> {
        let rows = sqlx::query_as::<_, OwnedTag>(
            r#"
            SELECT mt.meal_id AS owner_id, t.name
            FROM meal_tags mt
            JOIN tags t ON t.id = mt.tag_id
            WHERE mt.meal_id = ANY($1)
            ORDER BY mt.meal_id, mt.position, t.id
            "#,
        )
        .bind(meal_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Tag names containing `query`, shortest first
    pub async fn search(pool: &PgPool, query: &str, limit: i64) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name FROM tags
            WHERE name ILIKE '%' || $1 || '%'
            ORDER BY LENGTH(name), name
            LIMIT $2
            "#,
        )
        .bind(query)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(names)
    }
}
