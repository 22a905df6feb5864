//! Category codes and food items

use super::flag;
use crate::error::ApiError;
use crate::repositories::{CategoryRecord, CategoryRepository, FoodRecord, FoodRepository};
use bml_shared::types::{CategoryCode, FoodItem, SaveCategoryRequest, SaveFoodRequest};
use bml_shared::validation::{validate_max_len, validate_not_blank};
use sqlx::PgPool;
use std::collections::BTreeMap;

const FOOD_SEARCH_LIMIT: i64 = 50;
const DEFAULT_FOOD_TYPE: &str = "food";
/// Keeps `{TYPE}_{n}` inside the 30-character code column
const MAX_FOOD_TYPE_LEN: usize = 16;
const MAX_FOOD_NAME_LEN: usize = 200;

/// `{TYPE}_{sort:03}`
pub fn default_category_code(category_type: &str, sort: i32) -> String {
    format!("{}_{:03}", category_type, sort)
}

/// Next food code of a type: `{TYPE}_{n:06}`
///
/// `n` is the numeric suffix of the last issued code plus one; a missing or
/// non-numeric suffix counts as zero.
pub fn next_food_code(food_type: &str, last_code: Option<&str>) -> String {
    let last = last_code
        .and_then(|code| code.rsplit('_').next())
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}_{:06}", food_type.to_uppercase(), last.saturating_add(1))
}

fn to_code(record: CategoryRecord) -> CategoryCode {
    CategoryCode {
        is_active: flag(&record.is_active),
        id: record.id,
        category_type: record.category_type,
        code: record.code,
        value: record.value,
        sort: record.sort,
    }
}

fn to_food(record: FoodRecord) -> FoodItem {
    FoodItem {
        id: record.id,
        food_code: record.food_code,
        food_type: record.food_type,
        food_name: record.food_name,
    }
}

pub struct CategoryService;

impl CategoryService {
    /// Active codes keyed by lowercased type
    pub async fn list(
        pool: &PgPool,
        category_type: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<CategoryCode>>, ApiError> {
        let category_type = category_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_uppercase);
        let rows = CategoryRepository::list_active(pool, category_type.as_deref())
            .await
            .map_err(ApiError::from_repo)?;

        let mut grouped: BTreeMap<String, Vec<CategoryCode>> = BTreeMap::new();
        for row in rows {
            grouped
                .entry(row.category_type.to_lowercase())
                .or_default()
                .push(to_code(row));
        }
        Ok(grouped)
    }

    async fn check_conflicts(
        pool: &PgPool,
        category_type: &str,
        value: &str,
        sort: i32,
        code: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), ApiError> {
        if CategoryRepository::sort_taken(pool, category_type, sort, exclude_id)
            .await
            .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict(format!(
                "Sort {} is already used in {}",
                sort, category_type
            )));
        }
        if CategoryRepository::value_taken(pool, category_type, value, exclude_id)
            .await
            .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict(format!(
                "'{}' already exists in {}",
                value, category_type
            )));
        }
        if CategoryRepository::code_taken(pool, category_type, code, exclude_id)
            .await
            .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict(format!("Code {} already exists", code)));
        }
        Ok(())
    }

    pub async fn create(pool: &PgPool, req: SaveCategoryRequest) -> Result<CategoryCode, ApiError> {
        validate_not_blank("type", &req.category_type).map_err(ApiError::Validation)?;
        validate_not_blank("value", &req.value).map_err(ApiError::Validation)?;

        let category_type = req.category_type.trim().to_uppercase();
        let value = req.value.trim();
        let sort = req.sort.unwrap_or(1);
        let code = req
            .code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_category_code(&category_type, sort));

        Self::check_conflicts(pool, &category_type, value, sort, &code, None).await?;
        let row = CategoryRepository::create(pool, &category_type, &code, value, sort)
            .await
            .map_err(ApiError::from_repo)?;
        Ok(to_code(row))
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        req: SaveCategoryRequest,
    ) -> Result<CategoryCode, ApiError> {
        validate_not_blank("type", &req.category_type).map_err(ApiError::Validation)?;
        validate_not_blank("value", &req.value).map_err(ApiError::Validation)?;
        let current = CategoryRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

        let category_type = req.category_type.trim().to_uppercase();
        let value = req.value.trim();
        let sort = req.sort.unwrap_or(current.sort);
        let code = req
            .code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or(current.code);

        Self::check_conflicts(pool, &category_type, value, sort, &code, Some(id)).await?;
        let row = CategoryRepository::update(pool, id, &category_type, &code, value, sort)
            .await
            .map_err(ApiError::from_repo)?;
        Ok(to_code(row))
    }

    pub async fn deactivate(pool: &PgPool, id: i64) -> Result<(), ApiError> {
        CategoryRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
        CategoryRepository::deactivate(pool, id)
            .await
            .map_err(ApiError::from_repo)
    }

    pub async fn foods(
        pool: &PgPool,
        food_type: Option<&str>,
        food_name: Option<&str>,
    ) -> Result<Vec<FoodItem>, ApiError> {
        let food_type = food_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        let food_name = food_name.map(str::trim).filter(|n| !n.is_empty());
        let rows = FoodRepository::list(pool, food_type.as_deref(), food_name)
            .await
            .map_err(ApiError::from_repo)?;
        Ok(rows.into_iter().map(to_food).collect())
    }

    pub async fn search_foods(pool: &PgPool, food_name: &str) -> Result<Vec<FoodItem>, ApiError> {
        let food_name = food_name.trim();
        if food_name.is_empty() {
            return Ok(Vec::new());
        }
        let rows = FoodRepository::search(pool, food_name, FOOD_SEARCH_LIMIT)
            .await
            .map_err(ApiError::from_repo)?;
        Ok(rows.into_iter().map(to_food).collect())
    }

    pub async fn create_food(pool: &PgPool, req: SaveFoodRequest) -> Result<FoodItem, ApiError> {
        validate_food(&req)?;
        let food_type = food_type_of(req.food_type.as_deref());
        let food_name = req.food_name.trim();

        if FoodRepository::name_taken(pool, &food_type, food_name, None)
            .await
            .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict(format!("'{}' already exists", food_name)));
        }

        let last = FoodRepository::last_code(pool, &food_type.to_uppercase())
            .await
            .map_err(ApiError::from_repo)?;
        let code = next_food_code(&food_type, last.as_deref());
        let row = FoodRepository::create(pool, &code, &food_type, food_name)
            .await
            .map_err(ApiError::from_repo)?;
        Ok(to_food(row))
    }

    pub async fn update_food(
        pool: &PgPool,
        id: i64,
        req: SaveFoodRequest,
    ) -> Result<FoodItem, ApiError> {
        validate_food(&req)?;
        let current = FoodRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Food not found".to_string()))?;

        let food_type = match req.food_type.as_deref() {
            Some(_) => food_type_of(req.food_type.as_deref()),
            None => current.food_type,
        };
        let food_name = req.food_name.trim();
        if FoodRepository::name_taken(pool, &food_type, food_name, Some(id))
            .await
            .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict(format!("'{}' already exists", food_name)));
        }

        let row = FoodRepository::update(pool, id, &food_type, food_name)
            .await
            .map_err(ApiError::from_repo)?;
        Ok(to_food(row))
    }
}

/// Trimmed, lowercased type; blank means the default
fn food_type_of(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_FOOD_TYPE)
        .to_lowercase()
}

fn validate_food(req: &SaveFoodRequest) -> Result<(), ApiError> {
    validate_not_blank("food_name", &req.food_name).map_err(ApiError::Validation)?;
    validate_max_len("food_name", &req.food_name, MAX_FOOD_NAME_LEN)
        .map_err(ApiError::Validation)?;
    if let Some(food_type) = &req.food_type {
        validate_max_len("food_type", food_type, MAX_FOOD_TYPE_LEN)
            .map_err(ApiError::Validation)?;
    }
    Ok(())
}
