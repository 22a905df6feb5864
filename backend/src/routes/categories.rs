//! Category code and food item routes

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::services::CategoryService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use bml_shared::types::{
    CategoryCode, CategoryQuery, CommonResponse, FoodItem, FoodListQuery, FoodSearchQuery,
    SaveCategoryRequest, SaveFoodRequest,
};
use std::collections::BTreeMap;

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/search", get(search_foods))
        .route("/foods/:id", put(update_food))
        .route("/:id", put(update_category).delete(deactivate_category))
}

/// GET /api/v1/categories?type=
async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<CommonResponse<BTreeMap<String, Vec<CategoryCode>>>>> {
    let grouped = CategoryService::list(state.db(), query.category_type.as_deref()).await?;
    Ok(Json(CommonResponse::ok(grouped)))
}

async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<SaveCategoryRequest>,
) -> ApiResult<Json<CommonResponse<CategoryCode>>> {
    let code = CategoryService::create(state.db(), req).await?;
    Ok(Json(CommonResponse::with_message("Category created", code)))
}

async fn update_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<SaveCategoryRequest>,
) -> ApiResult<Json<CommonResponse<CategoryCode>>> {
    let code = CategoryService::update(state.db(), id, req).await?;
    Ok(Json(CommonResponse::with_message("Category updated", code)))
}

async fn deactivate_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<CommonResponse<()>>> {
    CategoryService::deactivate(state.db(), id).await?;
    Ok(Json(CommonResponse::message("Category deactivated")))
}

/// GET /api/v1/categories/foods?food_type=&food_name=
async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<FoodListQuery>,
) -> ApiResult<Json<CommonResponse<Vec<FoodItem>>>> {
    let foods = CategoryService::foods(
        state.db(),
        query.food_type.as_deref(),
        query.food_name.as_deref(),
    )
    .await?;
    Ok(Json(CommonResponse::ok(foods)))
}

/// GET /api/v1/categories/foods/search?food_name=
async fn search_foods(
    State(state): State<AppState>,
    Query(query): Query<FoodSearchQuery>,
) -> ApiResult<Json<CommonResponse<Vec<FoodItem>>>> {
    let foods = CategoryService::search_foods(state.db(), &query.food_name).await?;
    Ok(Json(CommonResponse::ok(foods)))
}

async fn create_food(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<SaveFoodRequest>,
) -> ApiResult<Json<CommonResponse<FoodItem>>> {
    let food = CategoryService::create_food(state.db(), req).await?;
    Ok(Json(CommonResponse::with_message("Food created", food)))
}

async fn update_food(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<SaveFoodRequest>,
) -> ApiResult<Json<CommonResponse<FoodItem>>> {
    let food = CategoryService::update_food(state.db(), id, req).await?;
    Ok(Json(CommonResponse::with_message("Food updated", food)))
}
