//! Meal calendar routes

use super::extract::MultipartForm;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::{MealForm, MealService};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use bml_shared::models::YesNo;
use bml_shared::types::{
    CalendarQuery, CalendarResponse, CommonResponse, CreateMealResponse, DailyCheckQuery,
    DailyCheckResponse, MonthImageResponse,
};
use chrono::NaiveDate;

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_meal))
        .route("/calendar", get(calendar))
        .route("/calendar/image", post(upload_month_image))
        .route("/check", get(check_date))
        .route("/:hash", delete(delete_meal))
}

/// GET /api/v1/meals/calendar?month=YYYY-MM&user_hash=
async fn calendar(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CommonResponse<CalendarResponse>>> {
    let calendar = MealService::calendar(
        state.db(),
        auth.user_id,
        &query.month,
        query.user_hash.as_deref(),
    )
    .await?;
    Ok(Json(CommonResponse::ok(calendar)))
}

/// POST /api/v1/meals
///
/// Multipart with the entry fields and an optional `image`.
async fn create_meal(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<CommonResponse<CreateMealResponse>>> {
    let mut form = MultipartForm::read(multipart).await?;
    let meal = MealForm {
        category_id: form.parse_required("category_id")?,
        input_date: form.parse_required::<NaiveDate>("input_date")?,
        title: form.text("title").unwrap_or_default(),
        contents: form.text("contents").unwrap_or_default(),
        is_pre_made: form.parse::<YesNo>("is_pre_made")?.unwrap_or(YesNo::N),
        is_public: form.parse::<YesNo>("is_public")?.unwrap_or(YesNo::N),
        meal_condition: form.text("meal_condition").unwrap_or_default(),
        refer_feed_id: form.parse("refer_feed_id")?,
        tags: form.text("tags"),
    };
    let image = form.file("image");

    let created = MealService::create(
        state.db(),
        state.media(),
        &state.config().jwt.secret,
        auth.user_id,
        meal,
        image,
    )
    .await?;
    Ok(Json(CommonResponse::with_message("Meal recorded", created)))
}

/// DELETE /api/v1/meals/:hash
async fn delete_meal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hash): Path<String>,
) -> ApiResult<Json<CommonResponse<()>>> {
    MealService::delete(state.db(), state.media(), auth.user_id, &hash).await?;
    Ok(Json(CommonResponse::message("Meal deleted")))
}

/// GET /api/v1/meals/check?date=YYYY-MM-DD
async fn check_date(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DailyCheckQuery>,
) -> ApiResult<Json<CommonResponse<DailyCheckResponse>>> {
    let result = MealService::check_date(state.db(), auth.user_id, query.date).await?;
    Ok(Json(CommonResponse::ok(result)))
}

/// POST /api/v1/meals/calendar/image
///
/// Multipart: `month` and `image`.
async fn upload_month_image(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<CommonResponse<MonthImageResponse>>> {
    let mut form = MultipartForm::read(multipart).await?;
    let month = form.require("month")?;
    let image = form
        .file("image")
        .ok_or_else(|| ApiError::Validation("image is required".to_string()))?;

    let result =
        MealService::upload_month_image(state.db(), state.media(), auth.user_id, month.trim(), image)
            .await?;
    Ok(Json(CommonResponse::ok(result)))
}
