//! Admin dashboard routes

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::services::DashboardService;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use bml_shared::types::{CommonResponse, DashboardStats};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

/// GET /api/v1/dashboard/stats (ADMIN)
async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<CommonResponse<DashboardStats>>> {
    let stats = DashboardService::stats(state.db()).await?;
    Ok(Json(CommonResponse::ok(stats)))
}
