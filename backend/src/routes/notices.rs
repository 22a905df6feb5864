//! Notice routes. Reading is public; writes need the ADMIN role.

use super::extract::client_ip;
use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::services::NoticeService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use bml_shared::types::{CommonResponse, NoticeDetail, NoticeSummary, SaveNoticeRequest};

pub fn notice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notices).post(create_notice))
        .route(
            "/:hash",
            get(notice_detail).put(update_notice).delete(delete_notice),
        )
}

async fn list_notices(
    State(state): State<AppState>,
) -> ApiResult<Json<CommonResponse<Vec<NoticeSummary>>>> {
    let notices = NoticeService::list(state.db()).await?;
    Ok(Json(CommonResponse::ok(notices)))
}

async fn notice_detail(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> ApiResult<Json<CommonResponse<NoticeDetail>>> {
    let notice = NoticeService::detail(state.db(), &hash).await?;
    Ok(Json(CommonResponse::ok(notice)))
}

async fn create_notice(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    headers: HeaderMap,
    Json(req): Json<SaveNoticeRequest>,
) -> ApiResult<Json<CommonResponse<NoticeDetail>>> {
    let ip = client_ip(&headers);
    let notice = NoticeService::create(state.db(), admin.user_id, &ip, req).await?;
    Ok(Json(CommonResponse::with_message("Notice created", notice)))
}

async fn update_notice(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(hash): Path<String>,
    Json(req): Json<SaveNoticeRequest>,
) -> ApiResult<Json<CommonResponse<NoticeDetail>>> {
    let notice = NoticeService::update(state.db(), &hash, req).await?;
    Ok(Json(CommonResponse::with_message("Notice updated", notice)))
}

async fn delete_notice(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(hash): Path<String>,
) -> ApiResult<Json<CommonResponse<()>>> {
    NoticeService::delete(state.db(), &hash).await?;
    Ok(Json(CommonResponse::message("Notice deleted")))
}
