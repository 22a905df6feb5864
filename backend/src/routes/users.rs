//! User profile, password, block list and the admin user listing

use super::extract::MultipartForm;
use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::services::{ProfileUpdate, UserService};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use bml_shared::types::{
    ChangePasswordRequest, CommonResponse, DeniedUser, DenyToggleResponse, DenyUserRequest,
    MyInfoResponse, PaginatedResponse, PublicProfile, UserListQuery, UserResponse,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(my_info).put(update_me))
        .route("/password", put(change_password))
        .route("/profile/:user_hash", get(public_profile))
        .route("/denies", get(list_denies).post(toggle_deny))
}

/// GET /api/v1/users/me
async fn my_info(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CommonResponse<MyInfoResponse>>> {
    let info = UserService::my_info(state.db(), auth.user_id).await?;
    Ok(Json(CommonResponse::ok(info)))
}

/// PUT /api/v1/users/me
///
/// Multipart; absent fields keep their stored value.
async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<CommonResponse<UserResponse>>> {
    let mut form = MultipartForm::read(multipart).await?;
    let update = ProfileUpdate {
        nickname: form.non_blank("nickname"),
        description: form.text("description"),
        marketing_agree: form.flag("marketing_agree")?,
        push_agree: form.flag("push_agree")?,
    };
    let avatar = form.file("profile_image");

    let user =
        UserService::update_me(state.db(), state.media(), auth.user_id, update, avatar).await?;
    Ok(Json(CommonResponse::with_message("Profile updated", user)))
}

/// PUT /api/v1/users/password
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<CommonResponse<()>>> {
    UserService::change_password(
        state.db(),
        auth.user_id,
        &req.current_password,
        &req.new_password,
    )
    .await?;
    Ok(Json(CommonResponse::message("Password changed")))
}

/// GET /api/v1/users/profile/:user_hash
async fn public_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_hash): Path<String>,
) -> ApiResult<Json<CommonResponse<PublicProfile>>> {
    let profile = UserService::public_profile(state.db(), &user_hash).await?;
    Ok(Json(CommonResponse::ok(profile)))
}

/// POST /api/v1/users/denies
async fn toggle_deny(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<DenyUserRequest>,
) -> ApiResult<Json<CommonResponse<DenyToggleResponse>>> {
    let result = UserService::toggle_deny(state.db(), auth.user_id, &req.deny_user_hash).await?;
    Ok(Json(CommonResponse::ok(result)))
}

/// GET /api/v1/users/denies
async fn list_denies(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CommonResponse<Vec<DeniedUser>>>> {
    let denied = UserService::list_denies(state.db(), auth.user_id).await?;
    Ok(Json(CommonResponse::ok(denied)))
}

/// GET /api/v1/users (ADMIN)
async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<CommonResponse<PaginatedResponse<UserResponse>>>> {
    let page = UserService::list_users(state.db(), query).await?;
    Ok(Json(CommonResponse::ok(page)))
}
