//! Authentication routes
//!
//! Registration, e-mail and social login, token refresh and withdrawal.
//! Password hashing runs on the blocking pool inside `UserService`.

use super::extract::MultipartForm;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    routing::{delete, post},
    Json, Router,
};
use bml_shared::models::SnsLoginType;
use bml_shared::types::{
    AuthTokens, CommonResponse, GoogleLoginRequest, LoginRequest, LoginResponse,
    RefreshTokenRequest, RegisterData, SocialTokenRequest,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/kakao", post(kakao_login))
        .route("/naver", post(naver_login))
        .route("/google", post(google_login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/withdraw", delete(withdraw))
}

/// POST /api/v1/auth/register
///
/// Multipart: a `data` JSON part and an optional `profile_image` file.
async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<CommonResponse<LoginResponse>>> {
    let mut form = MultipartForm::read(multipart).await?;
    let data: RegisterData = serde_json::from_str(&form.require("data")?)
        .map_err(|e| ApiError::Validation(format!("Invalid registration data: {}", e)))?;
    let avatar = form.file("profile_image");

    let response =
        UserService::register(state.db(), state.jwt(), state.media(), data, avatar).await?;
    Ok(Json(CommonResponse::with_message("Registered", response)))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<CommonResponse<LoginResponse>>> {
    let response = UserService::login(state.db(), state.jwt(), &req.email, &req.password).await?;
    Ok(Json(CommonResponse::ok(response)))
}

async fn social_login(
    state: &AppState,
    login_type: SnsLoginType,
    token: &str,
) -> ApiResult<Json<CommonResponse<LoginResponse>>> {
    if token.trim().is_empty() {
        return Err(ApiError::Validation("A provider token is required".to_string()));
    }
    let provider = state.social().provider(login_type).ok_or_else(|| {
        ApiError::BadRequest(format!("{} login is not available", login_type))
    })?;

    let response = UserService::social_login(state.db(), state.jwt(), provider, token).await?;
    Ok(Json(CommonResponse::ok(response)))
}

/// POST /api/v1/auth/kakao
async fn kakao_login(
    State(state): State<AppState>,
    Json(req): Json<SocialTokenRequest>,
) -> ApiResult<Json<CommonResponse<LoginResponse>>> {
    social_login(&state, SnsLoginType::Kakao, &req.access_token).await
}

/// POST /api/v1/auth/naver
async fn naver_login(
    State(state): State<AppState>,
    Json(req): Json<SocialTokenRequest>,
) -> ApiResult<Json<CommonResponse<LoginResponse>>> {
    social_login(&state, SnsLoginType::Naver, &req.access_token).await
}

/// POST /api/v1/auth/google
async fn google_login(
    State(state): State<AppState>,
    Json(req): Json<GoogleLoginRequest>,
) -> ApiResult<Json<CommonResponse<LoginResponse>>> {
    social_login(&state, SnsLoginType::Google, &req.id_token).await
}

/// POST /api/v1/auth/refresh
async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<CommonResponse<AuthTokens>>> {
    let tokens = UserService::refresh_token(state.db(), state.jwt(), &req.refresh_token).await?;
    Ok(Json(CommonResponse::ok(tokens)))
}

/// POST /api/v1/auth/logout
///
/// Tokens are stateless; the client drops them.
async fn logout(_auth: AuthUser) -> Json<CommonResponse<()>> {
    Json(CommonResponse::message("Logged out"))
}

/// DELETE /api/v1/auth/withdraw
async fn withdraw(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CommonResponse<()>>> {
    UserService::withdraw(state.db(), auth.user_id).await?;
    Ok(Json(CommonResponse::message("Account withdrawn")))
}
