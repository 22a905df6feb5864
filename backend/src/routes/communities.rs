//! Community board routes. Every endpoint requires a signed-in user.

use super::extract::{client_ip, MultipartForm};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::CommunityService;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};
use bml_shared::types::{
    CommentNode, CommentTreeResponse, CommonResponse, CommunityCommentQuery, CommunityDetail,
    CommunityLikeResponse, CommunityListQuery, CommunityListResponse, CreateCommentRequest,
    CreateCommunityRequest, UpdateCommentRequest, UpdateCommunityRequest,
};

pub fn community_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/comments/:comment_hash",
            put(update_comment).delete(delete_comment),
        )
        .route("/:hash", get(post_detail).put(update_post).delete(delete_post))
        .route("/:hash/like", post(toggle_like))
        .route("/:hash/images", post(upload_images))
        .route("/:hash/comments", get(list_comments).post(add_comment))
}

/// GET /api/v1/communities
async fn list_posts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<CommunityListQuery>,
) -> ApiResult<Json<CommonResponse<CommunityListResponse>>> {
    let page = CommunityService::list(state.db(), auth.user_id, query).await?;
    Ok(Json(CommonResponse::ok(page)))
}

/// POST /api/v1/communities
async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Json(req): Json<CreateCommunityRequest>,
) -> ApiResult<Json<CommonResponse<CommunityDetail>>> {
    let ip = client_ip(&headers);
    let post = CommunityService::create(state.db(), auth.user_id, &ip, req).await?;
    Ok(Json(CommonResponse::with_message("Post created", post)))
}

/// GET /api/v1/communities/:hash
async fn post_detail(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hash): Path<String>,
) -> ApiResult<Json<CommonResponse<CommunityDetail>>> {
    let post = CommunityService::detail(state.db(), auth.user_id, &hash).await?;
    Ok(Json(CommonResponse::ok(post)))
}

/// PUT /api/v1/communities/:hash
async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hash): Path<String>,
    Json(req): Json<UpdateCommunityRequest>,
) -> ApiResult<Json<CommonResponse<CommunityDetail>>> {
    let post = CommunityService::update(state.db(), auth.user_id, &hash, req).await?;
    Ok(Json(CommonResponse::with_message("Post updated", post)))
}

/// DELETE /api/v1/communities/:hash
async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hash): Path<String>,
) -> ApiResult<Json<CommonResponse<()>>> {
    CommunityService::delete(state.db(), state.media(), auth.user_id, &hash).await?;
    Ok(Json(CommonResponse::message("Post deleted")))
}

/// POST /api/v1/communities/:hash/like
async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hash): Path<String>,
) -> ApiResult<Json<CommonResponse<CommunityLikeResponse>>> {
    let result = CommunityService::toggle_like(state.db(), auth.user_id, &hash).await?;
    Ok(Json(CommonResponse::ok(result)))
}

/// POST /api/v1/communities/:hash/images
///
/// Multipart with repeated `files`; returns the stored image paths.
async fn upload_images(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hash): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<CommonResponse<Vec<String>>>> {
    let files = MultipartForm::read(multipart).await?.files("files");
    let paths =
        CommunityService::add_images(state.db(), state.media(), auth.user_id, &hash, files)
            .await?;
    Ok(Json(CommonResponse::ok(paths)))
}

/// POST /api/v1/communities/:hash/comments
async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hash): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<CommonResponse<CommentNode>>> {
    let comment = CommunityService::add_comment(state.db(), auth.user_id, &hash, req).await?;
    Ok(Json(CommonResponse::ok(comment)))
}

/// GET /api/v1/communities/:hash/comments
async fn list_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hash): Path<String>,
    Query(query): Query<CommunityCommentQuery>,
) -> ApiResult<Json<CommonResponse<CommentTreeResponse>>> {
    let comments =
        CommunityService::comments(state.db(), auth.user_id, &hash, query.limit).await?;
    Ok(Json(CommonResponse::ok(CommentTreeResponse { comments })))
}

/// PUT /api/v1/communities/comments/:comment_hash
async fn update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_hash): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<CommonResponse<()>>> {
    CommunityService::update_comment(state.db(), auth.user_id, &comment_hash, &req.comment)
        .await?;
    Ok(Json(CommonResponse::message("Comment updated")))
}

/// DELETE /api/v1/communities/comments/:comment_hash
async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_hash): Path<String>,
) -> ApiResult<Json<CommonResponse<()>>> {
    CommunityService::delete_comment(state.db(), auth.user_id, &comment_hash).await?;
    Ok(Json(CommonResponse::message("Comment deleted")))
}
