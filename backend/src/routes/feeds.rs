//! Feed routes: posts, likes, tags and comments

use super::extract::MultipartForm;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{FeedForm, FeedService};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use bml_shared::models::YesNo;
use bml_shared::types::{
    CommentListQuery, CommentNode, CommentTreeResponse, CommonResponse, CreateCommentRequest,
    FeedLikeToggleResponse, FeedListQuery, FeedResponse, LikedFeed, LikedFeedsQuery,
    TagSearchQuery,
};

pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_feeds).post(create_feed))
        .route("/likes", get(liked_feeds))
        .route("/tags/search", get(search_tags))
        .route("/comments/:comment_hash", delete(delete_comment))
        .route("/:id", get(feed_detail).put(update_feed).delete(delete_feed))
        .route("/:id/like", post(toggle_like))
        .route("/:id/comments", get(list_comments).post(add_comment))
}

async fn read_form(multipart: Multipart) -> ApiResult<(FeedForm, MultipartForm)> {
    let mut form = MultipartForm::read(multipart).await?;
    let feed = FeedForm {
        title: form.text("title").unwrap_or_default(),
        content: form.text("content").unwrap_or_default(),
        is_public: form.parse::<YesNo>("is_public")?,
        tags: form.text("tags"),
    };
    Ok((feed, form))
}

/// GET /api/v1/feeds
async fn list_feeds(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Query(query): Query<FeedListQuery>,
) -> ApiResult<Json<CommonResponse<Vec<FeedResponse>>>> {
    let feeds = FeedService::list(state.db(), viewer.map(|v| v.user_id), query).await?;
    Ok(Json(CommonResponse::ok(feeds)))
}

/// GET /api/v1/feeds/:id
async fn feed_detail(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CommonResponse<FeedResponse>>> {
    let feed = FeedService::detail(state.db(), viewer.map(|v| v.user_id), id).await?;
    Ok(Json(CommonResponse::ok(feed)))
}

/// POST /api/v1/feeds
///
/// Multipart: `title`, `content`, `is_public`, `tags` and repeated `files`.
async fn create_feed(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<CommonResponse<FeedResponse>>> {
    let (feed, mut form) = read_form(multipart).await?;
    let files = form.files("files");

    let created = FeedService::create(state.db(), state.media(), auth.user_id, feed, files).await?;
    Ok(Json(CommonResponse::with_message("Feed created", created)))
}

/// PUT /api/v1/feeds/:id
async fn update_feed(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Json<CommonResponse<FeedResponse>>> {
    let (feed, mut form) = read_form(multipart).await?;
    let files = form.files("files");

    let updated =
        FeedService::update(state.db(), state.media(), auth.user_id, id, feed, files).await?;
    Ok(Json(CommonResponse::with_message("Feed updated", updated)))
}

/// DELETE /api/v1/feeds/:id
async fn delete_feed(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<CommonResponse<()>>> {
    FeedService::delete(state.db(), auth.user_id, id).await?;
    Ok(Json(CommonResponse::message("Feed deleted")))
}

/// POST /api/v1/feeds/:id/like
async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<CommonResponse<FeedLikeToggleResponse>>> {
    let result = FeedService::toggle_like(state.db(), auth.user_id, id).await?;
    Ok(Json(CommonResponse::ok(result)))
}

/// GET /api/v1/feeds/likes
async fn liked_feeds(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LikedFeedsQuery>,
) -> ApiResult<Json<CommonResponse<Vec<LikedFeed>>>> {
    let feeds = FeedService::liked(state.db(), auth.user_id, query).await?;
    Ok(Json(CommonResponse::ok(feeds)))
}

/// GET /api/v1/feeds/tags/search?query=
async fn search_tags(
    State(state): State<AppState>,
    Query(query): Query<TagSearchQuery>,
) -> ApiResult<Json<CommonResponse<Vec<String>>>> {
    let tags = FeedService::search_tags(state.db(), &query.query).await?;
    Ok(Json(CommonResponse::ok(tags)))
}

/// POST /api/v1/feeds/:id/comments
async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<CommonResponse<CommentNode>>> {
    let comment = FeedService::add_comment(state.db(), auth.user_id, id, req).await?;
    Ok(Json(CommonResponse::ok(comment)))
}

/// GET /api/v1/feeds/:id/comments
async fn list_comments(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<i64>,
    Query(query): Query<CommentListQuery>,
) -> ApiResult<Json<CommonResponse<CommentTreeResponse>>> {
    let comments =
        FeedService::comments(state.db(), viewer.map(|v| v.user_id), id, query).await?;
    Ok(Json(CommonResponse::ok(CommentTreeResponse { comments })))
}

/// DELETE /api/v1/feeds/comments/:comment_hash
async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_hash): Path<String>,
) -> ApiResult<Json<CommonResponse<()>>> {
    FeedService::delete_comment(state.db(), auth.user_id, &comment_hash).await?;
    Ok(Json(CommonResponse::message("Comment deleted")))
}
