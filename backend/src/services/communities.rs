//! Community board service

use super::{author, check_uploads, dimension, discard_images, flag, store_images, CommentService};
use crate::error::ApiError;
use crate::hashing;
use crate::media::{ImageKind, ImageStore, UploadedFile};
use crate::repositories::{
    CommentTarget, CommunityFilter, CommunityRecord, CommunityRepository, NewCommunity,
    UserRepository,
};
use bml_shared::models::YesNo;
use bml_shared::types::{
    CommentNode, CommunityDetail, CommunityLikeResponse, CommunityListQuery,
    CommunityListResponse, CommunitySort, CommunitySummary, CreateCommentRequest,
    CreateCommunityRequest, UpdateCommunityRequest,
};
use bml_shared::validation::{
    clamp_limit, parse_month, validate_max_len, validate_not_blank, MAX_TITLE_LEN,
};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;

fn sort_key(sort: CommunitySort) -> &'static str {
    match sort {
        CommunitySort::Latest => "latest",
        CommunitySort::Likes => "likes",
        CommunitySort::Views => "views",
    }
}

/// Intersect an optional `YYYY-MM` month with an explicit date range
fn date_window(
    month: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ApiError> {
    let Some(month) = month.map(str::trim).filter(|m| !m.is_empty()) else {
        return Ok((start, end));
    };
    let (first, last) = parse_month(month).map_err(ApiError::Validation)?;
    let start = Some(start.map_or(first, |s| s.max(first)));
    let end = Some(end.map_or(last, |e| e.min(last)));
    Ok((start, end))
}

fn to_summary(post: CommunityRecord) -> CommunitySummary {
    CommunitySummary {
        id: post.id,
        is_secret: flag(&post.is_secret),
        is_notice: flag(&post.is_notice),
        is_liked: YesNo::from_bool(post.is_liked),
        view_hash: post.view_hash,
        category_code: post.category_code,
        title: post.title,
        contents: post.contents,
        user_nickname: post.user_nickname,
        view_count: post.view_count,
        like_count: post.like_count,
        comment_count: post.comment_count,
        user_hash: post.user_hash,
        profile_image: post.profile_image,
        pinned_at: post.pinned_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

fn to_detail(post: CommunityRecord, viewer_id: i64, images: Vec<String>) -> CommunityDetail {
    CommunityDetail {
        is_owner: post.user_id == viewer_id,
        is_secret: flag(&post.is_secret),
        user: author(
            post.user_hash,
            Some(post.user_nickname.clone()),
            post.profile_image,
        ),
        view_hash: post.view_hash,
        category_code: post.category_code,
        title: post.title,
        contents: post.contents,
        user_nickname: post.user_nickname,
        view_count: post.view_count,
        like_count: post.like_count,
        images,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub struct CommunityService;

impl CommunityService {
    async fn find(pool: &PgPool, view_hash: &str, viewer_id: i64) -> Result<CommunityRecord, ApiError> {
        CommunityRepository::find_by_hash(pool, view_hash, viewer_id)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
    }

    async fn owned(pool: &PgPool, view_hash: &str, user_id: i64) -> Result<CommunityRecord, ApiError> {
        let post = Self::find(pool, view_hash, user_id).await?;
        if post.user_id != user_id {
            return Err(ApiError::Forbidden("Not the author of this post".to_string()));
        }
        Ok(post)
    }

    async fn image_paths(pool: &PgPool, id: i64) -> Result<Vec<String>, ApiError> {
        Ok(CommunityRepository::images(pool, id)
            .await
            .map_err(ApiError::from_repo)?
            .into_iter()
            .map(|image| image.image_path)
            .collect())
    }

    pub async fn list(
        pool: &PgPool,
        viewer_id: i64,
        query: CommunityListQuery,
    ) -> Result<CommunityListResponse, ApiError> {
        let (start_date, end_date) =
            date_window(query.month.as_deref(), query.start_date, query.end_date)?;

        let filter = CommunityFilter {
            viewer_id,
            category_code: query.category_code,
            is_notice: query.is_notice.map(YesNo::as_str),
            is_secret: query.is_secret.map(YesNo::as_str),
            keyword: query.keyword.filter(|k| !k.trim().is_empty()),
            user_nickname: query.user_nickname.filter(|n| !n.trim().is_empty()),
            start_date,
            end_date,
            my_only: query.my_only.is_some_and(YesNo::is_yes),
            cursor: query.cursor,
            sort: sort_key(query.sort_by),
            limit: clamp_limit(query.limit, 20, 50),
        };

        let (posts, total_count) = CommunityRepository::list(pool, &filter)
            .await
            .map_err(ApiError::from_repo)?;
        let cursor = posts.last().map(|p| p.id);

        Ok(CommunityListResponse {
            communities: posts.into_iter().map(to_summary).collect(),
            total_count,
            cursor,
        })
    }

    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        ip: &str,
        req: CreateCommunityRequest,
    ) -> Result<CommunityDetail, ApiError> {
        validate_not_blank("title", &req.title).map_err(ApiError::Validation)?;
        validate_max_len("title", &req.title, MAX_TITLE_LEN).map_err(ApiError::Validation)?;
        validate_not_blank("contents", &req.contents).map_err(ApiError::Validation)?;

        let user = UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::Unauthorized("Account is not active".to_string()))?;

        let view_hash = hashing::community_hash(user.id, &user.nickname, ip, Utc::now());
        let id = CommunityRepository::create(
            pool,
            NewCommunity {
                category_code: req.category_code,
                user_id: user.id,
                user_nickname: &user.nickname,
                user_ip: ip,
                title: req.title.trim(),
                contents: req.contents.trim(),
                is_secret: req.is_secret.as_str(),
                view_hash: &view_hash,
            },
        )
        .await
        .map_err(ApiError::from_repo)?;
        info!(community_id = id, user_id, "Community post created");

        let post = Self::find(pool, &view_hash, user_id).await?;
        Ok(to_detail(post, user_id, Vec::new()))
    }

    /// Detail view; counts one view
    pub async fn detail(pool: &PgPool, viewer_id: i64, view_hash: &str) -> Result<CommunityDetail, ApiError> {
        let mut post = Self::find(pool, view_hash, viewer_id).await?;
        post.view_count = CommunityRepository::increment_view(pool, post.id)
            .await
            .map_err(ApiError::from_repo)?;
        let images = Self::image_paths(pool, post.id).await?;

        Ok(to_detail(post, viewer_id, images))
    }

    pub async fn update(
        pool: &PgPool,
        user_id: i64,
        view_hash: &str,
        req: UpdateCommunityRequest,
    ) -> Result<CommunityDetail, ApiError> {
        validate_not_blank("title", &req.title).map_err(ApiError::Validation)?;
        validate_max_len("title", &req.title, MAX_TITLE_LEN).map_err(ApiError::Validation)?;
        validate_not_blank("contents", &req.contents).map_err(ApiError::Validation)?;
        let post = Self::owned(pool, view_hash, user_id).await?;

        CommunityRepository::update(
            pool,
            post.id,
            req.title.trim(),
            req.contents.trim(),
            req.is_secret.as_str(),
        )
        .await
        .map_err(ApiError::from_repo)?;

        let post = Self::find(pool, view_hash, user_id).await?;
        let images = Self::image_paths(pool, post.id).await?;
        Ok(to_detail(post, user_id, images))
    }

    /// Deactivate the post and remove its image files
    pub async fn delete(
        pool: &PgPool,
        store: &ImageStore,
        user_id: i64,
        view_hash: &str,
    ) -> Result<(), ApiError> {
        let post = Self::owned(pool, view_hash, user_id).await?;
        CommunityRepository::soft_delete(pool, post.id)
            .await
            .map_err(ApiError::from_repo)?;

        let paths = CommunityRepository::delete_images(pool, post.id)
            .await
            .map_err(ApiError::from_repo)?;
        discard_images(store, &paths).await;
        info!(community_id = post.id, user_id, "Community post deleted");
        Ok(())
    }

    pub async fn toggle_like(
        pool: &PgPool,
        user_id: i64,
        view_hash: &str,
    ) -> Result<CommunityLikeResponse, ApiError> {
        let post = Self::find(pool, view_hash, user_id).await?;
        let (liked, like_count) = CommunityRepository::toggle_like(pool, post.id, user_id)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(CommunityLikeResponse { like_count, liked })
    }

    /// Append images after the current last one
    pub async fn add_images(
        pool: &PgPool,
        store: &ImageStore,
        user_id: i64,
        view_hash: &str,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<String>, ApiError> {
        if files.is_empty() {
            return Err(ApiError::Validation("At least one file is required".to_string()));
        }
        let post = Self::owned(pool, view_hash, user_id).await?;
        check_uploads(store, &files)?;

        let mut sort_order = CommunityRepository::next_image_order(pool, post.id)
            .await
            .map_err(ApiError::from_repo)?;
        for image in store_images(store, ImageKind::Communities, post.id, files).await {
            CommunityRepository::insert_image(
                pool,
                post.id,
                &image.path,
                sort_order,
                dimension(image.width),
                dimension(image.height),
            )
            .await
            .map_err(ApiError::from_repo)?;
            sort_order += 1;
        }

        Self::image_paths(pool, post.id).await
    }

    pub async fn add_comment(
        pool: &PgPool,
        user_id: i64,
        view_hash: &str,
        req: CreateCommentRequest,
    ) -> Result<CommentNode, ApiError> {
        let post = Self::find(pool, view_hash, user_id).await?;
        CommentService::create(
            pool,
            CommentTarget::Community,
            post.id,
            user_id,
            &req.comment,
            req.parent_hash.as_deref(),
        )
        .await
    }

    pub async fn comments(
        pool: &PgPool,
        viewer_id: i64,
        view_hash: &str,
        limit: Option<i64>,
    ) -> Result<Vec<CommentNode>, ApiError> {
        let post = Self::find(pool, view_hash, viewer_id).await?;
        CommentService::tree(
            pool,
            CommentTarget::Community,
            post.id,
            Some(viewer_id),
            clamp_limit(limit, 100, 500),
            0,
        )
        .await
    }

    pub async fn update_comment(
        pool: &PgPool,
        user_id: i64,
        comment_hash: &str,
        comment: &str,
    ) -> Result<(), ApiError> {
        CommentService::update(pool, CommentTarget::Community, user_id, comment_hash, comment).await
    }

    pub async fn delete_comment(pool: &PgPool, user_id: i64, comment_hash: &str) -> Result<(), ApiError> {
        CommentService::delete(pool, CommentTarget::Community, user_id, comment_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_window_without_month_passes_through() {
        let (start, end) = date_window(None, Some(date(2026, 1, 5)), None).unwrap();
        assert_eq!(start, Some(date(2026, 1, 5)));
        assert_eq!(end, None);
    }

    #[test]
    fn test_date_window_month_bounds() {
        let (start, end) = date_window(Some("2026-02"), None, None).unwrap();
        assert_eq!(start, Some(date(2026, 2, 1)));
        assert_eq!(end, Some(date(2026, 2, 28)));
    }

    #[test]
    fn test_date_window_intersects_range() {
        let (start, end) =
            date_window(Some("2026-02"), Some(date(2026, 2, 10)), Some(date(2026, 3, 15))).unwrap();
        assert_eq!(start, Some(date(2026, 2, 10)));
        assert_eq!(end, Some(date(2026, 2, 28)));
    }

    #[test]
    fn test_date_window_rejects_bad_month() {
        assert!(matches!(
            date_window(Some("2026-13"), None, None),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_summary_flags() {
        let now = Utc::now();
        let summary = to_summary(CommunityRecord {
            id: 3,
            category_code: 1,
            user_id: 9,
            user_nickname: "kim".to_string(),
            user_ip: String::new(),
            view_count: 4,
            like_count: 2,
            title: "t".to_string(),
            contents: "c".to_string(),
            is_secret: "N".to_string(),
            is_active: "Y".to_string(),
            is_notice: "Y".to_string(),
            pinned_at: None,
            view_hash: "vh".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            comment_count: 5,
            is_liked: true,
            user_hash: Some("uh".to_string()),
            profile_image: None,
        });

        assert_eq!(summary.is_notice, YesNo::Y);
        assert_eq!(summary.is_secret, YesNo::N);
        assert_eq!(summary.is_liked, YesNo::Y);
        assert_eq!(summary.comment_count, 5);
    }
}
