//! Feed service: posts, tags, images, likes and comments

use super::{author, check_uploads, dimension, discard_images, flag, store_images, CommentService};
use crate::error::ApiError;
use crate::media::{ImageKind, ImageStore, UploadedFile};
use crate::repositories::{
    CommentTarget, FeedFilter, FeedRecord, FeedRepository, TagRepository,
};
use bml_shared::models::YesNo;
use bml_shared::types::{
    CommentListQuery, CommentNode, CreateCommentRequest, FeedLikeToggleResponse, FeedListQuery,
    FeedResponse, FeedSort, LikedFeed, LikedFeedsQuery,
};
use bml_shared::validation::{
    clamp_limit, parse_tags, validate_max_len, validate_not_blank, validate_tags, MAX_TITLE_LEN,
};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, info};

const TAG_SEARCH_LIMIT: i64 = 20;

/// Text fields of a feed form
#[derive(Debug, Clone, Default)]
pub struct FeedForm {
    pub title: String,
    pub content: String,
    pub is_public: Option<YesNo>,
    /// Raw `#`-separated tags; `None` leaves the tags of an edited feed alone
    pub tags: Option<String>,
}

impl FeedForm {
    fn validate(&self) -> Result<(), ApiError> {
        validate_not_blank("title", &self.title).map_err(ApiError::Validation)?;
        validate_not_blank("content", &self.content).map_err(ApiError::Validation)?;
        validate_max_len("title", &self.title, MAX_TITLE_LEN).map_err(ApiError::Validation)?;
        Ok(())
    }

    fn parsed_tags(&self) -> Result<Option<Vec<String>>, ApiError> {
        let tags = self.tags.as_deref().map(parse_tags);
        if let Some(tags) = &tags {
            validate_tags(tags).map_err(ApiError::Validation)?;
        }
        Ok(tags)
    }

    fn visibility(&self) -> &'static str {
        self.is_public.unwrap_or(YesNo::Y).as_str()
    }
}

fn sort_key(sort: FeedSort) -> &'static str {
    match sort {
        FeedSort::CreatedAt => "created_at",
        FeedSort::Likes => "likes",
        FeedSort::Views => "views",
    }
}

fn is_visible(feed: &FeedRecord, viewer_id: Option<i64>) -> bool {
    flag(&feed.is_public).is_yes() || viewer_id == Some(feed.user_id)
}

pub struct FeedService;

impl FeedService {
    /// Attach tags and image paths to a batch of feeds
    async fn assemble(pool: &PgPool, feeds: Vec<FeedRecord>) -> Result<Vec<FeedResponse>, ApiError> {
        let ids: Vec<i64> = feeds.iter().map(|f| f.id).collect();

        let mut images: HashMap<i64, Vec<String>> = HashMap::new();
        for image in FeedRepository::images_for(pool, &ids)
            .await
            .map_err(ApiError::from_repo)?
        {
            images.entry(image.feed_id).or_default().push(image.image_path);
        }

        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        for tag in TagRepository::for_feeds(pool, &ids)
            .await
            .map_err(ApiError::from_repo)?
        {
            tags.entry(tag.owner_id).or_default().push(tag.name);
        }

        Ok(feeds
            .into_iter()
            .map(|feed| FeedResponse {
                id: feed.id,
                is_public: flag(&feed.is_public),
                tags: tags.remove(&feed.id).unwrap_or_default(),
                images: images.remove(&feed.id).unwrap_or_default(),
                user: author(
                    Some(feed.user_hash),
                    Some(feed.nickname),
                    feed.profile_image,
                ),
                title: feed.title,
                content: feed.content,
                view_count: feed.view_count,
                like_count: feed.like_count,
                liked: None,
                created_at: feed.created_at,
                updated_at: feed.updated_at,
            })
            .collect())
    }

    /// Feed the viewer may see, or 404
    async fn visible(pool: &PgPool, id: i64, viewer_id: Option<i64>) -> Result<FeedRecord, ApiError> {
        FeedRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::from_repo)?
            .filter(|feed| is_visible(feed, viewer_id))
            .ok_or_else(|| ApiError::NotFound("Feed not found".to_string()))
    }

    /// Feed owned by `user_id`
    async fn owned(pool: &PgPool, id: i64, user_id: i64) -> Result<FeedRecord, ApiError> {
        let feed = FeedRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Feed not found".to_string()))?;
        if feed.user_id != user_id {
            return Err(ApiError::Forbidden("Not the author of this feed".to_string()));
        }
        Ok(feed)
    }

    async fn load(pool: &PgPool, id: i64, viewer_id: i64) -> Result<FeedResponse, ApiError> {
        let feed = Self::visible(pool, id, Some(viewer_id)).await?;
        let liked = FeedRepository::is_liked(pool, id, viewer_id)
            .await
            .map_err(ApiError::from_repo)?;

        let mut response = Self::assemble(pool, vec![feed])
            .await?
            .pop()
            .ok_or_else(|| ApiError::NotFound("Feed not found".to_string()))?;
        response.liked = Some(liked);
        Ok(response)
    }

    pub async fn list(
        pool: &PgPool,
        viewer_id: Option<i64>,
        query: FeedListQuery,
    ) -> Result<Vec<FeedResponse>, ApiError> {
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if start > end {
                return Err(ApiError::Validation(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }

        let filter = FeedFilter {
            viewer_id,
            cursor: query.cursor,
            title: query.title.filter(|t| !t.trim().is_empty()),
            nickname: query.nickname.filter(|n| !n.trim().is_empty()),
            target_user_hash: query.target_user_hash.filter(|h| !h.trim().is_empty()),
            start_date: query.start_date,
            end_date: query.end_date,
            sort: sort_key(query.sort_by),
            limit: clamp_limit(query.limit, 10, 100),
            offset: query.offset.unwrap_or(0).max(0),
        };

        let feeds = FeedRepository::list(pool, &filter)
            .await
            .map_err(ApiError::from_repo)?;
        debug!(count = feeds.len(), "Listed feeds");
        Self::assemble(pool, feeds).await
    }

    /// Detail view; counts one view
    pub async fn detail(
        pool: &PgPool,
        viewer_id: Option<i64>,
        id: i64,
    ) -> Result<FeedResponse, ApiError> {
        let feed = Self::visible(pool, id, viewer_id).await?;
        let view_count = FeedRepository::increment_view(pool, feed.id)
            .await
            .map_err(ApiError::from_repo)?;
        let liked = match viewer_id {
            Some(user_id) => Some(
                FeedRepository::is_liked(pool, feed.id, user_id)
                    .await
                    .map_err(ApiError::from_repo)?,
            ),
            None => None,
        };

        let mut response = Self::assemble(pool, vec![feed])
            .await?
            .pop()
            .ok_or_else(|| ApiError::NotFound("Feed not found".to_string()))?;
        response.view_count = view_count;
        response.liked = liked;
        Ok(response)
    }

    /// Create a feed; images are stored after the feed row is committed
    pub async fn create(
        pool: &PgPool,
        store: &ImageStore,
        user_id: i64,
        form: FeedForm,
        files: Vec<UploadedFile>,
    ) -> Result<FeedResponse, ApiError> {
        form.validate()?;
        let tags = form.parsed_tags()?.unwrap_or_default();
        check_uploads(store, &files)?;

        let mut tx = pool.begin().await?;
        let feed_id = FeedRepository::create(
            &mut *tx,
            user_id,
            form.title.trim(),
            form.content.trim(),
            form.visibility(),
        )
        .await
        .map_err(ApiError::from_repo)?;
        TagRepository::set_feed_tags(&mut *tx, feed_id, &tags)
            .await
            .map_err(ApiError::from_repo)?;
        tx.commit().await?;

        Self::attach_images(pool, store, feed_id, files).await?;
        info!(feed_id, user_id, "Feed created");

        Self::load(pool, feed_id, user_id).await
    }

    async fn attach_images(
        pool: &PgPool,
        store: &ImageStore,
        feed_id: i64,
        files: Vec<UploadedFile>,
    ) -> Result<(), ApiError> {
        let stored = store_images(store, ImageKind::Feeds, feed_id, files).await;
        for (idx, image) in stored.iter().enumerate() {
            FeedRepository::insert_image(
                pool,
                feed_id,
                &image.path,
                i32::try_from(idx).unwrap_or(i32::MAX),
                dimension(image.width),
                dimension(image.height),
            )
            .await
            .map_err(ApiError::from_repo)?;
        }
        Ok(())
    }

    /// Edit a feed; sending files replaces every image
    pub async fn update(
        pool: &PgPool,
        store: &ImageStore,
        user_id: i64,
        id: i64,
        form: FeedForm,
        files: Vec<UploadedFile>,
    ) -> Result<FeedResponse, ApiError> {
        let feed = Self::owned(pool, id, user_id).await?;
        form.validate()?;
        let tags = form.parsed_tags()?;
        check_uploads(store, &files)?;

        let mut tx = pool.begin().await?;
        FeedRepository::update(
            &mut *tx,
            feed.id,
            form.title.trim(),
            form.content.trim(),
            form.visibility(),
        )
        .await
        .map_err(ApiError::from_repo)?;
        if let Some(tags) = &tags {
            TagRepository::set_feed_tags(&mut *tx, feed.id, tags)
                .await
                .map_err(ApiError::from_repo)?;
        }
        tx.commit().await?;

        if !files.is_empty() {
            let old = FeedRepository::delete_images(pool, feed.id)
                .await
                .map_err(ApiError::from_repo)?;
            discard_images(store, &old).await;
            Self::attach_images(pool, store, feed.id, files).await?;
        }

        Self::load(pool, feed.id, user_id).await
    }

    /// Soft delete; deleting a deleted feed succeeds
    pub async fn delete(pool: &PgPool, user_id: i64, id: i64) -> Result<(), ApiError> {
        let feed = FeedRepository::find_ownership(pool, id)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Feed not found".to_string()))?;
        if feed.user_id != user_id {
            return Err(ApiError::Forbidden("Not the author of this feed".to_string()));
        }
        if feed.deleted_at.is_some() {
            return Ok(());
        }

        FeedRepository::soft_delete(pool, feed.id)
            .await
            .map_err(ApiError::from_repo)?;
        info!(feed_id = feed.id, user_id, "Feed deleted");
        Ok(())
    }

    pub async fn toggle_like(
        pool: &PgPool,
        user_id: i64,
        id: i64,
    ) -> Result<FeedLikeToggleResponse, ApiError> {
        let feed = Self::visible(pool, id, Some(user_id)).await?;
        let (liked, like_count) = FeedRepository::toggle_like(pool, feed.id, user_id)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(FeedLikeToggleResponse {
            feed_id: feed.id,
            like_count,
            liked,
        })
    }

    pub async fn liked(
        pool: &PgPool,
        user_id: i64,
        query: LikedFeedsQuery,
    ) -> Result<Vec<LikedFeed>, ApiError> {
        let rows = FeedRepository::liked_by(
            pool,
            user_id,
            query.limit.clamp(1, 100),
            query.offset.max(0),
        )
        .await
        .map_err(ApiError::from_repo)?;

        Ok(rows
            .into_iter()
            .map(|row| LikedFeed {
                feed_id: row.feed_id,
                title: row.title,
                content: row.content,
                image: row.image,
                liked_at: row.liked_at,
            })
            .collect())
    }

    pub async fn search_tags(pool: &PgPool, query: &str) -> Result<Vec<String>, ApiError> {
        let query = query.trim().trim_start_matches('#');
        if query.is_empty() {
            return Ok(Vec::new());
        }
        TagRepository::search(pool, query, TAG_SEARCH_LIMIT)
            .await
            .map_err(ApiError::from_repo)
    }

    pub async fn add_comment(
        pool: &PgPool,
        user_id: i64,
        feed_id: i64,
        req: CreateCommentRequest,
    ) -> Result<CommentNode, ApiError> {
        let feed = Self::visible(pool, feed_id, Some(user_id)).await?;
        CommentService::create(
            pool,
            CommentTarget::Feed,
            feed.id,
            user_id,
            &req.comment,
            req.parent_hash.as_deref(),
        )
        .await
    }

    pub async fn comments(
        pool: &PgPool,
        viewer_id: Option<i64>,
        feed_id: i64,
        query: CommentListQuery,
    ) -> Result<Vec<CommentNode>, ApiError> {
        let feed = Self::visible(pool, feed_id, viewer_id).await?;
        CommentService::tree(
            pool,
            CommentTarget::Feed,
            feed.id,
            viewer_id,
            clamp_limit(query.limit, 10, 100),
            query.offset.unwrap_or(0).max(0),
        )
        .await
    }

    pub async fn delete_comment(pool: &PgPool, user_id: i64, comment_hash: &str) -> Result<(), ApiError> {
        CommentService::delete(pool, CommentTarget::Feed, user_id, comment_hash).await
    }
}
