//! Notice service

use super::flag;
use crate::error::ApiError;
use crate::hashing;
use crate::repositories::{NoticeFields, NoticeRecord, NoticeRepository};
use bml_shared::models::{NoticeStatus, YesNo};
use bml_shared::types::{NoticeDetail, NoticeSummary, SaveNoticeRequest};
use bml_shared::validation::{validate_max_len, validate_not_blank, MAX_TITLE_LEN};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

fn status(record: &NoticeRecord) -> NoticeStatus {
    record.status.parse().unwrap_or_default()
}

fn to_summary(record: NoticeRecord) -> NoticeSummary {
    NoticeSummary {
        is_important: flag(&record.is_important),
        status: status(&record),
        view_hash: record.view_hash,
        category_id: record.category_id,
        title: record.title,
        created_at: record.created_at,
    }
}

fn to_detail(record: NoticeRecord) -> NoticeDetail {
    NoticeDetail {
        is_important: flag(&record.is_important),
        status: status(&record),
        view_hash: record.view_hash,
        category_id: record.category_id,
        category_text: record.category_text,
        title: record.title,
        content: record.content,
        admin_name: record.admin_name.unwrap_or_default(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

pub struct NoticeService;

impl NoticeService {
    pub async fn list(pool: &PgPool) -> Result<Vec<NoticeSummary>, ApiError> {
        let notices = NoticeRepository::list_active(pool)
            .await
            .map_err(ApiError::from_repo)?;
        Ok(notices.into_iter().map(to_summary).collect())
    }

    async fn find(pool: &PgPool, view_hash: &str) -> Result<NoticeRecord, ApiError> {
        if view_hash.trim().is_empty() {
            return Err(ApiError::NotFound("Notice not found".to_string()));
        }
        NoticeRepository::find_by_hash(pool, view_hash)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Notice not found".to_string()))
    }

    pub async fn detail(pool: &PgPool, view_hash: &str) -> Result<NoticeDetail, ApiError> {
        Self::find(pool, view_hash).await.map(to_detail)
    }

    pub async fn create(
        pool: &PgPool,
        admin_id: i64,
        ip: &str,
        req: SaveNoticeRequest,
    ) -> Result<NoticeDetail, ApiError> {
        validate_not_blank("title", &req.title).map_err(ApiError::Validation)?;
        validate_max_len("title", &req.title, MAX_TITLE_LEN).map_err(ApiError::Validation)?;

        let title = req.title.trim();
        let view_hash = hashing::notice_hash(admin_id, title, Utc::now());
        NoticeRepository::create(
            pool,
            admin_id,
            ip,
            &view_hash,
            NoticeFields {
                category_id: req.category_id,
                title,
                content: &req.content,
                is_important: YesNo::from_bool(req.is_important).as_str(),
                status: req.status.unwrap_or_default().as_str(),
            },
        )
        .await
        .map_err(ApiError::from_repo)?;
        info!(admin_id, "Notice created");

        Self::detail(pool, &view_hash).await
    }

    pub async fn update(
        pool: &PgPool,
        view_hash: &str,
        req: SaveNoticeRequest,
    ) -> Result<NoticeDetail, ApiError> {
        validate_not_blank("title", &req.title).map_err(ApiError::Validation)?;
        validate_max_len("title", &req.title, MAX_TITLE_LEN).map_err(ApiError::Validation)?;
        let notice = Self::find(pool, view_hash).await?;
        let keep_status = status(&notice);

        NoticeRepository::update(
            pool,
            notice.id,
            NoticeFields {
                category_id: req.category_id,
                title: req.title.trim(),
                content: &req.content,
                is_important: YesNo::from_bool(req.is_important).as_str(),
                status: req.status.unwrap_or(keep_status).as_str(),
            },
        )
        .await
        .map_err(ApiError::from_repo)?;

        Self::detail(pool, view_hash).await
    }

    pub async fn delete(pool: &PgPool, view_hash: &str) -> Result<(), ApiError> {
        let notice = Self::find(pool, view_hash).await?;
        NoticeRepository::mark_deleted(pool, notice.id)
            .await
            .map_err(ApiError::from_repo)
    }
}
