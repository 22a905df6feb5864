//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the image store and external systems.

pub mod categories;
pub mod comments;
pub mod communities;
pub mod dashboard;
pub mod feeds;
pub mod meals;
pub mod notices;
pub mod users;

pub use categories::{next_food_code, CategoryService};
pub use comments::{build_comment_tree, CommentService};
pub use communities::CommunityService;
pub use dashboard::{time_ago, DashboardService};
pub use feeds::{FeedForm, FeedService};
pub use meals::{MealForm, MealService};
pub use notices::NoticeService;
pub use users::{ProfileUpdate, UserService};

use crate::error::ApiError;
use crate::media::{ImageKind, ImageStore, StoredImage, UploadedFile};
use bml_shared::models::YesNo;
use bml_shared::types::AuthorSummary;
use tracing::warn;

/// Parse a `Y`/`N` column, treating anything else as `N`
pub(crate) fn flag(value: &str) -> YesNo {
    value.parse().unwrap_or(YesNo::N)
}

pub(crate) fn author(
    user_hash: Option<String>,
    nickname: Option<String>,
    profile_image: Option<String>,
) -> AuthorSummary {
    AuthorSummary {
        user_hash,
        nickname,
        profile_image,
    }
}

/// Reject the request before any write if one upload is unacceptable
pub(crate) fn check_uploads(store: &ImageStore, files: &[UploadedFile]) -> Result<(), ApiError> {
    for file in files {
        file.validate(store.max_upload_bytes())?;
    }
    Ok(())
}

/// Store uploads in order; an image that fails to convert is logged and skipped
pub(crate) async fn store_images(
    store: &ImageStore,
    kind: ImageKind,
    id: i64,
    files: Vec<UploadedFile>,
) -> Vec<StoredImage> {
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        match store.save(kind, id, &file.filename, file.bytes).await {
            Ok(image) => stored.push(image),
            Err(e) => warn!(
                kind = kind.as_str(),
                id,
                filename = %file.filename,
                error = %e,
                "Skipping image that could not be stored"
            ),
        }
    }
    stored
}

/// Remove the variant files of stored paths, logging failures
pub(crate) async fn discard_images(store: &ImageStore, paths: &[String]) {
    for path in paths {
        if let Err(e) = store.delete(path).await {
            warn!(path = %path, error = %e, "Failed to delete image variants");
        }
    }
}

/// Pixel size as stored in `INTEGER` columns
pub(crate) fn dimension(px: u32) -> i32 {
    i32::try_from(px).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults_to_no() {
        assert_eq!(flag("Y"), YesNo::Y);
        assert_eq!(flag("N"), YesNo::N);
        assert_eq!(flag(""), YesNo::N);
        assert_eq!(flag("maybe"), YesNo::N);
    }

    #[test]
    fn test_dimension_saturates() {
        assert_eq!(dimension(800), 800);
        assert_eq!(dimension(u32::MAX), i32::MAX);
    }

    #[test]
    fn test_check_uploads_reports_first_bad_file() {
        let store = ImageStore::new(&crate::config::MediaConfig::default());
        let files = vec![
            UploadedFile {
                filename: "a.jpg".to_string(),
                bytes: vec![1],
            },
            UploadedFile {
                filename: "b.pdf".to_string(),
                bytes: vec![1],
            },
        ];
        let err = check_uploads(&store, &files).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Media(crate::media::MediaError::UnsupportedExtension(_))
        ));
        assert!(check_uploads(&store, &files[..1]).is_ok());
    }
}
