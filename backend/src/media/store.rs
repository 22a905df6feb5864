//! On-disk image storage
//!
//! Files live at `{root}/{kind}/{id % 100, zero padded}/{id}/{base}_{variant}.jpg`
//! and are served under the configured public prefix.

use super::pipeline::generate_variants;
use super::upload::{generate_base_name, validate_upload};
use super::MediaError;
use crate::config::MediaConfig;
use bml_shared::media::{
    all_variant_paths, strip_variant_suffix, variant_file_name, REPRESENTATIVE_VARIANT,
};
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Which entity an image belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Feeds,
    Communities,
    Meals,
    Calendars,
    Users,
}

impl ImageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ImageKind::Feeds => "feeds",
            ImageKind::Communities => "communities",
            ImageKind::Meals => "meals",
            ImageKind::Calendars => "calendars",
            ImageKind::Users => "users",
        }
    }
}

/// Directory of an entity relative to the storage root, with `/` separators
pub fn entity_dir(kind: ImageKind, id: i64) -> String {
    format!("{}/{:02}/{}", kind.as_str(), id.rem_euclid(100), id)
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Public path without the variant suffix, as persisted in the database
    pub path: String,
    /// Size of the original variant
    pub width: u32,
    pub height: u32,
}

/// Outcome of removing the variants of one stored path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: usize,
    pub missing: usize,
}

/// Image store rooted at `media.attaches_dir`
#[derive(Clone)]
pub struct ImageStore {
    root: Arc<PathBuf>,
    public_prefix: Arc<str>,
    quality: u8,
    max_upload_bytes: usize,
}

impl ImageStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: Arc::new(config.root()),
            public_prefix: Arc::from(config.public_prefix.trim_end_matches('/')),
            quality: config.jpeg_quality,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Validate, convert and write one upload for an entity
    pub async fn save(
        &self,
        kind: ImageKind,
        id: i64,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredImage, MediaError> {
        validate_upload(filename, bytes.len(), self.max_upload_bytes)?;

        let rel_dir = entity_dir(kind, id);
        let dest = self.root.join(&rel_dir);
        let base = generate_base_name(Utc::now());

        let variants = generate_variants(bytes, base.clone(), dest, self.quality).await?;
        let (width, height) = variants
            .first()
            .map(|v| (v.width, v.height))
            .unwrap_or_default();

        let public_dir = format!("{}/{}", self.public_prefix, rel_dir);
        let representative = format!(
            "{}/{}",
            public_dir,
            variant_file_name(&base, REPRESENTATIVE_VARIANT)
        );
        let path = strip_variant_suffix(&representative)
            .unwrap_or_else(|| format!("{}/{}", public_dir, base));

        debug!(kind = kind.as_str(), id, path = %path, "Stored image variants");
        Ok(StoredImage {
            path,
            width,
            height,
        })
    }

    /// Map a public path to a file under the root
    ///
    /// Returns `None` for external URLs and paths that would escape the root.
    pub fn local_path(&self, public: &str) -> Option<PathBuf> {
        let rel = public
            .strip_prefix(&*self.public_prefix)?
            .strip_prefix('/')?;
        let rel = Path::new(rel);
        if rel.as_os_str().is_empty()
            || rel.components().any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(rel))
    }

    /// Remove every variant file of a stored path
    ///
    /// Files that are already gone are counted in `missing`. Paths outside
    /// the store (external avatar URLs) are ignored.
    pub async fn delete(&self, stored: &str) -> Result<DeleteOutcome, MediaError> {
        let mut outcome = DeleteOutcome::default();
        for public in all_variant_paths(stored) {
            let Some(path) = self.local_path(&public) else {
                continue;
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => outcome.removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => outcome.missing += 1,
                Err(e) => return Err(MediaError::Io(e)),
            }
        }
        debug!(stored, removed = outcome.removed, missing = outcome.missing, "Deleted image variants");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn store_in(dir: &Path) -> ImageStore {
        ImageStore::new(&MediaConfig {
            attaches_dir: dir.to_string_lossy().into_owned(),
            ..MediaConfig::default()
        })
    }

    fn jpeg_upload(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 160, 30])))
            .write_to(&mut buf, ImageFormat::Jpeg)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_entity_dir_layout() {
        assert_eq!(entity_dir(ImageKind::Feeds, 7), "feeds/07/7");
        assert_eq!(entity_dir(ImageKind::Meals, 105), "meals/05/105");
        assert_eq!(entity_dir(ImageKind::Users, 1200), "users/00/1200");
    }

    #[test]
    fn test_local_path_rejects_outside_paths() {
        let store = store_in(Path::new("/srv/attaches"));
        assert_eq!(
            store.local_path("/attaches/feeds/07/7/a_medium.jpg"),
            Some(PathBuf::from("/srv/attaches/feeds/07/7/a_medium.jpg"))
        );
        assert_eq!(store.local_path("https://k.kakaocdn.net/p.jpg"), None);
        assert_eq!(store.local_path("/attaches/../etc/passwd"), None);
        assert_eq!(store.local_path("/attaches"), None);
    }

    #[tokio::test]
    async fn test_save_writes_variants_and_returns_stored_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let stored = store
            .save(ImageKind::Feeds, 7, "lunch.JPG", jpeg_upload(1000, 500))
            .await
            .unwrap();

        assert!(stored.path.starts_with("/attaches/feeds/07/7/"));
        assert!(strip_variant_suffix(&stored.path).is_none());
        assert_eq!((stored.width, stored.height), (1000, 500));

        for public in all_variant_paths(&stored.path) {
            let local = store.local_path(&public).unwrap();
            assert!(local.exists(), "{:?} missing", local);
        }
    }

    #[tokio::test]
    async fn test_save_rejects_bad_uploads_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let err = store
            .save(ImageKind::Users, 1, "avatar.svg", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedExtension(_)));

        let err = store
            .save(ImageKind::Users, 1, "avatar.png", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Empty));

        let oversized = vec![0u8; store.max_upload_bytes() + 1];
        let err = store
            .save(ImageKind::Users, 1, "avatar.png", oversized)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::TooLarge { .. }));

        assert!(!dir.path().join("users").exists());
    }

    #[tokio::test]
    async fn test_delete_counts_removed_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let stored = store
            .save(ImageKind::Communities, 42, "post.jpg", jpeg_upload(200, 200))
            .await
            .unwrap();

        let first = store.delete(&stored.path).await.unwrap();
        assert_eq!(first, DeleteOutcome { removed: 5, missing: 0 });

        let second = store.delete(&stored.path).await.unwrap();
        assert_eq!(second, DeleteOutcome { removed: 0, missing: 5 });
    }

    #[tokio::test]
    async fn test_delete_ignores_external_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let outcome = store
            .delete("https://lh3.googleusercontent.com/a/photo")
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::default());
    }
}
