//! Upload checks and file naming

use super::MediaError;
use chrono::{DateTime, Utc};
use std::path::Path;
use uuid::Uuid;

/// Accepted file extensions, compared case-insensitively
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// One file part of a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn validate(&self, limit: usize) -> Result<(), MediaError> {
        validate_upload(&self.filename, self.bytes.len(), limit)
    }
}

/// Lowercased extension of a client file name
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Reject unsupported, empty or oversized uploads
pub fn validate_upload(filename: &str, size: usize, limit: usize) -> Result<(), MediaError> {
    let ext = extension_of(filename).unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(MediaError::UnsupportedExtension(filename.to_string()));
    }
    if size == 0 {
        return Err(MediaError::Empty);
    }
    if size > limit {
        return Err(MediaError::TooLarge { size, limit });
    }
    Ok(())
}

/// `{YYYYmmddHHMMSS}_{8 hex chars}`
pub fn generate_base_name(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", now.format("%Y%m%d%H%M%S"), &suffix[..8])
}
