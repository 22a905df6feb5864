//! Request helpers shared by the handlers
//!
//! `MultipartForm` drains an axum `Multipart` body into text fields and
//! uploaded files so handlers can pick what they need by name.

use crate::error::ApiError;
use crate::media::UploadedFile;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::{HeaderMap, StatusCode};
use bml_shared::validation::parse_flag;
use std::collections::HashMap;
use std::str::FromStr;

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// A fully read multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: Vec<(String, UploadedFile)>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    // Browsers send an empty part for an untouched file input
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.push((
                        name,
                        UploadedFile {
                            filename,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
                None => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Text field, `None` when absent
    pub fn text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Text field trimmed, `None` when absent or blank
    pub fn non_blank(&mut self, name: &str) -> Option<String> {
        self.text(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn require(&mut self, name: &str) -> Result<String, ApiError> {
        self.text(name)
            .ok_or_else(|| ApiError::Validation(format!("{} is required", name)))
    }

    /// Parse a blank-or-absent-tolerant field
    pub fn parse<T: FromStr>(&mut self, name: &str) -> Result<Option<T>, ApiError> {
        match self.non_blank(name) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ApiError::Validation(format!("Invalid value for {}", name))),
            None => Ok(None),
        }
    }

    pub fn parse_required<T: FromStr>(&mut self, name: &str) -> Result<T, ApiError> {
        self.parse(name)?
            .ok_or_else(|| ApiError::Validation(format!("{} is required", name)))
    }

    /// Boolean field given as `Y`/`N`, `true`/`false` or `1`/`0`
    pub fn flag(&mut self, name: &str) -> Result<Option<bool>, ApiError> {
        match self.non_blank(name) {
            Some(raw) => parse_flag(&raw)
                .map(Some)
                .ok_or_else(|| ApiError::Validation(format!("Invalid value for {}", name))),
            None => Ok(None),
        }
    }

    /// Every file sent under `name`, in upload order
    pub fn files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (wanted, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        wanted.into_iter().map(|(_, file)| file).collect()
    }

    pub fn file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files(name).into_iter().next()
    }
}

/// Client address: first `x-forwarded-for` hop, then `x-real-ip`, else empty
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .unwrap_or_default()
        .to_string()
}
