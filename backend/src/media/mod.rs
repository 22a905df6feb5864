//! Uploaded image handling
//!
//! Every image attached to a feed, community post, meal entry, calendar
//! month or avatar goes through the same path:
//!
//! 1. [`upload::validate_upload`] checks extension and size.
//! 2. [`pipeline::generate_variants`] decodes, flattens and resizes the
//!    image into the five variants of [`bml_shared::media::VARIANTS`].
//! 3. [`ImageStore`] writes them under the entity directory and returns
//!    the suffix-less path that the database keeps.

pub mod pipeline;
pub mod store;
pub mod upload;

pub use pipeline::{generate_variants, target_dimensions, GeneratedVariant};
pub use store::{DeleteOutcome, ImageKind, ImageStore, StoredImage};
pub use upload::{generate_base_name, validate_upload, UploadedFile, ALLOWED_EXTENSIONS};

use thiserror::Error;

/// Errors raised while accepting or storing an image
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("File is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("File is empty")]
    Empty,

    #[error("Could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Could not encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
