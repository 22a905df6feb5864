//! BML Shared Library
//!
//! Request/response types, domain enums, the image-variant naming
//! convention and input validation shared by the backend and its clients.

pub mod errors;
pub mod media;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use media::{strip_variant_suffix, variant_path, ImageUrls, Variant, VARIANTS};
pub use models::{NoticeStatus, Role, SnsLoginType, YesNo};
pub use types::*;
