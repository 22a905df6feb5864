//! Error types for the BML shared crate

use thiserror::Error;

/// Failure to parse one of the shared string enums
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown image variant: {0}")]
    UnknownVariant(String),

    #[error("Unknown login type: {0}")]
    UnknownLoginType(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Expected Y or N, got: {0}")]
    InvalidFlag(String),

    #[error("Unknown notice status: {0}")]
    UnknownNoticeStatus(String),
}
