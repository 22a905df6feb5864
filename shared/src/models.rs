//! Domain enums shared by the backend and its clients
//!
//! All of these are stored as plain text columns; `as_str` gives the
//! database spelling and `FromStr` parses it back.

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an account signs in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SnsLoginType {
    Email,
    Kakao,
    Naver,
    Google,
}

impl SnsLoginType {
    pub const fn as_str(self) -> &'static str {
        match self {
            SnsLoginType::Email => "EMAIL",
            SnsLoginType::Kakao => "KAKAO",
            SnsLoginType::Naver => "NAVER",
            SnsLoginType::Google => "GOOGLE",
        }
    }

    pub const fn is_social(self) -> bool {
        !matches!(self, SnsLoginType::Email)
    }
}

impl fmt::Display for SnsLoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnsLoginType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EMAIL" => Ok(SnsLoginType::Email),
            "KAKAO" => Ok(SnsLoginType::Kakao),
            "NAVER" => Ok(SnsLoginType::Naver),
            "GOOGLE" => Ok(SnsLoginType::Google),
            _ => Err(ParseError::UnknownLoginType(s.to_string())),
        }
    }
}

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(ParseError::UnknownRole(s.to_string())),
        }
    }
}

/// A `Y`/`N` flag column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum YesNo {
    Y,
    N,
}

impl YesNo {
    pub const fn as_str(self) -> &'static str {
        match self {
            YesNo::Y => "Y",
            YesNo::N => "N",
        }
    }

    pub const fn from_bool(value: bool) -> Self {
        if value {
            YesNo::Y
        } else {
            YesNo::N
        }
    }

    pub const fn is_yes(self) -> bool {
        matches!(self, YesNo::Y)
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YesNo {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Y" | "y" => Ok(YesNo::Y),
            "N" | "n" => Ok(YesNo::N),
            other => Err(ParseError::InvalidFlag(other.to_string())),
        }
    }
}

/// Publication state of a notice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoticeStatus {
    #[default]
    Active,
    Unactive,
    Deleted,
}

impl NoticeStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            NoticeStatus::Active => "active",
            NoticeStatus::Unactive => "unactive",
            NoticeStatus::Deleted => "deleted",
        }
    }
}

impl FromStr for NoticeStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(NoticeStatus::Active),
            "unactive" => Ok(NoticeStatus::Unactive),
            "deleted" => Ok(NoticeStatus::Deleted),
            _ => Err(ParseError::UnknownNoticeStatus(s.to_string())),
        }
    }
}
