//! Input validation functions
//!
//! Checks and normalizers for user input. Everything here is pure so that
//! clients can run the same checks before submitting a form.

use chrono::NaiveDate;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_TAG_LEN: usize = 100;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    let matches = regex_lite::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false);
    if !matches {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err("Password too long".to_string());
    }
    Ok(())
}

/// Validate a nickname: 1 to 30 characters after trimming
pub fn validate_nickname(nickname: &str) -> Result<(), String> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        return Err("Nickname cannot be empty".to_string());
    }
    if trimmed.chars().count() > 30 {
        return Err("Nickname must be at most 30 characters".to_string());
    }
    Ok(())
}

/// Reject empty or whitespace-only text
pub fn validate_not_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Reject text longer than `max` characters after trimming
pub fn validate_max_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().chars().count() > max {
        return Err(format!("{} must be at most {} characters", field, max));
    }
    Ok(())
}

/// Reject a parsed tag list holding a tag longer than [`MAX_TAG_LEN`]
pub fn validate_tags(tags: &[String]) -> Result<(), String> {
    match tags.iter().find(|tag| tag.chars().count() > MAX_TAG_LEN) {
        Some(_) => Err(format!("Tags must be at most {} characters", MAX_TAG_LEN)),
        None => Ok(()),
    }
}

/// Validate a `YYYY-MM` month string
pub fn validate_month(month: &str) -> Result<(), String> {
    parse_month(month).map(|_| ())
}

/// Parse `YYYY-MM` into the first and the last day of that month
pub fn parse_month(month: &str) -> Result<(NaiveDate, NaiveDate), String> {
    let invalid = || format!("Invalid month '{}', expected YYYY-MM", month);
    if month.len() != 7 || month.as_bytes()[4] != b'-' {
        return Err(invalid());
    }
    let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map_err(|_| invalid())?;
    let next = first
        .checked_add_months(chrono::Months::new(1))
        .ok_or_else(invalid)?;
    let last = next.pred_opt().ok_or_else(invalid)?;
    Ok((first, last))
}

/// `YYYY-MM` of a date
pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Remove dashes and spaces from a phone number
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect()
}

/// Split a `#`-delimited tag string
///
/// Pieces are trimmed, empties dropped, and duplicates removed keeping the
/// first occurrence.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for piece in raw.split('#') {
        let tag = piece.trim();
        if tag.is_empty() || tags.iter().any(|t| t == tag) {
            continue;
        }
        tags.push(tag.to_string());
    }
    tags
}

/// Parse a form flag: `Y`/`N`, `true`/`false` or `1`/`0`
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Clamp a page size into `1..=max`, falling back to `default`
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}
