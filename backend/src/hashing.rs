//! Public identifiers
//!
//! Rows exposed to clients are addressed by a `view_hash`: the lowercase hex
//! SHA-256 of a few identifying fields joined with `-`.

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use std::fmt::Display;

/// SHA-256 of the parts' `Display` forms joined with `-`
pub fn view_hash(parts: &[&dyn Display]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("-");
    hex::encode(Sha256::digest(joined.as_bytes()))
}

/// Timestamp component with microseconds, `%Y%m%d%H%M%S%f`
pub fn hash_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S%6f").to_string()
}

pub fn user_hash(sns_login_type: &str, sns_id: &str, name: &str, email: &str, phone: &str) -> String {
    view_hash(&[&sns_login_type, &sns_id, &name, &email, &phone])
}

/// Feed and community comments share one shape
pub fn comment_hash(
    parent_entity_id: i64,
    user_id: i64,
    parent_id: Option<i64>,
    now: DateTime<Utc>,
) -> String {
    let parent = parent_id.map(|id| id.to_string()).unwrap_or_default();
    view_hash(&[&parent_entity_id, &user_id, &parent, &hash_timestamp(now)])
}

pub fn community_hash(user_id: i64, nickname: &str, ip: &str, now: DateTime<Utc>) -> String {
    view_hash(&[&user_id, &nickname, &ip, &hash_timestamp(now)])
}

/// One per (user, date, category) slot
pub fn meal_hash(user_id: i64, input_date: NaiveDate, category_id: i64, secret: &str) -> String {
    view_hash(&[&user_id, &input_date, &category_id, &secret])
}

pub fn notice_hash(admin_id: i64, title: &str, now: DateTime<Utc>) -> String {
    view_hash(&[&admin_id, &title, &hash_timestamp(now)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_view_hash_joins_with_dash() {
        let expected = hex::encode(Sha256::digest(b"EMAIL--Kim-kim@example.com-01012345678"));
        assert_eq!(
            user_hash("EMAIL", "", "Kim", "kim@example.com", "01012345678"),
            expected
        );
    }

    #[test]
    fn test_view_hash_of_empty_string() {
        assert_eq!(
            view_hash(&[&""]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_timestamp_has_microseconds() {
        let now = Utc
            .with_ymd_and_hms(2026, 1, 23, 12, 0, 5)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(42))
            .unwrap();
        assert_eq!(hash_timestamp(now), "20260123120005000042");
    }

    #[test]
    fn test_comment_hash_treats_missing_parent_as_empty() {
        let now = Utc::now();
        let stamp = hash_timestamp(now);
        assert_eq!(
            comment_hash(3, 9, None, now),
            view_hash(&[&3, &9, &"", &stamp])
        );
        assert_ne!(comment_hash(3, 9, None, now), comment_hash(3, 9, Some(1), now));
    }

    #[test]
    fn test_meal_hash_is_stable_per_slot() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let a = meal_hash(1, date, 3, "secret");
        assert_eq!(a, meal_hash(1, date, 3, "secret"));
        assert_ne!(a, meal_hash(1, date, 4, "secret"));
        assert_eq!(a, view_hash(&[&"1", &"2026-03-09", &"3", &"secret"]));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_view_hash_is_lowercase_hex(a in ".{0,20}", b in any::<i64>()) {
            let hash = view_hash(&[&a, &b]);
            prop_assert_eq!(hash.len(), 64);
            prop_assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }

        #[test]
        fn prop_view_hash_deterministic(user_id in any::<i64>(), nick in "[a-z]{1,10}") {
            let now = Utc::now();
            prop_assert_eq!(
                community_hash(user_id, &nick, "127.0.0.1", now),
                community_hash(user_id, &nick, "127.0.0.1", now)
            );
        }
    }
}
