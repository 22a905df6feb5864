//! Image variant naming convention
//!
//! Every uploaded image is stored as five files that differ only in a
//! `_<variant>.<ext>` suffix. The database keeps the suffix-less base path;
//! clients rebuild the URL of whichever size they need with [`variant_path`].

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Extension of every encoded variant
pub const VARIANT_EXTENSION: &str = "jpg";

/// Variant whose path is persisted (after stripping) as the representative path
pub const REPRESENTATIVE_VARIANT: Variant = Variant::Medium;

/// A named output size of the image pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Original,
    Large,
    Medium,
    Small,
    Thumbnail,
}

/// The fixed, ordered variant table
pub const VARIANTS: [Variant; 5] = [
    Variant::Original,
    Variant::Large,
    Variant::Medium,
    Variant::Small,
    Variant::Thumbnail,
];

impl Variant {
    /// Target width in pixels, `None` keeps the source size
    pub const fn target_width(self) -> Option<u32> {
        match self {
            Variant::Original => None,
            Variant::Large => Some(1200),
            Variant::Medium => Some(800),
            Variant::Small => Some(400),
            Variant::Thumbnail => Some(150),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Variant::Original => "original",
            Variant::Large => "large",
            Variant::Medium => "medium",
            Variant::Small => "small",
            Variant::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VARIANTS
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseError::UnknownVariant(s.to_string()))
    }
}

/// File name of one variant: `{base}_{variant}.jpg`
pub fn variant_file_name(base: &str, variant: Variant) -> String {
    format!("{}_{}.{}", base, variant, VARIANT_EXTENSION)
}

/// Rebuild a variant path from a stored (suffix-less) path
pub fn variant_path(stored: &str, variant: Variant) -> String {
    variant_file_name(stored, variant)
}

/// All five variant paths of a stored path, in table order
pub fn all_variant_paths(stored: &str) -> Vec<String> {
    VARIANTS.iter().map(|v| variant_path(stored, *v)).collect()
}

/// Strip a trailing `_<variant>.<ext>` from a path
///
/// Returns `None` when the last path segment does not end in a known
/// variant suffix. Backslashes are normalized to `/` first.
pub fn strip_variant_suffix(path: &str) -> Option<String> {
    let path = path.replace('\\', "/");
    let (stem, ext) = path.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    let (base, suffix) = stem.rsplit_once('_')?;
    if base.is_empty() || base.ends_with('/') {
        return None;
    }
    suffix.parse::<Variant>().ok()?;
    Some(base.to_string())
}

/// Stored variant paths for a list of images, keyed by variant name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrls {
    pub path: String,
    pub original: String,
    pub large: String,
    pub medium: String,
    pub small: String,
    pub thumbnail: String,
}

impl ImageUrls {
    pub fn from_stored(stored: &str) -> Self {
        Self {
            path: stored.to_string(),
            original: variant_path(stored, Variant::Original),
            large: variant_path(stored, Variant::Large),
            medium: variant_path(stored, Variant::Medium),
            small: variant_path(stored, Variant::Small),
            thumbnail: variant_path(stored, Variant::Thumbnail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_table_is_ordered_by_decreasing_width() {
        let widths: Vec<_> = VARIANTS.iter().filter_map(|v| v.target_width()).collect();
        assert_eq!(widths, vec![1200, 800, 400, 150]);
        assert_eq!(VARIANTS[0], Variant::Original);
    }

    #[test]
    fn test_variant_file_name() {
        assert_eq!(
            variant_file_name("20260123120000_ab12cd34", Variant::Medium),
            "20260123120000_ab12cd34_medium.jpg"
        );
    }

    #[rstest]
    #[case("/attaches/feeds/07/7/20260123120000_ab12cd34_medium.jpg", Some("/attaches/feeds/07/7/20260123120000_ab12cd34"))]
    #[case("/attaches/feeds/07/7/20260123120000_ab12cd34_thumbnail.webp", Some("/attaches/feeds/07/7/20260123120000_ab12cd34"))]
    #[case("attaches\\users\\01\\1\\x_small.jpg", Some("attaches/users/01/1/x"))]
    #[case("/attaches/feeds/07/7/20260123120000_ab12cd34", None)]
    #[case("/attaches/feeds/07/7/photo_huge.jpg", None)]
    #[case("/attaches/feeds/_medium.jpg", None)]
    #[case("no_extension_medium", None)]
    fn test_strip_variant_suffix(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(strip_variant_suffix(input).as_deref(), expected);
    }

    #[test]
    fn test_image_urls_from_stored() {
        let urls = ImageUrls::from_stored("/attaches/meals/05/105/a_b");
        assert_eq!(urls.thumbnail, "/attaches/meals/05/105/a_b_thumbnail.jpg");
        assert_eq!(urls.original, "/attaches/meals/05/105/a_b_original.jpg");
    }

    #[test]
    fn test_variant_round_trips_through_str() {
        for v in VARIANTS {
            assert_eq!(v.as_str().parse::<Variant>().unwrap(), v);
        }
        assert!("huge".parse::<Variant>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stripping any derived variant path recovers the stored path
        #[test]
        fn prop_strip_inverts_derive(
            dir in "(/[a-z0-9]{1,8}){0,4}",
            base in "[0-9]{14}_[0-9a-f]{8}",
            idx in 0usize..5,
        ) {
            let stored = format!("{}/{}", dir, base);
            let derived = variant_path(&stored, VARIANTS[idx]);
            prop_assert_eq!(strip_variant_suffix(&derived), Some(stored));
        }
    }
}
