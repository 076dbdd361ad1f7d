//! MIME sniffing and category validation.

use std::fmt;

use crate::{Error, Result};

/// Coarse MIME category a message kind requires, matched by prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeCategory {
    Image,
    Audio,
    Video,
    /// Any other caller-supplied prefix, e.g. `"image/png"` or `"application/"`.
    Custom(String),
}

impl MimeCategory {
    #[must_use]
    pub fn prefix(&self) -> &str {
        match self {
            Self::Image => "image/",
            Self::Audio => "audio/",
            Self::Video => "video/",
            Self::Custom(prefix) => prefix,
        }
    }

    /// Whether `mime` falls in this category (case-sensitive prefix match).
    #[must_use]
    pub fn matches(&self, mime: &str) -> bool {
        mime.starts_with(self.prefix())
    }
}

impl fmt::Display for MimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl From<&str> for MimeCategory {
    fn from(prefix: &str) -> Self {
        match prefix {
            "image/" => Self::Image,
            "audio/" => Self::Audio,
            "video/" => Self::Video,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Check `actual` against an optional expected category.
///
/// Always succeeds when no category is given.
pub fn validate_mime(actual: &str, expected: Option<&MimeCategory>) -> Result<()> {
    match expected {
        Some(category) if !category.matches(actual) => {
            Err(Error::mime_mismatch(actual, category.prefix()))
        },
        _ => Ok(()),
    }
}

/// Detect a MIME type from magic bytes, never from a file name.
pub fn sniff_mime(data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }
    if data.is_empty() {
        "application/x-empty".to_string()
    } else if std::str::from_utf8(data).is_ok() && !data.contains(&0) {
        "text/plain".to_string()
    } else {
        "application/octet-stream".to_string()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[rstest]
    #[case("image/png", "image/", true)]
    #[case("image/png", "image/png", true)]
    #[case("image/png", "audio/", false)]
    #[case("Image/png", "image/", false)]
    #[case("audio/mpeg", "audio/", true)]
    #[case("video/mp4", "video/", true)]
    #[case("application/octet-stream", "video/", false)]
    #[case("", "image/", false)]
    #[case("text/plain", "", true)]
    fn validates_by_exact_prefix(#[case] mime: &str, #[case] prefix: &str, #[case] ok: bool) {
        let category = MimeCategory::from(prefix);
        assert_eq!(validate_mime(mime, Some(&category)).is_ok(), ok);
        assert_eq!(ok, mime.starts_with(prefix));
    }

    #[rstest]
    #[case("image/png")]
    #[case("")]
    #[case("anything at all")]
    fn no_category_always_passes(#[case] mime: &str) {
        assert!(validate_mime(mime, None).is_ok());
    }

    #[test]
    fn mismatch_carries_both_values() {
        let err = validate_mime("text/plain", Some(&MimeCategory::Image)).unwrap_err();
        match err {
            Error::MimeMismatch { actual, expected } => {
                assert_eq!(actual, "text/plain");
                assert_eq!(expected, "image/");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn known_prefixes_map_to_variants() {
        assert_eq!(MimeCategory::from("image/"), MimeCategory::Image);
        assert_eq!(MimeCategory::from("audio/"), MimeCategory::Audio);
        assert_eq!(MimeCategory::from("video/"), MimeCategory::Video);
        assert_eq!(
            MimeCategory::from("image/png"),
            MimeCategory::Custom("image/png".into())
        );
        assert_eq!(MimeCategory::Video.to_string(), "video/");
    }

    #[test]
    fn sniffs_magic_bytes() {
        assert_eq!(sniff_mime(PNG_MAGIC), "image/png");
        assert_eq!(sniff_mime(b"ID3\x03\x00\x00\x00\x00\x00\x00"), "audio/mpeg");
    }

    #[test]
    fn sniff_fallbacks() {
        assert_eq!(sniff_mime(b""), "application/x-empty");
        assert_eq!(sniff_mime(b"hello, room"), "text/plain");
        assert_eq!(sniff_mime(&[0x00, 0x13, 0x37, 0xFE]), "application/octet-stream");
    }
}
