/// Failures raised while turning a media reference into message content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The reference is neither inline, a valid URL, nor an existing path.
    #[error("source not found: {reference}")]
    SourceNotFound { reference: String },

    /// Resolved MIME type does not start with the expected category prefix.
    #[error("got MIME type {actual}, but expected {expected}")]
    MimeMismatch { actual: String, expected: String },

    /// Image decode failed, or no video track/dimensions could be found.
    #[error("media metadata unavailable: {reason}")]
    MetadataUnavailable { reason: String },

    /// The remote source could not be fetched.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn source_not_found(reference: impl Into<String>) -> Self {
        Self::SourceNotFound {
            reference: reference.into(),
        }
    }

    #[must_use]
    pub fn mime_mismatch(actual: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::MimeMismatch {
            actual: actual.into(),
            expected: expected.into(),
        }
    }

    #[must_use]
    pub fn metadata_unavailable(reason: impl Into<String>) -> Self {
        Self::MetadataUnavailable {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
