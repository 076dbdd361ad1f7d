use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an [`Error`] was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Validate,
    Extract,
    Upload,
    Send,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::Validate => "validate",
            Self::Extract => "extract",
            Self::Upload => "upload",
            Self::Send => "send",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No room was given and the sender has no default room.
    #[error("no room id given and no default room configured")]
    MissingRoom,

    #[error("source not found: {reference}")]
    SourceNotFound { reference: String },

    /// Fetching or reading an otherwise valid source failed.
    #[error("failed to resolve media: {0}")]
    Resolve(#[source] courier_media::Error),

    #[error("got MIME type {actual}, but expected {expected}")]
    MimeMismatch { actual: String, expected: String },

    #[error("media metadata unavailable: {reason}")]
    MetadataUnavailable { reason: String },

    #[error("upload failed: {0}")]
    UploadFailed(#[source] courier_transport::Error),

    /// The upload succeeded but the reply carried no usable content URI.
    #[error("upload response had no content uri: {detail}")]
    UnexpectedUploadResponse { detail: String },

    #[error("failed to send message to {room_id}: {source}")]
    SendFailed {
        room_id: String,
        #[source]
        source: courier_transport::Error,
    },
}

impl Error {
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingRoom | Self::SourceNotFound { .. } | Self::Resolve(_) => Stage::Resolve,
            Self::MimeMismatch { .. } => Stage::Validate,
            Self::MetadataUnavailable { .. } => Stage::Extract,
            Self::UploadFailed(_) | Self::UnexpectedUploadResponse { .. } => Stage::Upload,
            Self::SendFailed { .. } => Stage::Send,
        }
    }

    #[must_use]
    pub fn upload(source: courier_transport::Error) -> Self {
        match source {
            courier_transport::Error::UnexpectedResponse { detail, .. } => {
                Self::UnexpectedUploadResponse { detail }
            },
            other => Self::UploadFailed(other),
        }
    }

    #[must_use]
    pub fn send(room_id: impl Into<String>, source: courier_transport::Error) -> Self {
        Self::SendFailed {
            room_id: room_id.into(),
            source,
        }
    }
}

impl From<courier_media::Error> for Error {
    fn from(err: courier_media::Error) -> Self {
        use courier_media::Error as Media;
        match err {
            Media::SourceNotFound { reference } => Self::SourceNotFound { reference },
            Media::MimeMismatch { actual, expected } => Self::MimeMismatch { actual, expected },
            Media::MetadataUnavailable { reason } => Self::MetadataUnavailable { reason },
            other @ (Media::Fetch { .. } | Media::Io { .. }) => Self::Resolve(other),
        }
    }
}
