use std::error::Error as StdError;

/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed transport errors shared by every [`RoomTransport`](crate::RoomTransport).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The homeserver answered with a non-success status.
    #[error("homeserver returned {status}: {errcode}: {message}")]
    Api {
        status: u16,
        errcode: String,
        message: String,
    },

    /// The reply did not have the shape the operation expects.
    #[error("unexpected {operation} response: {detail}")]
    UnexpectedResponse {
        operation: &'static str,
        detail: String,
    },

    /// Homeserver base URL is not usable.
    #[error("invalid homeserver url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request could not be sent or its body could not be read.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// Wrapped source error from another transport implementation.
    #[error("transport operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn unexpected_response(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            operation,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
