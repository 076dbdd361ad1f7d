//! Chat transport seam.
//!
//! [`RoomTransport`] is what the media pipeline needs from a chat client:
//! put a blob in the media repository and deliver an event to a room.
//! [`MatrixTransport`] implements it against the Matrix client-server API
//! with an already issued access token.

pub mod error;
pub mod matrix;

use std::sync::Arc;

use {async_trait::async_trait, bytes::Bytes, serde_json::Value};

pub use {
    error::{Error, Result},
    matrix::MatrixTransport,
};

/// Event ID returned by the homeserver for a delivered event.
pub type EventId = String;

/// A blob handed to the media repository.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub content: Bytes,
    pub content_type: String,
    pub filename: String,
    /// Declared size; informational, the body length is authoritative.
    pub size: u64,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    /// `mxc://` URI referencing the stored blob.
    pub content_uri: String,
}

/// Upload and send primitives of a chat session that is already logged in.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadResponse>;

    async fn send_message(&self, room_id: &str, event_type: &str, content: Value)
    -> Result<EventId>;
}

#[async_trait]
impl<T: RoomTransport + ?Sized> RoomTransport for Arc<T> {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadResponse> {
        (**self).upload(upload).await
    }

    async fn send_message(
        &self,
        room_id: &str,
        event_type: &str,
        content: Value,
    ) -> Result<EventId> {
        (**self).send_message(room_id, event_type, content).await
    }
}
