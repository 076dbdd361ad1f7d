//! Upload coordination: resolve, validate, extract, upload, assemble, send.

use {
    courier_media::{
        AssembleInput, MediaReference, MessageKind, MimeCategory, SourceResolver,
        assemble_content, extract_metadata, text_content, validate_mime,
    },
    courier_transport::{EventId, MediaUpload, RoomTransport},
    serde_json::{Map, Value},
    tracing::{debug, info, warn},
};

use crate::{Error, Result};

/// Event type for every message the sender posts.
pub const MESSAGE_EVENT: &str = "m.room.message";

/// One media message to post.
#[derive(Debug, Clone)]
pub struct SendMedia {
    pub kind: MessageKind,
    pub reference: MediaReference,
    pub body: Option<String>,
    /// Top-level fields merged over the assembled content.
    pub extra: Option<Map<String, Value>>,
    pub expected_category: Option<MimeCategory>,
}

impl SendMedia {
    /// A request whose expected MIME category follows from `kind`.
    #[must_use]
    pub fn new(kind: MessageKind, reference: MediaReference) -> Self {
        Self {
            kind,
            reference,
            body: None,
            extra: None,
            expected_category: kind.expected_category(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<&str>) -> Self {
        self.body = body.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Option<Map<String, Value>>) -> Self {
        self.extra = extra;
        self
    }

    #[must_use]
    pub fn with_expected_category(mut self, category: Option<MimeCategory>) -> Self {
        self.expected_category = category;
        self
    }
}

/// Posts media into rooms through a [`RoomTransport`].
///
/// Every call runs the whole pipeline on its own and stops at the first
/// failing stage. Nothing is sent unless every earlier stage succeeded.
pub struct MediaSender<T> {
    transport: T,
    resolver: SourceResolver,
    default_room: Option<String>,
}

impl<T: RoomTransport> MediaSender<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            resolver: SourceResolver::default(),
            default_room: None,
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: SourceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_default_room(mut self, room_id: impl Into<String>) -> Self {
        self.default_room = Some(room_id.into());
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn default_room(&self) -> Option<&str> {
        self.default_room.as_deref()
    }

    /// The room a send goes to: `room_id`, else the default room.
    pub fn room<'a>(&'a self, room_id: Option<&'a str>) -> Result<&'a str> {
        room_id.or(self.default_room()).ok_or(Error::MissingRoom)
    }

    /// Run the full upload pipeline and return the event ID of the posted
    /// message. `room_id` falls back to the default room.
    pub async fn send_media(&self, room_id: Option<&str>, request: SendMedia) -> Result<EventId> {
        let room_id = self.room(room_id)?;
        let SendMedia {
            kind,
            reference,
            body,
            extra,
            expected_category,
        } = request;
        info!(room_id, %kind, source = reference.kind(), "sending media");

        let media = self.resolver.resolve(&reference).await?;
        debug!(name = %media.name, mime = %media.mime, size = media.size, "media resolved");

        validate_mime(&media.mime, expected_category.as_ref())?;
        let metadata = extract_metadata(kind, &media)?;
        debug!(?metadata, "metadata extracted");

        let uploaded = self
            .transport
            .upload(MediaUpload {
                content: media.content.clone(),
                content_type: media.mime.clone(),
                filename: media.name.clone(),
                size: media.size,
            })
            .await
            .map_err(Error::upload)?;
        debug!(content_uri = %uploaded.content_uri, "media uploaded");

        let content = assemble_content(AssembleInput {
            kind,
            media: &media,
            metadata: &metadata,
            body: body.as_deref(),
            extra,
            content_uri: &uploaded.content_uri,
        });

        let event_id = self
            .transport
            .send_message(room_id, MESSAGE_EVENT, content.into_value())
            .await
            .map_err(|source| {
                warn!(
                    room_id,
                    content_uri = %uploaded.content_uri,
                    error = %source,
                    "message send failed, uploaded media is left orphaned"
                );
                Error::send(room_id, source)
            })?;

        info!(room_id, %kind, mime = %media.mime, size = media.size, %event_id, "media sent");
        Ok(event_id)
    }

    /// Any file; no MIME restriction. `extra` is merged over the content.
    pub async fn send_file(
        &self,
        room_id: Option<&str>,
        reference: MediaReference,
        body: Option<&str>,
        extra: Option<Map<String, Value>>,
    ) -> Result<EventId> {
        let request = SendMedia::new(MessageKind::File, reference)
            .with_body(body)
            .with_extra(extra);
        self.send_media(room_id, request).await
    }

    pub async fn send_image(
        &self,
        room_id: Option<&str>,
        reference: MediaReference,
        body: Option<&str>,
    ) -> Result<EventId> {
        let request = SendMedia::new(MessageKind::Image, reference).with_body(body);
        self.send_media(room_id, request).await
    }

    pub async fn send_audio(
        &self,
        room_id: Option<&str>,
        reference: MediaReference,
        body: Option<&str>,
    ) -> Result<EventId> {
        let request = SendMedia::new(MessageKind::Audio, reference).with_body(body);
        self.send_media(room_id, request).await
    }

    pub async fn send_video(
        &self,
        room_id: Option<&str>,
        reference: MediaReference,
        body: Option<&str>,
    ) -> Result<EventId> {
        let request = SendMedia::new(MessageKind::Video, reference).with_body(body);
        self.send_media(room_id, request).await
    }

    /// Plain `m.text` message.
    pub async fn send_text(&self, room_id: Option<&str>, message: &str) -> Result<EventId> {
        let room_id = self.room(room_id)?;
        let event_id = self
            .transport
            .send_message(room_id, MESSAGE_EVENT, text_content(message).into_value())
            .await
            .map_err(|source| Error::send(room_id, source))?;
        info!(room_id, %event_id, "text sent");
        Ok(event_id)
    }
}
