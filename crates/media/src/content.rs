//! `m.room.message` content assembly.

use std::fmt;

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value, json},
};

use crate::{metadata::ExtractedMetadata, mime::MimeCategory, source::ResolvedMedia};

/// Message kinds a media upload can be posted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    File,
    Image,
    Audio,
    Video,
}

impl MessageKind {
    #[must_use]
    pub fn msgtype(self) -> &'static str {
        match self {
            Self::File => "m.file",
            Self::Image => "m.image",
            Self::Audio => "m.audio",
            Self::Video => "m.video",
        }
    }

    /// The MIME category uploads of this kind must fall in, if any.
    #[must_use]
    pub fn expected_category(self) -> Option<MimeCategory> {
        match self {
            Self::File => None,
            Self::Image => Some(MimeCategory::Image),
            Self::Audio => Some(MimeCategory::Audio),
            Self::Video => Some(MimeCategory::Video),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msgtype())
    }
}

/// JSON object sent as the content of an `m.room.message` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent(Map<String, Value>);

impl MessageContent {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Shallow merge: each top-level key in `extra` replaces the base value.
    /// Keys absent from `extra` are kept.
    #[must_use]
    pub fn overlay(mut self, extra: Map<String, Value>) -> Self {
        for (key, value) in extra {
            self.0.insert(key, value);
        }
        self
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for MessageContent {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Plain `m.text` content.
#[must_use]
pub fn text_content(body: &str) -> MessageContent {
    let mut content = MessageContent::default();
    content.insert("msgtype", json!("m.text"));
    content.insert("body", json!(body));
    content
}

/// Caller body if given, otherwise the media name.
#[must_use]
pub fn default_body(body: Option<&str>, media: &ResolvedMedia) -> String {
    body.map_or_else(|| media.name.clone(), str::to_string)
}

/// Everything the assembler needs once the upload has produced a content URI.
#[derive(Debug, Clone)]
pub struct AssembleInput<'a> {
    pub kind: MessageKind,
    pub media: &'a ResolvedMedia,
    pub metadata: &'a ExtractedMetadata,
    pub body: Option<&'a str>,
    pub extra: Option<Map<String, Value>>,
    pub content_uri: &'a str,
}

/// Build the final message content; `extra` is applied last and may
/// override any key.
#[must_use]
pub fn assemble_content(input: AssembleInput<'_>) -> MessageContent {
    let mut info = Map::new();
    info.insert("size".into(), json!(input.media.size));
    info.insert("mimetype".into(), json!(input.media.mime));
    merge_metadata(&mut info, input.metadata);

    let mut content = MessageContent::default();
    content.insert("msgtype", json!(input.kind.msgtype()));
    content.insert("body", json!(default_body(input.body, input.media)));
    content.insert("url", json!(input.content_uri));
    content.insert("info", Value::Object(info));

    match input.extra {
        Some(extra) => content.overlay(extra),
        None => content,
    }
}

fn merge_metadata(info: &mut Map<String, Value>, metadata: &ExtractedMetadata) {
    match *metadata {
        ExtractedMetadata::Image { width, height } => {
            info.insert("w".into(), json!(width));
            info.insert("h".into(), json!(height));
            // No thumbnail is produced; clients still expect the keys.
            info.insert("thumbnail_info".into(), Value::Null);
            info.insert("thumbnail_url".into(), Value::Null);
        },
        ExtractedMetadata::Video {
            width,
            height,
            thumb_width,
            thumb_height,
        } => {
            info.insert("w".into(), json!(width));
            info.insert("h".into(), json!(height));
            info.insert(
                "thumbnail_info".into(),
                json!({ "w": thumb_width, "h": thumb_height }),
            );
        },
        ExtractedMetadata::None => {},
    }
}
