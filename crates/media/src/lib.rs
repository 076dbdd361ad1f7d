//! Media pipeline for room uploads: resolve a source, check its MIME
//! category, extract per-kind metadata and assemble message content.

pub mod content;
pub mod error;
pub mod image_ops;
pub mod metadata;
pub mod mime;
pub mod source;
pub mod video;

pub use {
    content::{
        AssembleInput, MessageContent, MessageKind, assemble_content, default_body, text_content,
    },
    error::{Error, Result},
    metadata::{ExtractedMetadata, THUMBNAIL_SCALE, extract_metadata},
    mime::{MimeCategory, sniff_mime, validate_mime},
    source::{InlineMedia, MediaReference, ResolvedMedia, ResolverOptions, SourceResolver},
};
