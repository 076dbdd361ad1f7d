//! Per-kind descriptive metadata.

use crate::{
    Result, content::MessageKind, image_ops::image_dimensions, source::ResolvedMedia,
    video::video_dimensions,
};

/// Declared video thumbnail size relative to the video frame.
///
/// 0.625 is exactly representable, so `dim * THUMBNAIL_SCALE` is exact for
/// every `u32` dimension.
pub const THUMBNAIL_SCALE: f64 = 0.625;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractedMetadata {
    Image {
        width: u32,
        height: u32,
    },
    Video {
        width: u32,
        height: u32,
        thumb_width: f64,
        thumb_height: f64,
    },
    None,
}

impl ExtractedMetadata {
    /// Video metadata with the thumbnail size derived from the frame size.
    #[must_use]
    pub fn video(width: u32, height: u32) -> Self {
        Self::Video {
            width,
            height,
            thumb_width: f64::from(width) * THUMBNAIL_SCALE,
            thumb_height: f64::from(height) * THUMBNAIL_SCALE,
        }
    }
}

/// Extract what `kind` needs from the payload.
///
/// Images and videos must yield both dimensions; audio and plain files never
/// fail.
pub fn extract_metadata(kind: MessageKind, media: &ResolvedMedia) -> Result<ExtractedMetadata> {
    match kind {
        MessageKind::Image => {
            let dims = image_dimensions(&media.content)?;
            Ok(ExtractedMetadata::Image {
                width: dims.width,
                height: dims.height,
            })
        },
        MessageKind::Video => {
            let dims = video_dimensions(&media.content)?;
            Ok(ExtractedMetadata::video(dims.width, dims.height))
        },
        MessageKind::Audio | MessageKind::File => Ok(ExtractedMetadata::None),
    }
}
