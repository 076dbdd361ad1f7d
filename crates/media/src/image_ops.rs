//! Raster image header inspection.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::{Error, Result};

/// Pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
}

/// Read width and height without decoding the pixel data.
///
/// Unsupported or corrupt payloads and zero-sized images are
/// [`Error::MetadataUnavailable`].
pub fn image_dimensions(data: &[u8]) -> Result<ImageDimensions> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::metadata_unavailable(format!("failed to guess image format: {e}")))?;

    let format = reader.format();
    if format.is_none() {
        return Err(Error::metadata_unavailable("unrecognized image format"));
    }
    let (width, height) = reader.into_dimensions().map_err(|e| {
        Error::metadata_unavailable(format!("failed to read image dimensions: {e}"))
    })?;

    if width == 0 || height == 0 {
        return Err(Error::metadata_unavailable(format!(
            "image has empty dimensions {width}x{height}"
        )));
    }

    Ok(ImageDimensions {
        width,
        height,
        format,
    })
}
