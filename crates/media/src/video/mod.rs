//! Video container probing.
//!
//! Only container metadata is parsed; no frame is ever decoded. Two families
//! are understood: ISO base media (MP4, MOV, M4V, 3GP) and Matroska/WebM.

mod ebml;
mod isobmff;

use crate::{Error, Result};

/// Pixel dimensions of the first video track in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    fn non_empty(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

/// Locate the first video track and read its width and height.
pub fn video_dimensions(data: &[u8]) -> Result<VideoDimensions> {
    if isobmff::sniff(data) {
        isobmff::dimensions(data)
    } else if ebml::sniff(data) {
        ebml::dimensions(data)
    } else {
        Err(Error::metadata_unavailable("unrecognized video container"))
    }
}
