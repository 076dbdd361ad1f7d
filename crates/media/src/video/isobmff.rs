//! ISO base media file format (MP4/MOV) box walking.

use super::VideoDimensions;
use crate::{Error, Result};

/// `tkhd` width offset for version 0 and version 1 headers.
const TKHD_V0_WIDTH_AT: usize = 76;
const TKHD_V1_WIDTH_AT: usize = 88;
/// Width offset inside a visual sample entry body.
const SAMPLE_ENTRY_WIDTH_AT: usize = 24;

/// Box types a file may open with. QuickTime movies often have no `ftyp`.
const LEADING_BOXES: &[&[u8; 4]] = &[
    b"ftyp", b"moov", b"mdat", b"wide", b"free", b"skip", b"pnot",
];

pub(super) fn sniff(data: &[u8]) -> bool {
    data.get(4..8)
        .is_some_and(|kind| LEADING_BOXES.iter().any(|b| b.as_slice() == kind))
}

pub(super) fn dimensions(data: &[u8]) -> Result<VideoDimensions> {
    let moov = find_child(data, b"moov")?
        .ok_or_else(|| Error::metadata_unavailable("no moov box in container"))?;

    for entry in Boxes::new(moov) {
        let (kind, body) = entry?;
        if &kind == b"trak"
            && let Some(dims) = video_track(body)?
        {
            return Ok(dims);
        }
    }
    Err(Error::metadata_unavailable("no video track found"))
}

/// Dimensions of a `trak` if its handler is `vide`, `None` for other tracks.
fn video_track(trak: &[u8]) -> Result<Option<VideoDimensions>> {
    let Some(mdia) = find_child(trak, b"mdia")? else {
        return Ok(None);
    };
    let Some(hdlr) = find_child(mdia, b"hdlr")? else {
        return Ok(None);
    };
    // version/flags (4) + pre_defined (4) + handler_type (4)
    if hdlr.get(8..12) != Some(b"vide".as_slice()) {
        return Ok(None);
    }

    if let Some(dims) = find_child(trak, b"tkhd")?.and_then(tkhd_dimensions) {
        return Ok(Some(dims));
    }
    if let Some(dims) = sample_entry_dimensions(mdia)? {
        return Ok(Some(dims));
    }
    Err(Error::metadata_unavailable("video track has no width/height"))
}

/// Track header width/height are 16.16 fixed point.
fn tkhd_dimensions(tkhd: &[u8]) -> Option<VideoDimensions> {
    let at = match tkhd.first()? {
        1 => TKHD_V1_WIDTH_AT,
        _ => TKHD_V0_WIDTH_AT,
    };
    let width = be_u32(tkhd.get(at..at + 4)?) >> 16;
    let height = be_u32(tkhd.get(at + 4..at + 8)?) >> 16;
    VideoDimensions::non_empty(width, height)
}

/// Fallback: first visual sample entry in `mdia/minf/stbl/stsd`.
fn sample_entry_dimensions(mdia: &[u8]) -> Result<Option<VideoDimensions>> {
    let Some(minf) = find_child(mdia, b"minf")? else {
        return Ok(None);
    };
    let Some(stbl) = find_child(minf, b"stbl")? else {
        return Ok(None);
    };
    let Some(stsd) = find_child(stbl, b"stsd")? else {
        return Ok(None);
    };
    // version/flags (4) + entry_count (4), then the entries as boxes.
    let Some(entries) = stsd.get(8..) else {
        return Ok(None);
    };
    let Some(entry) = Boxes::new(entries).next().transpose()? else {
        return Ok(None);
    };
    let body = entry.1;
    let dims = body
        .get(SAMPLE_ENTRY_WIDTH_AT..SAMPLE_ENTRY_WIDTH_AT + 4)
        .and_then(|wh| {
            let width = u32::from(u16::from_be_bytes([wh[0], wh[1]]));
            let height = u32::from(u16::from_be_bytes([wh[2], wh[3]]));
            VideoDimensions::non_empty(width, height)
        });
    Ok(dims)
}

fn find_child<'a>(data: &'a [u8], kind: &[u8; 4]) -> Result<Option<&'a [u8]>> {
    for entry in Boxes::new(data) {
        let (found, body) = entry?;
        if &found == kind {
            return Ok(Some(body));
        }
    }
    Ok(None)
}

fn be_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(buf)
}

/// Iterator over sibling boxes in a byte range.
struct Boxes<'a> {
    rest: &'a [u8],
}

impl<'a> Boxes<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }

    fn truncated(&mut self) -> Option<Result<([u8; 4], &'a [u8])>> {
        self.rest = &[];
        Some(Err(Error::metadata_unavailable("truncated container box")))
    }
}

impl<'a> Iterator for Boxes<'a> {
    type Item = Result<([u8; 4], &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let Some(header) = self.rest.get(..8) else {
            return self.truncated();
        };
        let size = be_u32(&header[..4]);
        let mut kind = [0u8; 4];
        kind.copy_from_slice(&header[4..8]);

        let (header_len, total) = match size {
            // Box extends to the end of its parent.
            0 => (8, self.rest.len() as u64),
            1 => {
                let Some(large) = self.rest.get(8..16) else {
                    return self.truncated();
                };
                let mut buf = [0u8; 8];
                buf.copy_from_slice(large);
                (16, u64::from_be_bytes(buf))
            },
            n => (8, u64::from(n)),
        };

        let Ok(total) = usize::try_from(total) else {
            return self.truncated();
        };
        if total < header_len || total > self.rest.len() {
            return self.truncated();
        }

        let body = &self.rest[header_len..total];
        self.rest = &self.rest[total..];
        Some(Ok((kind, body)))
    }
}
