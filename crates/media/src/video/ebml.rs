//! Matroska/WebM (EBML) track parsing.

use super::VideoDimensions;
use crate::{Error, Result};

const EBML_HEADER: u32 = 0x1A45_DFA3;
const SEGMENT: u32 = 0x1853_8067;
const TRACKS: u32 = 0x1654_AE6B;
const TRACK_ENTRY: u32 = 0xAE;
const TRACK_TYPE: u32 = 0x83;
const VIDEO: u32 = 0xE0;
const PIXEL_WIDTH: u32 = 0xB0;
const PIXEL_HEIGHT: u32 = 0xBA;

/// `TrackType` value for video tracks.
const TRACK_TYPE_VIDEO: u64 = 1;

pub(super) fn sniff(data: &[u8]) -> bool {
    data.get(..4) == Some(EBML_HEADER.to_be_bytes().as_slice())
}

pub(super) fn dimensions(data: &[u8]) -> Result<VideoDimensions> {
    let segment = find_child(data, SEGMENT)?
        .ok_or_else(|| Error::metadata_unavailable("no matroska segment"))?;
    let tracks = find_child(segment, TRACKS)?
        .ok_or_else(|| Error::metadata_unavailable("no matroska tracks element"))?;

    for element in Elements::new(tracks) {
        let (id, body) = element?;
        if id == TRACK_ENTRY
            && let Some(dims) = video_track(body)?
        {
            return Ok(dims);
        }
    }
    Err(Error::metadata_unavailable("no video track found"))
}

fn video_track(entry: &[u8]) -> Result<Option<VideoDimensions>> {
    let Some(track_type) = find_child(entry, TRACK_TYPE)? else {
        return Ok(None);
    };
    if read_uint(track_type) != Some(TRACK_TYPE_VIDEO) {
        return Ok(None);
    }

    let Some(video) = find_child(entry, VIDEO)? else {
        return Err(Error::metadata_unavailable("video track has no video settings"));
    };
    let width = find_child(video, PIXEL_WIDTH)?.and_then(read_uint);
    let height = find_child(video, PIXEL_HEIGHT)?.and_then(read_uint);
    let dims = match (width, height) {
        (Some(w), Some(h)) => u32::try_from(w)
            .ok()
            .zip(u32::try_from(h).ok())
            .and_then(|(w, h)| VideoDimensions::non_empty(w, h)),
        _ => None,
    };
    dims.map(Some)
        .ok_or_else(|| Error::metadata_unavailable("video track has no width/height"))
}

fn find_child(data: &[u8], id: u32) -> Result<Option<&[u8]>> {
    for element in Elements::new(data) {
        let (found, body) = element?;
        if found == id {
            return Ok(Some(body));
        }
    }
    Ok(None)
}

/// Big-endian unsigned integer payload, at most eight bytes.
fn read_uint(body: &[u8]) -> Option<u64> {
    if body.len() > 8 {
        return None;
    }
    Some(body.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Length of a variable-size integer from its first byte.
fn vint_len(first: u8) -> Option<usize> {
    match first.leading_zeros() {
        n @ 0..=7 => Some(n as usize + 1),
        _ => None,
    }
}

/// Element IDs keep their length marker bits.
fn read_id(data: &[u8]) -> Option<(u32, usize)> {
    let len = vint_len(*data.first()?)?;
    if len > 4 {
        return None;
    }
    let bytes = data.get(..len)?;
    let id = bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
    Some((id, len))
}

/// Element sizes drop the marker bit. `None` in the value means "unknown size".
fn read_size(data: &[u8]) -> Option<(Option<u64>, usize)> {
    let first = *data.first()?;
    let len = vint_len(first)?;
    let bytes = data.get(..len)?;
    let mask = if len >= 8 { 0 } else { 0xFFu8 >> len };
    let value = bytes[1..]
        .iter()
        .fold(u64::from(first & mask), |acc, b| (acc << 8) | u64::from(*b));
    let all_ones = (1u64 << (7 * len)) - 1;
    Some(((value != all_ones).then_some(value), len))
}

/// Iterator over sibling elements in a byte range.
struct Elements<'a> {
    rest: &'a [u8],
}

impl<'a> Elements<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }

    fn truncated(&mut self) -> Option<Result<(u32, &'a [u8])>> {
        self.rest = &[];
        Some(Err(Error::metadata_unavailable("truncated matroska element")))
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Result<(u32, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let Some((id, id_len)) = read_id(self.rest) else {
            return self.truncated();
        };
        let Some((size, size_len)) = self.rest.get(id_len..).and_then(read_size) else {
            return self.truncated();
        };
        let start = id_len + size_len;
        let end = match size {
            Some(size) => match usize::try_from(size).ok().and_then(|s| s.checked_add(start)) {
                Some(end) if end <= self.rest.len() => end,
                _ => return self.truncated(),
            },
            // Unknown-size elements (live streams) run to the end of the parent.
            None => self.rest.len(),
        };

        let body = &self.rest[start..end];
        self.rest = &self.rest[end..];
        Some(Ok((id, body)))
    }
}
