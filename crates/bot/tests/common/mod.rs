#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::{io::Cursor, sync::Mutex};

use {
    async_trait::async_trait,
    courier_transport::{EventId, MediaUpload, Result, RoomTransport, UploadResponse},
    image::{ImageFormat, RgbImage},
    serde_json::Value,
};

/// Failure a [`RecordingTransport`] should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Never,
    Upload,
    UploadWithoutUri,
    Send,
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub room_id: String,
    pub event_type: String,
    pub content: Value,
}

/// Transport that records every call and answers with canned replies.
pub struct RecordingTransport {
    fail: Fail,
    pub uploads: Mutex<Vec<MediaUpload>>,
    pub sent: Mutex<Vec<SentMessage>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::failing(Fail::Never)
    }

    pub fn failing(fail: Fail) -> Self {
        Self {
            fail,
            uploads: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<MediaUpload> {
        self.uploads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.uploads().len() + self.sent().len()
    }
}

#[async_trait]
impl RoomTransport for RecordingTransport {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadResponse> {
        let filename = upload.filename.clone();
        self.uploads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(upload);
        match self.fail {
            Fail::Upload => Err(courier_transport::Error::external(
                "upload",
                std::io::Error::other("connection reset"),
            )),
            Fail::UploadWithoutUri => Err(courier_transport::Error::unexpected_response(
                "upload",
                "missing content_uri",
            )),
            _ => Ok(UploadResponse {
                content_uri: format!("mxc://example.org/{filename}"),
            }),
        }
    }

    async fn send_message(
        &self,
        room_id: &str,
        event_type: &str,
        content: Value,
    ) -> Result<EventId> {
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.push(SentMessage {
            room_id: room_id.into(),
            event_type: event_type.into(),
            content,
        });
        if self.fail == Fail::Send {
            return Err(courier_transport::Error::Api {
                status: 403,
                errcode: "M_FORBIDDEN".into(),
                message: "not in room".into(),
            });
        }
        Ok(format!("$event{}", sent.len()))
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn bmff(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

fn trak(width: u32, height: u32, handler: &[u8; 4]) -> Vec<u8> {
    let mut tkhd = vec![0u8; 84];
    tkhd[76..80].copy_from_slice(&(width << 16).to_be_bytes());
    tkhd[80..84].copy_from_slice(&(height << 16).to_be_bytes());

    let mut hdlr = vec![0u8; 8];
    hdlr.extend_from_slice(handler);
    hdlr.extend_from_slice(&[0u8; 13]);

    let mut body = bmff(b"tkhd", &tkhd);
    body.extend(bmff(b"mdia", &bmff(b"hdlr", &hdlr)));
    bmff(b"trak", &body)
}

/// Minimal MP4 with one track of the given handler type.
pub fn mp4(width: u32, height: u32, handler: &[u8; 4]) -> Vec<u8> {
    let mut out = bmff(b"ftyp", b"isom\0\0\x02\0isommp41");
    out.extend(bmff(b"moov", &trak(width, height, handler)));
    out.extend(bmff(b"mdat", &[0u8; 16]));
    out
}
