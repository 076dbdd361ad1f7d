//! Room media bot: posts files, images, audio, video and text into a room
//! through a [`RoomTransport`](courier_transport::RoomTransport).

pub mod error;
pub mod sender;

pub use {
    error::{Error, Result, Stage},
    sender::{MESSAGE_EVENT, MediaSender, SendMedia},
};
