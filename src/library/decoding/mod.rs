use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::library::{ffmpeg_ops::FfmpegErrorKind, img_ops::ImgOpsError, img_ops::RgbImgBuf};

mod ffmpeg_session;
#[cfg(test)]
pub mod memory_session;
mod session_guard;

pub use ffmpeg_session::FfmpegDecoder;
pub use session_guard::SessionGuard;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Ffmpeg(#[from] FfmpegErrorKind),

    #[error(transparent)]
    Img(#[from] ImgOpsError),

    #[error("Failed to read frames from the decoder: {0}")]
    Io(#[from] std::io::Error),

    #[error("The decoder session has already been released")]
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub total_frames: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

/// A decoded frame which owns its pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    index: u64,
    image: RgbImgBuf,
}

impl Frame {
    pub fn new(index: u64, image: RgbImgBuf) -> Self {
        Self { index, image }
    }

    /// 0-based position of this frame in decode order.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &RgbImgBuf {
        &self.image
    }
}

/// A decoded frame which borrows the decoder's internal buffer. The buffer is overwritten
/// by the next read, so anything which outlives the read must go through `to_owned_frame`.
#[derive(Debug, Clone, Copy)]
pub struct FrameRef<'a> {
    index: u64,
    image: &'a RgbImgBuf,
}

impl<'a> FrameRef<'a> {
    pub fn new(index: u64, image: &'a RgbImgBuf) -> Self {
        Self { index, image }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &'a RgbImgBuf {
        self.image
    }

    pub fn to_owned_frame(&self) -> Frame {
        Frame::new(self.index, self.image.clone())
    }
}

/// An opened video which yields its frames one at a time, in decode order.
///
/// A session is owned by a single reader. Implementations are not required to support
/// concurrent reads.
pub trait DecoderSession {
    fn metadata(&self) -> VideoMetadata;

    /// Returns `Ok(None)` at the end of the stream.
    fn read_next_frame(&mut self) -> Result<Option<FrameRef<'_>>, DecodeError>;

    /// Rewind so that the next read returns frame 0 again.
    fn seek_to_start(&mut self) -> Result<(), DecodeError>;

    /// Free the underlying decoder. Must be safe to call more than once.
    fn release(&mut self);
}

pub trait DecoderFactory: Sync {
    type Session: DecoderSession;

    fn open(&self, src_path: &Path) -> Result<Self::Session, DecodeError>;
}
