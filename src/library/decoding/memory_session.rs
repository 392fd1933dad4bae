//In-memory decoder used by the tests. Frames are 9x8 grayscale images whose dhash is known
//exactly, because the fingerprint resize is then a no-op.

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use image::Rgb;

use super::{DecodeError, DecoderFactory, DecoderSession, FrameRef, VideoMetadata};
use crate::library::img_ops::RgbImgBuf;

pub fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A 9x8 image whose 8x8 dhash is exactly `bits` (bit n is row n / 8, column n % 8).
pub fn frame_with_fingerprint(bits: u64) -> RgbImgBuf {
    let mut img = RgbImgBuf::new(9, 8);
    for y in 0..8 {
        let mut value: i32 = 128;
        img.put_pixel(0, y, Rgb([value as u8; 3]));
        for x in 0..8 {
            let bit_no = y * 8 + x;
            value += if (bits >> bit_no) & 1 == 1 { 12 } else { -12 };
            img.put_pixel(x + 1, y, Rgb([value as u8; 3]));
        }
    }
    img
}

pub fn distinct_frames(num_frames: usize) -> Vec<RgbImgBuf> {
    (0..num_frames)
        .map(|k| frame_with_fingerprint(splitmix64(k as u64 + 1)))
        .collect()
}

pub struct MemorySession {
    frames: Arc<Vec<RgbImgBuf>>,
    metadata: VideoMetadata,
    fail_at: Option<u64>,
    buf: RgbImgBuf,
    pos: u64,
    released: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
    decoder_released: Option<Arc<AtomicUsize>>,
}

impl MemorySession {
    pub fn new(frames: Vec<RgbImgBuf>) -> Self {
        Self::from_shared(Arc::new(frames), None, Arc::default(), Arc::default())
    }

    fn from_shared(
        frames: Arc<Vec<RgbImgBuf>>,
        fail_at: Option<u64>,
        released: Arc<AtomicUsize>,
        reads: Arc<AtomicUsize>,
    ) -> Self {
        let (width, height) = frames.first().map(|f| f.dimensions()).unwrap_or((9, 8));
        Self {
            metadata: VideoMetadata {
                total_frames: frames.len() as u64,
                fps: 25.0,
                width,
                height,
            },
            frames,
            fail_at,
            buf: RgbImgBuf::new(width, height),
            pos: 0,
            released,
            reads,
            decoder_released: None,
        }
    }

    pub fn with_fail_at(mut self, frame_index: u64) -> Self {
        self.fail_at = Some(frame_index);
        self
    }

    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        self.released.clone()
    }

    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }

    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl DecoderSession for MemorySession {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn read_next_frame(&mut self) -> Result<Option<FrameRef<'_>>, DecodeError> {
        if self.released.load(Ordering::SeqCst) > 0 {
            return Err(DecodeError::Released);
        }
        if self.fail_at == Some(self.pos) {
            return Err(DecodeError::Io(std::io::Error::new(
                ErrorKind::InvalidData,
                "corrupt packet",
            )));
        }

        let frame = match self.frames.get(self.pos as usize) {
            Some(frame) => frame,
            None => return Ok(None),
        };
        self.reads.fetch_add(1, Ordering::SeqCst);

        //reuse the buffer between reads, as a real decoder would.
        if self.buf.dimensions() == frame.dimensions() {
            self.buf.copy_from_slice(frame.as_raw());
        } else {
            self.buf = frame.clone();
        }

        let index = self.pos;
        self.pos += 1;
        Ok(Some(FrameRef::new(index, &self.buf)))
    }

    fn seek_to_start(&mut self) -> Result<(), DecodeError> {
        if self.released.load(Ordering::SeqCst) > 0 {
            return Err(DecodeError::Released);
        }
        self.pos = 0;
        Ok(())
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
        if let Some(decoder_released) = &self.decoder_released {
            decoder_released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Clone)]
pub enum MemoryVideo {
    Frames(Arc<Vec<RgbImgBuf>>),
    FailsAt(Arc<Vec<RgbImgBuf>>, u64),
    Unreadable,
    PanicsOnOpen,
}

/// Hands out `MemorySession`s for registered paths and counts opens and releases across all of
/// them.
#[derive(Default)]
pub struct MemoryDecoder {
    videos: HashMap<PathBuf, MemoryVideo>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MemoryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, path: impl AsRef<Path>, video: MemoryVideo) -> Self {
        self.videos.insert(path.as_ref().to_path_buf(), video);
        self
    }

    pub fn with_frames(self, path: impl AsRef<Path>, frames: Vec<RgbImgBuf>) -> Self {
        self.with_video(path, MemoryVideo::Frames(Arc::new(frames)))
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl DecoderFactory for MemoryDecoder {
    type Session = MemorySession;

    fn open(&self, src_path: &Path) -> Result<MemorySession, DecodeError> {
        let video = self.videos.get(src_path).cloned().unwrap_or(MemoryVideo::Unreadable);

        let (frames, fail_at) = match video {
            MemoryVideo::Frames(frames) => (frames, None),
            MemoryVideo::FailsAt(frames, fail_at) => (frames, Some(fail_at)),
            MemoryVideo::Unreadable => {
                return Err(DecodeError::Io(std::io::Error::new(
                    ErrorKind::NotFound,
                    "no such video",
                )))
            }
            MemoryVideo::PanicsOnOpen => panic!("decoder crashed opening {}", src_path.display()),
        };

        self.opened.fetch_add(1, Ordering::SeqCst);

        let mut session = MemorySession::from_shared(frames, fail_at, Arc::default(), Arc::default());
        session.decoder_released = Some(self.released.clone());
        Ok(session)
    }
}

