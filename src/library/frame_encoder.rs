use std::path::{Path, PathBuf};

use crate::library::{
    decoding::Frame,
    definitions::{image_file_name, JPEG_QUALITY},
    errors::EncodeWriteError,
    img_ops::{encode_jpeg, ImgOpsError, RgbImgBuf},
};

/// Stateless JPEG encoder. Every frame of a run is encoded with the same settings, so the size
/// estimate and the real output agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEncoder {
    quality: u8,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl FrameEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    #[cfg(test)]
    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn encode(&self, frame: &RgbImgBuf) -> Result<Vec<u8>, ImgOpsError> {
        encode_jpeg(frame, self.quality)
    }

    pub fn write(bytes: &[u8], path: &Path) -> std::io::Result<()> {
        std::fs::write(path, bytes)
    }

    pub fn encode_and_write(&self, job: &SaveJob) -> Result<SavedImage, EncodeWriteError> {
        let save_index = job.save_index;

        let bytes = self
            .encode(job.frame.image())
            .map_err(|source| EncodeWriteError::Encode { save_index, source })?;

        Self::write(&bytes, &job.dest_path).map_err(|source| EncodeWriteError::Write {
            save_index,
            path: job.dest_path.clone(),
            source,
        })?;

        Ok(SavedImage {
            save_index,
            decode_index: job.frame.index(),
            path: job.dest_path.clone(),
            bytes_written: bytes.len() as u64,
        })
    }
}

/// A frame which passed the near-duplicate filter, along with where it will be written.
#[derive(Debug, Clone)]
pub struct SaveJob {
    pub save_index: u64,
    pub frame: Frame,
    pub dest_path: PathBuf,
}

impl SaveJob {
    pub fn new(save_index: u64, frame: Frame, output_dir: &Path) -> Self {
        Self {
            save_index,
            frame,
            dest_path: output_dir.join(image_file_name(save_index)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub save_index: u64,
    pub decode_index: u64,
    pub path: PathBuf,
    pub bytes_written: u64,
}
