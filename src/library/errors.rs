use std::{fmt::Debug, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{decoding::DecodeError, img_ops::ImgOpsError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Frame interval must be a positive integer, got: {0}")]
    InvalidInterval(String),

    #[error("Similarity threshold must be greater than 0 and at most 1, got: {0}")]
    InvalidThreshold(f64),

    #[error("Number of encode workers must be at least 1")]
    NoEncodeWorkers,

    #[error("Number of parallel videos must be at least 1")]
    NoVideoJobs,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Cannot compare a {0}x{1} fingerprint with a {2}x{3} fingerprint")]
    FingerprintMismatch(u32, u32, u32, u32),
}

#[derive(Error, Debug)]
pub enum EncodeWriteError {
    #[error("Failed to encode image {save_index} as jpeg: {source}")]
    Encode {
        save_index: u64,
        #[source]
        source: ImgOpsError,
    },

    #[error("Failed to write image {save_index} to {}: {source}", .path.display())]
    Write {
        save_index: u64,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encode worker panicked while saving image {0}")]
    Panicked(u64),
}

impl EncodeWriteError {
    pub fn save_index(&self) -> u64 {
        match self {
            Self::Encode { save_index, .. } | Self::Write { save_index, .. } => *save_index,
            Self::Panicked(save_index) => *save_index,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No video is open")]
    NotOpen,

    #[error("Could not open video {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Failed to encode frame for size estimate: {0}")]
    Estimate(#[source] ImgOpsError),

    #[error("Frame filter lock was poisoned by a panicking thread")]
    FilterPoisoned,

    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start encode workers: {0}")]
    EncodePool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input directory not found: {}", .0.display())]
    InputDirNotFound(PathBuf),

    #[error("No video files found in input directory: {}", .0.display())]
    NoVideosFound(PathBuf),

    #[error("Video file search error: {0}")]
    FileSearch(#[from] walkdir::Error),

    #[error("Video file has no usable name: {}", .0.display())]
    UnnamedVideo(PathBuf),

    #[error("Failed to start video workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

//Failures of a single video, as reported to the orchestrator. These cross the worker process
//boundary, so they only carry the rendered message of the underlying error.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VideoFailure {
    #[error("{0}")]
    Pipeline(String),

    #[error("Video worker panicked: {0}")]
    Panicked(String),

    #[error("Video worker process failed to start: {0}")]
    SpawnFailed(String),

    #[error("Video worker process exited without a report ({0})")]
    WorkerCrashed(String),

    #[error("Could not understand video worker report: {0}")]
    Protocol(String),
}

impl From<PipelineError> for VideoFailure {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e.to_string())
    }
}
