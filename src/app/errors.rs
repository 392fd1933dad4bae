use std::time::Duration;

use thiserror::Error;

use crate::library::{BatchError, ConfigError};

#[derive(Error, Debug)]
pub enum AppError {
    /////////////////////////////////
    // Argument parsing
    #[error(transparent)]
    ArgParse(#[from] clap::Error),

    #[error("could not parse provided {arg}: {value}")]
    ParseArg { arg: &'static str, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /////////////////////////////////
    // Interval prompt. Any of these cancel the run before a single video is touched.
    #[error("No frame interval was entered within {} seconds. Cancelled.", .0.as_secs())]
    PromptTimeout(Duration),

    #[error("Standard input was closed before a frame interval was entered. Cancelled.")]
    PromptClosed,

    #[error("Failed to read the frame interval from standard input")]
    PromptRead(#[source] std::io::Error),

    /////////////////////////////////
    // Batch processing
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Could not locate the running executable to start video workers")]
    CurrentExe(#[source] std::io::Error),

    #[error("Failed to send the worker report")]
    WorkerReport(#[source] std::io::Error),

    #[error(
        "Ffmpeg command not found. Keyframes cannot be extracted unless Ffmpeg is installed:
* Debian-based systems:
    # apt-get install ffmpeg
* Yum-based systems:
    # yum install ffmpeg
* Windows:
    1) Download the correct installer from <https://ffmpeg.org/download.html>
    2) run the installer and install ffmpeg to any directory
    3) add the directory into the PATH environment variable"
    )]
    FfmpegNotFound,
}

impl AppError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::PromptTimeout(_) | Self::PromptClosed)
    }
}
