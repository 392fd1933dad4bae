use std::{
    any::Any,
    ffi::OsString,
    panic::{catch_unwind, AssertUnwindSafe},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use serde::{Deserialize, Serialize};

use super::VideoJob;
use crate::library::{
    decoding::DecoderFactory, errors::VideoFailure, library_cfg::PipelineCfg, video_pipeline::run_video,
    video_pipeline::PipelineResult,
};

/// Runs the pipeline for one video in isolation from its siblings.
pub trait VideoRunner: Sync {
    fn run(&self, job: &VideoJob, cfg: &PipelineCfg) -> Result<PipelineResult, VideoFailure>;
}

/// The single line a worker process prints on stdout before exiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerReport {
    Finished(PipelineResult),
    Failed(VideoFailure),
}

impl From<Result<PipelineResult, VideoFailure>> for WorkerReport {
    fn from(result: Result<PipelineResult, VideoFailure>) -> Self {
        match result {
            Ok(result) => Self::Finished(result),
            Err(failure) => Self::Failed(failure),
        }
    }
}

impl From<WorkerReport> for Result<PipelineResult, VideoFailure> {
    fn from(report: WorkerReport) -> Self {
        match report {
            WorkerReport::Finished(result) => Ok(result),
            WorkerReport::Failed(failure) => Err(failure),
        }
    }
}

/// Runs each video on the calling thread. A panic while processing a video is caught and reported
/// as a failure of that video only.
pub struct InProcessRunner<F> {
    factory: F,
}

impl<F: DecoderFactory> InProcessRunner<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F: DecoderFactory> VideoRunner for InProcessRunner<F> {
    fn run(&self, job: &VideoJob, cfg: &PipelineCfg) -> Result<PipelineResult, VideoFailure> {
        let factory = &self.factory;
        match catch_unwind(AssertUnwindSafe(|| run_video(factory, &job.src_path, &job.output_dir, cfg))) {
            Ok(result) => result.map_err(VideoFailure::from),
            Err(panic) => Err(VideoFailure::Panicked(panic_message(panic.as_ref()))),
        }
    }
}

pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs each video in a fresh copy of this executable, started in worker mode. A worker which dies
/// without printing its report is a failed video; nothing it did can affect the other workers.
pub struct SubprocessRunner {
    exe: PathBuf,
    extra_args: Vec<String>,
}

impl SubprocessRunner {
    pub fn new(exe: impl AsRef<Path>) -> Self {
        Self {
            exe: exe.as_ref().to_path_buf(),
            extra_args: vec![],
        }
    }

    /// Arguments passed to every worker in addition to the job itself, such as the log verbosity.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Paths are passed through as they are, so file names which are not valid UTF-8 reach the
    /// worker unchanged.
    pub fn worker_args(&self, job: &VideoJob, cfg: &PipelineCfg) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--worker-video".into(),
            job.src_path.as_os_str().to_owned(),
            "--worker-output".into(),
            job.output_dir.as_os_str().to_owned(),
            "--interval".into(),
            cfg.frame_interval.to_string().into(),
            "--threshold".into(),
            cfg.similarity_threshold.to_string().into(),
            "--encode-workers".into(),
            cfg.encode_workers.to_string().into(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

impl VideoRunner for SubprocessRunner {
    fn run(&self, job: &VideoJob, cfg: &PipelineCfg) -> Result<PipelineResult, VideoFailure> {
        let output = Command::new(&self.exe)
            .args(self.worker_args(job, cfg))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| VideoFailure::SpawnFailed(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_worker_report(&stdout) {
            Some(Ok(report)) => report.into(),
            Some(Err(e)) => Err(VideoFailure::Protocol(e.to_string())),
            None => Err(VideoFailure::WorkerCrashed(output.status.to_string())),
        }
    }
}

/// The report is the last non-empty line of the worker's stdout.
pub fn parse_worker_report(stdout: &str) -> Option<serde_json::Result<WorkerReport>> {
    stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line.trim()))
}
