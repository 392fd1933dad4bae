use std::{
    collections::{HashMap, HashSet},
    ffi::OsString,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use super::{runner::VideoRunner, video_files::enumerate_videos};
use crate::library::{
    errors::{BatchError, ConfigError, VideoFailure},
    library_cfg::{BatchCfg, PipelineCfg},
    video_pipeline::{video_name, PipelineResult},
};

/// One video to process, and the directory its images go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub video_name: String,
    pub src_path: PathBuf,
    pub output_dir: PathBuf,
}

impl VideoJob {
    pub fn new(src_path: impl AsRef<Path>, output_root: impl AsRef<Path>) -> Result<Self, BatchError> {
        let src_path = src_path.as_ref();
        let stem = src_path
            .file_stem()
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| BatchError::UnnamedVideo(src_path.to_path_buf()))?;

        Ok(Self {
            video_name: video_name(src_path),
            src_path: src_path.to_path_buf(),
            output_dir: output_root.as_ref().join(stem),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoOutcome {
    pub job: VideoJob,
    pub result: Result<PipelineResult, VideoFailure>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub outcomes: Vec<VideoOutcome>,
}

impl BatchSummary {
    pub fn num_videos(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successes(&self) -> impl Iterator<Item = &PipelineResult> {
        self.outcomes.iter().filter_map(|outcome| outcome.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&VideoJob, &VideoFailure)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|failure| (&outcome.job, failure)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn total_saved(&self) -> u64 {
        self.successes().map(|result| result.saved_images).sum()
    }

    pub fn total_estimated_mb(&self) -> f64 {
        self.successes().map(|result| result.estimated_size_mb).sum()
    }

    pub fn total_bytes_written(&self) -> u64 {
        self.successes().map(|result| result.bytes_written).sum()
    }

    pub fn total_failed_writes(&self) -> u64 {
        self.successes().map(|result| result.failed_writes).sum()
    }
}

/// Finds the videos in the input directory and runs one pipeline per video on a fixed number of
/// workers, waiting for all of them before returning.
pub struct BatchOrchestrator {
    cfg: BatchCfg,
}

impl BatchOrchestrator {
    pub fn new(cfg: BatchCfg) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Builds one job per video. Fails if there is nothing to do, so that no output directories
    /// are created for an empty run.
    pub fn plan(&self) -> Result<(Vec<VideoJob>, Vec<BatchError>), BatchError> {
        let (video_paths, mut errs) = enumerate_videos(&self.cfg.input_dir)?;

        if video_paths.is_empty() {
            return Err(BatchError::NoVideosFound(self.cfg.input_dir.clone()));
        }

        let mut jobs = vec![];
        for src_path in video_paths {
            match VideoJob::new(&src_path, &self.cfg.output_dir) {
                Ok(job) => jobs.push(job),
                Err(e) => errs.push(e),
            }
        }

        disambiguate_output_dirs(&mut jobs);

        Ok((jobs, errs))
    }

    pub fn run<R>(&self, runner: &R, jobs: &[VideoJob], pipeline_cfg: &PipelineCfg) -> Result<BatchSummary, BatchError>
    where
        R: VideoRunner + ?Sized,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.cfg.jobs)
            .thread_name(|i| format!("video-worker-{}", i))
            .build()?;

        info!("Processing {} videos on {} workers", jobs.len(), self.cfg.jobs);

        let outcomes = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let result = runner.run(job, pipeline_cfg);
                    match &result {
                        Ok(result) => info!("Finished {}: {} images saved", job.video_name, result.saved_images),
                        Err(failure) => error!("Failed {}: {}", job.video_name, failure),
                    }
                    VideoOutcome {
                        job: job.clone(),
                        result,
                    }
                })
                .collect::<Vec<_>>()
        });

        Ok(BatchSummary { outcomes })
    }
}

//Videos which differ only by extension (clip.mp4, clip.mkv) would share an output directory, so
//those are named after the whole file name instead. The new names can collide again
//(clip.mp4 against clip.mp4.avi), and any directory still shared after that gets a numeric suffix.
fn disambiguate_output_dirs(jobs: &mut [VideoJob]) {
    let stem_counts = output_dir_counts(jobs);
    for job in jobs.iter_mut() {
        if stem_counts.get(&job.output_dir).copied().unwrap_or_default() > 1 {
            if let (Some(parent), Some(file_name)) = (job.output_dir.parent(), job.src_path.file_name()) {
                job.output_dir = parent.join(file_name);
            }
        }
    }

    let dir_counts = output_dir_counts(jobs);
    let mut taken: HashSet<PathBuf> = dir_counts
        .iter()
        .filter(|(_, count)| **count == 1)
        .map(|(dir, _)| dir.clone())
        .collect();

    for job in jobs.iter_mut() {
        if dir_counts.get(&job.output_dir).copied().unwrap_or_default() <= 1 {
            continue;
        }

        let mut candidate = job.output_dir.clone();
        let mut suffix = 1;
        while !taken.insert(candidate.clone()) {
            suffix += 1;
            candidate = with_suffix(&job.output_dir, suffix);
        }
        job.output_dir = candidate;
    }
}

fn output_dir_counts(jobs: &[VideoJob]) -> HashMap<PathBuf, usize> {
    let mut counts: HashMap<PathBuf, usize> = HashMap::new();
    for job in jobs {
        *counts.entry(job.output_dir.clone()).or_default() += 1;
    }
    counts
}

fn with_suffix(dir: &Path, suffix: usize) -> PathBuf {
    let mut name = dir.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!("_{}", suffix));
    dir.with_file_name(name)
}
