use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use super::{
    encode_stage::EncodeStage,
    pipeline_result::{ExtractionStats, PipelineResult},
    size_estimator,
};
use crate::library::{
    decoding::{DecoderFactory, DecoderSession, Frame, SessionGuard, VideoMetadata},
    errors::PipelineError,
    frame_encoder::{FrameEncoder, SaveJob},
    frame_filter::NearDuplicateFilter,
    library_cfg::PipelineCfg,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Created,
    Opened,
    Sampling,
    Draining,
    Closed,
}

/// Turns one video into a directory of keyframes.
///
/// Frames are read by a single reader, sampled every `frame_interval` frames and collected into
/// batches. Each batch is run through the near-duplicate filter on the calling thread in decode
/// order, and only the accepted frames are handed to the encode pool.
pub struct VideoPipeline<S: DecoderSession> {
    src_path: PathBuf,
    output_dir: PathBuf,
    cfg: PipelineCfg,
    encoder: FrameEncoder,
    filter: Mutex<NearDuplicateFilter>,
    session: Option<SessionGuard<S>>,
    state: PipelineState,
}

impl<S: DecoderSession> VideoPipeline<S> {
    pub fn new(src_path: impl AsRef<Path>, output_dir: impl AsRef<Path>, cfg: PipelineCfg) -> Result<Self, PipelineError> {
        cfg.validate()?;
        let filter = NearDuplicateFilter::new(cfg.similarity_threshold)?;

        Ok(Self {
            src_path: src_path.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            encoder: FrameEncoder::new(cfg.jpeg_quality),
            cfg,
            filter: Mutex::new(filter),
            session: None,
            state: PipelineState::Created,
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Open the source video and prepare the output directory. The directory is only created once
    /// the video is known to be readable.
    pub fn open<F>(&mut self, factory: &F) -> Result<VideoMetadata, PipelineError>
    where
        F: DecoderFactory<Session = S>,
    {
        let session = factory
            .open(&self.src_path)
            .map_err(|source| PipelineError::SourceUnreadable {
                path: self.src_path.clone(),
                source,
            })?;
        let guard = SessionGuard::new(session);

        std::fs::create_dir_all(&self.output_dir).map_err(|source| PipelineError::CreateOutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        self.filter.lock().map_err(|_| PipelineError::FilterPoisoned)?.reset();

        let metadata = guard.metadata();
        self.session = Some(guard);
        self.state = PipelineState::Opened;

        Ok(metadata)
    }

    #[cfg(test)]
    pub fn metadata(&self) -> Result<VideoMetadata, PipelineError> {
        self.session
            .as_ref()
            .map(|session| session.metadata())
            .ok_or(PipelineError::NotOpen)
    }

    /// See `size_estimator::estimate_output_size`. Leaves the video rewound to its first frame.
    pub fn estimate_output_size(&mut self) -> Result<f64, PipelineError> {
        let session = self.session.as_mut().ok_or(PipelineError::NotOpen)?;
        size_estimator::estimate_output_size(&mut **session, self.cfg.frame_interval, &self.encoder)
    }

    /// Sample, filter and save the whole video, then release it.
    pub fn extract_frames(&mut self) -> Result<ExtractionStats, PipelineError> {
        let Self {
            src_path,
            output_dir,
            cfg,
            encoder,
            filter,
            session,
            state,
        } = self;

        let session = session.as_mut().ok_or(PipelineError::NotOpen)?;

        let mut stage = EncodeStage::new(cfg.encode_workers, *encoder)?;
        let mut stats = ExtractionStats::default();
        let mut next_save_index = 0;
        let batch_size = cfg.batch_size();
        let mut batch: Vec<Frame> = Vec::with_capacity(batch_size);

        *state = PipelineState::Sampling;
        loop {
            let frame = match session.read_next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        "Stopped reading {} after {} frames: {}",
                        src_path.display(),
                        stats.frames_decoded,
                        e
                    );
                    break;
                }
            };
            stats.frames_decoded += 1;

            if !cfg.is_candidate(frame.index()) {
                continue;
            }
            stats.candidates += 1;
            batch.push(frame.to_owned_frame());

            if batch.len() >= batch_size {
                dispatch_batch(&mut batch, filter, &mut stage, output_dir, &mut next_save_index, &mut stats)?;
            }
        }

        *state = PipelineState::Draining;
        if !batch.is_empty() {
            dispatch_batch(&mut batch, filter, &mut stage, output_dir, &mut next_save_index, &mut stats)?;
        }
        let totals = stage.finish();
        stats.saved_images = totals.saved;
        stats.failed_writes = totals.failed;
        stats.bytes_written = totals.bytes_written;

        self.close();

        Ok(stats)
    }

    /// Release the video. Safe to call at any point, and more than once.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.release();
        }
        if self.state != PipelineState::Closed {
            debug!("Closed {}", self.src_path.display());
            self.state = PipelineState::Closed;
        }
    }
}

//Runs the filter over a full batch in decode order, then hands the accepted frames to the encode
//stage. Near-duplicates never consume a save index.
fn dispatch_batch(
    batch: &mut Vec<Frame>,
    filter: &Mutex<NearDuplicateFilter>,
    stage: &mut EncodeStage,
    output_dir: &Path,
    next_save_index: &mut u64,
    stats: &mut ExtractionStats,
) -> Result<(), PipelineError> {
    let mut jobs = Vec::with_capacity(batch.len());
    {
        let mut filter = filter.lock().map_err(|_| PipelineError::FilterPoisoned)?;
        for frame in batch.drain(..) {
            let comparison = filter.compare_and_advance(frame.image())?;
            if comparison.is_near_duplicate {
                trace!(
                    "Dropping frame {} (similarity {:.4})",
                    frame.index(),
                    comparison.similarity
                );
                stats.near_duplicates += 1;
                continue;
            }

            jobs.push(SaveJob::new(*next_save_index, frame, output_dir));
            *next_save_index += 1;
        }
    }

    stage.dispatch(jobs);
    Ok(())
}

/// Run the whole pipeline for a single video: open, estimate, extract and close.
pub fn run_video<F>(
    factory: &F,
    src_path: &Path,
    output_dir: &Path,
    cfg: &PipelineCfg,
) -> Result<PipelineResult, PipelineError>
where
    F: DecoderFactory,
{
    let video_name = video_name(src_path);

    let mut pipeline: VideoPipeline<F::Session> = VideoPipeline::new(src_path, output_dir, cfg.clone())?;
    let metadata = pipeline.open(factory)?;
    info!(
        "{}: {} frames, {:.2} fps, {}x{}",
        video_name, metadata.total_frames, metadata.fps, metadata.width, metadata.height
    );

    let estimated_size_mb = pipeline.estimate_output_size()?;
    info!("{}: estimated output size {:.2} MB", video_name, estimated_size_mb);

    let stats = pipeline.extract_frames()?;
    pipeline.close();

    if stats.frames_decoded == 0 {
        warn!("{}: no frames could be decoded", video_name);
    }
    info!(
        "{}: saved {} of {} sampled frames ({} near-duplicates, {} failed writes)",
        video_name, stats.saved_images, stats.candidates, stats.near_duplicates, stats.failed_writes
    );

    Ok(PipelineResult::new(video_name, estimated_size_mb, stats))
}

pub fn video_name(src_path: &Path) -> String {
    src_path
        .file_stem()
        .unwrap_or_else(|| src_path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
