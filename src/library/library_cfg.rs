use std::path::PathBuf;

use super::{definitions::*, errors::ConfigError};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineCfg {
    pub frame_interval: u64,
    pub similarity_threshold: f64,
    pub encode_workers: usize,
    pub jpeg_quality: u8,
}

impl PipelineCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval < 1 {
            return Err(ConfigError::InvalidInterval(self.frame_interval.to_string()));
        }

        //NaN fails both comparisons, so it is rejected here too.
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(self.similarity_threshold));
        }

        if self.encode_workers < 1 {
            return Err(ConfigError::NoEncodeWorkers);
        }

        Ok(())
    }

    pub fn batch_size(&self) -> usize {
        BATCH_FRAMES_PER_WORKER * self.encode_workers
    }

    pub fn is_candidate(&self, frame_index: u64) -> bool {
        frame_index % self.frame_interval == 0
    }
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            encode_workers: DEFAULT_ENCODE_WORKERS,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchCfg {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub jobs: usize,
}

impl BatchCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs < 1 {
            return Err(ConfigError::NoVideoJobs);
        }
        Ok(())
    }
}

impl Default for BatchCfg {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            jobs: num_cpus::get(),
        }
    }
}
