use serde::{Deserialize, Serialize};

/// Counters collected while sampling one video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub frames_decoded: u64,
    pub candidates: u64,
    pub near_duplicates: u64,
    pub saved_images: u64,
    pub failed_writes: u64,
    pub bytes_written: u64,
}

impl ExtractionStats {
    /// Frames that passed the filter, whether or not they were written successfully.
    #[cfg(test)]
    pub fn accepted(&self) -> u64 {
        self.saved_images + self.failed_writes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub video_name: String,
    pub saved_images: u64,
    pub estimated_size_mb: f64,
    pub frames_decoded: u64,
    pub candidates: u64,
    pub near_duplicates: u64,
    pub failed_writes: u64,
    pub bytes_written: u64,
}

impl PipelineResult {
    pub fn new(video_name: impl Into<String>, estimated_size_mb: f64, stats: ExtractionStats) -> Self {
        Self {
            video_name: video_name.into(),
            saved_images: stats.saved_images,
            estimated_size_mb,
            frames_decoded: stats.frames_decoded,
            candidates: stats.candidates,
            near_duplicates: stats.near_duplicates,
            failed_writes: stats.failed_writes,
            bytes_written: stats.bytes_written,
        }
    }
}
