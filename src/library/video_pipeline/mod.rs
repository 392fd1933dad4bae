mod encode_stage;
mod pipeline;
mod pipeline_result;
pub mod size_estimator;


pub use pipeline::{run_video, video_name};
pub use pipeline_result::PipelineResult;

#[cfg(test)]
pub use pipeline_result::ExtractionStats;
