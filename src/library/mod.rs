pub mod batch;
pub mod decoding;
pub mod definitions;
pub mod errors;
pub mod frame_encoder;
pub mod frame_filter;
pub mod library_cfg;
mod utils;
pub mod video_pipeline;

//exports to app and tests
pub(crate) use utils::{ffmpeg_ops, img_ops};

pub use batch::{BatchOrchestrator, BatchSummary, InProcessRunner, SubprocessRunner, WorkerReport};
pub use decoding::FfmpegDecoder;
pub use errors::{BatchError, ConfigError, VideoFailure};
pub use library_cfg::{BatchCfg, PipelineCfg};
pub use video_pipeline::run_video;
