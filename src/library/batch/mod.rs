mod orchestrator;
mod runner;
mod video_files;


pub use orchestrator::{BatchOrchestrator, BatchSummary, VideoJob};
pub use runner::{InProcessRunner, SubprocessRunner, VideoRunner, WorkerReport};

#[cfg(test)]
pub use runner::parse_worker_report;
