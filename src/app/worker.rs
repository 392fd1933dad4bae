use std::io::Write;

use crate::{
    app::{AppError, WorkerCfg},
    library::{decoding::DecoderFactory, run_video, PipelineCfg, VideoFailure, WorkerReport},
};

/// Runs a single video for the orchestrator and writes the report it waits for to `out`, which is
/// stdout in a real worker. Logs go to stderr as usual, so `out` carries nothing but the report.
pub fn run_worker<F, W>(factory: &F, worker_cfg: &WorkerCfg, pipeline_cfg: &PipelineCfg, out: W) -> Result<WorkerReport, AppError>
where
    F: DecoderFactory,
    W: Write,
{
    let result = run_video(factory, &worker_cfg.src_path, &worker_cfg.output_dir, pipeline_cfg).map_err(VideoFailure::from);
    let report = WorkerReport::from(result);

    write_report(&report, out)?;

    Ok(report)
}

pub fn write_report<W: Write>(report: &WorkerReport, mut out: W) -> Result<(), AppError> {
    serde_json::to_writer(&mut out, report).map_err(|e| AppError::WorkerReport(e.into()))?;
    writeln!(out).map_err(AppError::WorkerReport)?;
    out.flush().map_err(AppError::WorkerReport)
}
