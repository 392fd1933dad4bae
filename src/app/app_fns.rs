use std::{
    error::Error,
    io::{self, BufReader},
};

use byte_unit::Byte;

use super::app_cfg::AppCfg;
use crate::{
    app::*,
    library::{
        batch::{VideoJob, VideoRunner},
        ffmpeg_ops::ffmpeg_and_ffprobe_are_callable,
        BatchError, BatchOrchestrator, BatchSummary, FfmpegDecoder, InProcessRunner, PipelineCfg, SubprocessRunner,
    },
};

pub fn run_app() -> i32 {
    //Parse arguments and bail early if there is an error.
    let cfg = match arg_parse::parse_args() {
        Ok(cfg) => {
            configure_logs(cfg.output_cfg.verbosity);
            cfg
        }
        Err(fatal) => {
            //Errors are reported using TermLogger, which is configured from the argument parser.
            //But if a fatal error occurred during parsing the logger would not be configured when
            //we attempt to print the fatal error. So if a fatal error occurs, start the logger
            //before returning the error.
            configure_logs(ReportVerbosity::Verbose);
            print_fatal_err(&fatal, ReportVerbosity::Verbose);
            return 1;
        }
    };

    if let Some(worker_cfg) = &cfg.worker {
        let stdout = io::stdout();
        return match worker::run_worker(&FfmpegDecoder, worker_cfg, &cfg.pipeline_cfg, stdout.lock()) {
            Ok(_report) => 0,
            Err(fatal_error) => {
                print_fatal_err(&fatal_error, cfg.output_cfg.verbosity);
                1
            }
        };
    }

    match run_app_inner(&cfg) {
        Ok((summary, nonfatal_errs)) => {
            print_nonfatal_errs(nonfatal_errs);
            print_summary(&summary, &cfg);
            batch_exit_code(&summary)
        }
        Err(fatal_error) => {
            print_fatal_err(&fatal_error, cfg.output_cfg.verbosity);
            1
        }
    }
}

fn run_app_inner(cfg: &AppCfg) -> Result<(BatchSummary, Vec<AppError>), AppError> {
    //A missing or empty input directory is reported first.
    let batch = plan_batch(cfg)?;

    //Check that ffmpeg and ffprobe exist on the command line, and bail if not. Otherwise every
    //video would fail with the same error.
    if !ffmpeg_and_ffprobe_are_callable() {
        return Err(AppError::FfmpegNotFound);
    }

    let runner: Box<dyn VideoRunner> = if cfg.in_process {
        Box::new(InProcessRunner::new(FfmpegDecoder))
    } else {
        let exe = std::env::current_exe().map_err(AppError::CurrentExe)?;
        Box::new(SubprocessRunner::new(exe).with_args(cfg.output_cfg.verbosity.worker_args()))
    };

    let prompt_timeout = cfg.prompt_timeout;
    batch.run(cfg, runner.as_ref(), || {
        prompt::prompt_for_interval(BufReader::new(io::stdin()), prompt_timeout)
    })
}

/// The videos found in the input directory, not yet processed.
pub struct PlannedBatch {
    orchestrator: BatchOrchestrator,
    jobs: Vec<VideoJob>,
    search_errs: Vec<BatchError>,
}

/// Finds the videos to process and lists them. Fails before anything is written when the input
/// directory is missing or holds no videos.
pub fn plan_batch(cfg: &AppCfg) -> Result<PlannedBatch, AppError> {
    let orchestrator = BatchOrchestrator::new(cfg.batch_cfg.clone())?;
    let (jobs, search_errs) = orchestrator.plan()?;

    info!(
        "Found {} video files in {}:",
        jobs.len(),
        cfg.batch_cfg.input_dir.display()
    );
    for (i, job) in jobs.iter().enumerate() {
        info!("{}. {}", i + 1, job.src_path.display());
    }

    Ok(PlannedBatch {
        orchestrator,
        jobs,
        search_errs,
    })
}

impl PlannedBatch {
    /// Obtains the frame interval and runs every video. `ask_interval` is only called when no
    /// interval was given on the command line.
    pub fn run<R, P>(self, cfg: &AppCfg, runner: &R, ask_interval: P) -> Result<(BatchSummary, Vec<AppError>), AppError>
    where
        R: VideoRunner + ?Sized,
        P: FnOnce() -> Result<u64, AppError>,
    {
        let frame_interval = match cfg.interval {
            Some(frame_interval) => frame_interval,
            None => ask_interval()?,
        };

        let pipeline_cfg = PipelineCfg {
            frame_interval,
            ..cfg.pipeline_cfg.clone()
        };
        pipeline_cfg.validate()?;

        let summary = self.orchestrator.run(runner, &self.jobs, &pipeline_cfg)?;

        let nonfatal_errs = self.search_errs.into_iter().map(AppError::from).collect();

        Ok((summary, nonfatal_errs))
    }
}

/// 0 when every video succeeded, 2 when the run completed but some videos failed.
pub fn batch_exit_code(summary: &BatchSummary) -> i32 {
    if summary.all_succeeded() {
        0
    } else {
        2
    }
}

fn print_summary(summary: &BatchSummary, cfg: &AppCfg) {
    for (job, failure) in summary.failures() {
        warn!("{}: {}", job.src_path.display(), failure);
    }

    let num_failed = summary.failures().count();
    let bytes_written = Byte::from_bytes(summary.total_bytes_written() as u128).get_appropriate_unit(false);

    println!();
    println!("Summary:");
    println!(
        "Videos processed: {} ({} failed)",
        summary.num_videos(),
        num_failed
    );
    println!("Images saved: {}", summary.total_saved());
    if summary.total_failed_writes() > 0 {
        println!("Images which failed to save: {}", summary.total_failed_writes());
    }
    println!("Estimated output size: {:.2} MB", summary.total_estimated_mb());
    println!("Written: {}", bytes_written);
    println!(
        "Images were saved to a folder per video in: {}",
        cfg.batch_cfg.output_dir.display()
    );
}

fn print_fatal_err(fatal_err: &AppError, verbosity: ReportVerbosity) {
    //cancellation is reported without its causes.
    if fatal_err.is_cancellation() {
        warn!(target: "app-errorlog", "{}", fatal_err);
        return;
    }

    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

fn print_nonfatal_errs(nonfatal_errs: Vec<AppError>) {
    for err in nonfatal_errs {
        warn!("{}", err);
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    //logs always go to stderr: worker processes use stdout for their report.
    if let Err(e) = TermLogger::init(min_loglevel, cfg.build(), TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Failed to start logging: {}", e);
    }
}
