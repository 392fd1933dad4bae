use std::{ffi::OsString, path::PathBuf, str::FromStr, time::Duration};

use super::prompt::parse_interval;
use crate::{
    app::*,
    library::{
        definitions::{
            DEFAULT_ENCODE_WORKERS, DEFAULT_FRAME_INTERVAL, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR,
            DEFAULT_PROMPT_TIMEOUT, DEFAULT_SIMILARITY_THRESHOLD,
        },
        BatchCfg, PipelineCfg,
    },
};

/// Parses the process arguments. Exits the process for `--help`, `--version` and usage errors, as
/// clap would.
pub fn parse_args() -> Result<AppCfg, AppError> {
    match parse_args_from(std::env::args_os()) {
        Err(AppError::ArgParse(e)) => e.exit(),
        other => other,
    }
}

pub fn parse_args_from<I, T>(args: I) -> Result<AppCfg, AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let input_dir = "Input directory";
    let output_dir = "Output directory";
    let interval = "Frame interval";
    let prompt_timeout = "Prompt timeout";
    let threshold = "Similarity threshold";
    let encode_workers = "Encode workers";
    let jobs = "Parallel videos";
    let in_process = "In process";
    let quiet = "Quiet";
    let verbose = "Verbose";
    let worker_video = "Worker video";
    let worker_output = "Worker output";

    let default_prompt_timeout_string = format!("{}", DEFAULT_PROMPT_TIMEOUT.as_secs());
    let default_threshold_string = format!("{}", DEFAULT_SIMILARITY_THRESHOLD);
    let default_encode_workers_string = format!("{}", DEFAULT_ENCODE_WORKERS);

    //args are not added through method chaining because this appears to break rustfmt.
    let mut clap_app = clap::App::new("Video keyframe extractor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts visually distinct keyframes from every video in a directory");

    clap_app = clap_app.arg(
        clap::Arg::with_name(input_dir)
            .long("input-dir")
            .takes_value(true)
            .value_name("DIR")
            .default_value(DEFAULT_INPUT_DIR)
            .help("Directory containing the videos to process. Subdirectories are not searched.")
            .display_order(1),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(output_dir)
            .long("output-dir")
            .takes_value(true)
            .value_name("DIR")
            .default_value(DEFAULT_OUTPUT_DIR)
            .help("Images for each video are written to a subdirectory of this directory, named after the video.")
            .display_order(2),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(interval)
            .long("interval")
            .takes_value(true)
            .value_name("N")
            .help("Only consider every Nth frame. If not given, the interval is asked for interactively.")
            .display_order(3),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(prompt_timeout)
            .long("prompt-timeout")
            .takes_value(true)
            .value_name("SECS")
            .default_value(&default_prompt_timeout_string)
            .help("Cancel the run if no frame interval is entered within this many seconds"),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(threshold)
            .long("threshold")
            .takes_value(true)
            .default_value(&default_threshold_string)
            .help("Frames at least this similar (0 to 1) to the previously compared frame are dropped"),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(encode_workers)
            .long("encode-workers")
            .takes_value(true)
            .value_name("N")
            .default_value(&default_encode_workers_string)
            .help("Number of threads encoding and writing images for each video"),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(jobs)
            .long("jobs")
            .short("j")
            .takes_value(true)
            .value_name("N")
            .help("Number of videos processed at the same time. Defaults to the number of CPUs."),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(in_process)
            .long("in-process")
            .help("Process videos on threads of this process instead of in separate worker processes"),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(quiet)
            .long("quiet")
            .short("q")
            .help("Quiet verbosity: Only print errors, warnings and the summary")
            .conflicts_with(verbose),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(verbose)
            .long("verbose")
            .short("v")
            .help("Print per-frame decisions and the causes of errors"),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(worker_video)
            .long("worker-video")
            .takes_value(true)
            .hidden(true)
            .requires(worker_output),
    );

    clap_app = clap_app.arg(
        clap::Arg::with_name(worker_output)
            .long("worker-output")
            .takes_value(true)
            .hidden(true)
            .requires(worker_video),
    );

    let matches = clap_app.get_matches_from_safe(args)?;

    let interval = match matches.value_of(interval) {
        Some(interval) => Some(parse_interval(interval)?),
        None => None,
    };

    let prompt_timeout = Duration::from_secs(parse_value(&matches, prompt_timeout, "prompt timeout")?);

    let pipeline_cfg = PipelineCfg {
        frame_interval: interval.unwrap_or(DEFAULT_FRAME_INTERVAL),
        similarity_threshold: parse_value(&matches, threshold, "similarity threshold")?,
        encode_workers: parse_value(&matches, encode_workers, "number of encode workers")?,
        ..PipelineCfg::default()
    };

    let mut batch_cfg = BatchCfg {
        input_dir: PathBuf::from(matches.value_of_os(input_dir).unwrap_or_else(|| unreachable!())),
        output_dir: PathBuf::from(matches.value_of_os(output_dir).unwrap_or_else(|| unreachable!())),
        ..BatchCfg::default()
    };
    if matches.is_present(jobs) {
        batch_cfg.jobs = parse_value(&matches, jobs, "number of parallel videos")?;
    }

    //reject bad values now rather than after the prompt.
    pipeline_cfg.validate()?;
    batch_cfg.validate()?;

    let verbosity = if matches.is_present(quiet) {
        ReportVerbosity::Quiet
    } else if matches.is_present(verbose) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let worker = match (matches.value_of_os(worker_video), matches.value_of_os(worker_output)) {
        (Some(src_path), Some(output_dir)) => Some(WorkerCfg {
            src_path: PathBuf::from(src_path),
            output_dir: PathBuf::from(output_dir),
        }),
        _ => None,
    };

    let ret = AppCfg {
        batch_cfg,
        pipeline_cfg,

        interval,
        prompt_timeout,
        in_process: matches.is_present(in_process),

        output_cfg: OutputCfg { verbosity },
        worker,
    };

    Ok(ret)
}

fn parse_value<T: FromStr>(matches: &clap::ArgMatches, name: &str, description: &'static str) -> Result<T, AppError> {
    let value = matches.value_of(name).unwrap_or_default();
    value.parse().map_err(|_| AppError::ParseArg {
        arg: description,
        value: value.to_string(),
    })
}
