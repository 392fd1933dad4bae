//End-to-end runs of the batch, from discovery through the interval prompt to the images on disk,
//using the in-memory decoder in place of ffmpeg.

use std::{
    fs,
    io::{BufReader, Cursor, Read},
    path::Path,
    sync::Arc,
    thread,
    time::Duration,
};

use crate::{
    app::{batch_exit_code, plan_batch, prompt::prompt_for_interval, AppCfg, AppError, OutputCfg, ReportVerbosity},
    library::{
        decoding::memory_session::{distinct_frames, MemoryDecoder, MemoryVideo},
        BatchCfg, BatchError, BatchSummary, InProcessRunner, PipelineCfg, VideoFailure,
    },
};

struct StalledReader;

impl Read for StalledReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        thread::sleep(Duration::from_secs(3600));
        Ok(0)
    }
}

fn app_cfg(root: &Path, interval: Option<u64>) -> AppCfg {
    AppCfg {
        batch_cfg: BatchCfg {
            input_dir: root.join("input"),
            output_dir: root.join("output"),
            jobs: 2,
        },
        pipeline_cfg: PipelineCfg::default(),
        interval,
        prompt_timeout: Duration::from_millis(200),
        in_process: true,
        output_cfg: OutputCfg {
            verbosity: ReportVerbosity::Quiet,
        },
        worker: None,
    }
}

fn touch_videos(input_dir: &Path, names: &[&str]) {
    fs::create_dir_all(input_dir).unwrap();
    for name in names {
        fs::write(input_dir.join(name), b"").unwrap();
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

fn run_batch<P>(
    cfg: &AppCfg,
    runner: &InProcessRunner<MemoryDecoder>,
    ask_interval: P,
) -> Result<(BatchSummary, Vec<AppError>), AppError>
where
    P: FnOnce() -> Result<u64, AppError>,
{
    plan_batch(cfg)?.run(cfg, runner, ask_interval)
}

fn no_prompt() -> Result<u64, AppError> {
    panic!("the interval prompt should not have been shown")
}

#[test]
//an empty input directory stops the run before the prompt, and nothing is written.
fn test_empty_input_dir() {
    let root = tempfile::tempdir().unwrap();
    let cfg = app_cfg(root.path(), None);
    fs::create_dir_all(&cfg.batch_cfg.input_dir).unwrap();
    let runner = InProcessRunner::new(MemoryDecoder::new());

    let err = run_batch(&cfg, &runner, no_prompt).unwrap_err();

    assert!(matches!(err, AppError::Batch(BatchError::NoVideosFound(_))));
    assert!(!cfg.batch_cfg.output_dir.exists());
}

#[test]
fn test_missing_input_dir() {
    let root = tempfile::tempdir().unwrap();
    let cfg = app_cfg(root.path(), None);
    let runner = InProcessRunner::new(MemoryDecoder::new());

    let err = run_batch(&cfg, &runner, no_prompt).unwrap_err();

    assert!(matches!(err, AppError::Batch(BatchError::InputDirNotFound(_))));
    assert!(!cfg.batch_cfg.output_dir.exists());
}

#[test]
//nobody answers the prompt, so the run is cancelled without touching a single video.
fn test_prompt_timeout_cancels_run() {
    let root = tempfile::tempdir().unwrap();
    let cfg = app_cfg(root.path(), None);
    touch_videos(&cfg.batch_cfg.input_dir, &["a.mp4"]);
    let decoder = MemoryDecoder::new().with_frames(cfg.batch_cfg.input_dir.join("a.mp4"), distinct_frames(5));
    let runner = InProcessRunner::new(decoder);

    let timeout = cfg.prompt_timeout;
    let err = run_batch(&cfg, &runner, || prompt_for_interval(BufReader::new(StalledReader), timeout)).unwrap_err();

    assert!(matches!(err, AppError::PromptTimeout(_)));
    assert!(err.is_cancellation());
    assert!(!cfg.batch_cfg.output_dir.exists());
}

#[test]
fn test_closed_stdin_cancels_run() {
    let root = tempfile::tempdir().unwrap();
    let cfg = app_cfg(root.path(), None);
    touch_videos(&cfg.batch_cfg.input_dir, &["a.mp4"]);
    let runner = InProcessRunner::new(MemoryDecoder::new());

    let err = run_batch(&cfg, &runner, || prompt_for_interval(Cursor::new(vec![]), Duration::from_secs(5))).unwrap_err();

    assert!(matches!(err, AppError::PromptClosed));
    assert!(!cfg.batch_cfg.output_dir.exists());
}

#[test]
fn test_invalid_interval_aborts_before_processing() {
    let root = tempfile::tempdir().unwrap();
    let cfg = app_cfg(root.path(), None);
    touch_videos(&cfg.batch_cfg.input_dir, &["a.mp4"]);
    let runner = InProcessRunner::new(MemoryDecoder::new());

    let err = run_batch(&cfg, &runner, || {
        prompt_for_interval(Cursor::new(b"0\n".to_vec()), Duration::from_secs(5))
    })
    .unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert!(!cfg.batch_cfg.output_dir.exists());
}

#[test]
//the interval typed at the prompt applies to every video.
fn test_prompted_interval_applies_to_all_videos() {
    let root = tempfile::tempdir().unwrap();
    let cfg = app_cfg(root.path(), None);
    let input_dir = &cfg.batch_cfg.input_dir;
    touch_videos(input_dir, &["first.mp4", "second.MOV", "notes.txt"]);

    let mut second_frames = distinct_frames(9);
    second_frames[2] = second_frames[0].clone();
    let decoder = MemoryDecoder::new()
        .with_frames(input_dir.join("first.mp4"), distinct_frames(10))
        .with_frames(input_dir.join("second.MOV"), second_frames);
    let runner = InProcessRunner::new(decoder);

    let (summary, nonfatal_errs) = run_batch(&cfg, &runner, || {
        prompt_for_interval(Cursor::new(b"2\n".to_vec()), Duration::from_secs(5))
    })
    .unwrap();

    assert!(nonfatal_errs.is_empty());
    assert_eq!(batch_exit_code(&summary), 0);
    assert_eq!(summary.num_videos(), 2);

    //first: frames 0, 2, 4, 6, 8. second: candidates 0, 2, 4, 6, 8 where 2 repeats 0.
    assert_eq!(count_files(&cfg.batch_cfg.output_dir.join("first")), 5);
    assert_eq!(count_files(&cfg.batch_cfg.output_dir.join("second")), 4);
    assert_eq!(summary.total_saved(), 9);
    assert!(!cfg.batch_cfg.output_dir.join("notes").exists());
}

#[test]
fn test_interval_from_command_line_skips_prompt() {
    let root = tempfile::tempdir().unwrap();
    let cfg = app_cfg(root.path(), Some(3));
    touch_videos(&cfg.batch_cfg.input_dir, &["a.mkv"]);
    let decoder = MemoryDecoder::new().with_frames(cfg.batch_cfg.input_dir.join("a.mkv"), distinct_frames(7));
    let runner = InProcessRunner::new(decoder);

    let (summary, _) = run_batch(&cfg, &runner, no_prompt).unwrap();

    //frames 0, 3 and 6.
    assert_eq!(summary.total_saved(), 3);
    assert_eq!(count_files(&cfg.batch_cfg.output_dir.join("a")), 3);
}

#[test]
//a video whose decoder crashes is reported, the others complete, and the exit code says so.
fn test_failed_video_sets_exit_code() {
    let root = tempfile::tempdir().unwrap();
    let cfg = app_cfg(root.path(), Some(1));
    let input_dir = &cfg.batch_cfg.input_dir;
    touch_videos(input_dir, &["good.mp4", "crash.mp4", "broken.mp4"]);

    let decoder = MemoryDecoder::new()
        .with_frames(input_dir.join("good.mp4"), distinct_frames(4))
        .with_video(input_dir.join("crash.mp4"), MemoryVideo::PanicsOnOpen)
        .with_video(
            input_dir.join("broken.mp4"),
            MemoryVideo::FailsAt(Arc::new(distinct_frames(6)), 3),
        );
    let runner = InProcessRunner::new(decoder);

    let (summary, _) = run_batch(&cfg, &runner, no_prompt).unwrap();

    assert_eq!(batch_exit_code(&summary), 2);
    let failures: Vec<_> = summary.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.video_name, "crash");
    assert!(matches!(failures[0].1, VideoFailure::Panicked(_)));

    //a decode error part way through still keeps what came before it.
    assert_eq!(count_files(&cfg.batch_cfg.output_dir.join("broken")), 3);
    assert_eq!(count_files(&cfg.batch_cfg.output_dir.join("good")), 4);
    assert_eq!(summary.total_saved(), 7);
}
