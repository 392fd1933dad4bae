use std::{
    ffi::OsString,
    path::Path,
    process::{Child, Command, Stdio},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use FfmpegErrorKind::*;

use crate::library::decoding::VideoMetadata;

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FfmpegErrorKind {
    #[error("Error internal to Ffmpeg: {0}")]
    FfmpegFailure(String),

    #[error("Error external to Ffmpeg: {0}")]
    OtherFailure(String),

    #[error("Ffprobe found no video stream in the file")]
    NoVideoStream,

    #[error("Ffprobe reported an unusable frame size: {0}x{1}")]
    BadDimensions(u32, u32),
}

pub fn ffmpeg_and_ffprobe_are_callable() -> bool {
    let is_callable = |program: &str| {
        Command::new(program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    };

    is_callable("ffmpeg") && is_callable("ffprobe")
}

pub fn probe_video_metadata<P: AsRef<Path>>(src_path: P) -> Result<VideoMetadata, FfmpegErrorKind> {
    #[rustfmt::skip]
    let output_result = Command::new("ffprobe")
        .args(&[
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height,r_frame_rate,avg_frame_rate,nb_frames,duration:format=duration",
            "-of", "json",
        ])
        .arg(escaped_path(src_path.as_ref()))
        .stdin(Stdio::null())
        .output();

    match output_result {
        Ok(output) if output.status.success() => {
            let probe_string = String::from_utf8(output.stdout)
                .map_err(|_| OtherFailure("Failed to process ffprobe output as utf8".to_string()))?;
            parse_probe_output(&probe_string)
        }
        Ok(output) => Err(make_ffmpeg_failure(String::from_utf8_lossy(&output.stderr).to_string())),
        Err(e) => Err(OtherFailure(format!("failed to run ffprobe: {}", e))),
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

pub fn parse_probe_output(probe_string: &str) -> Result<VideoMetadata, FfmpegErrorKind> {
    let probe: ProbeOutput = serde_json::from_str(probe_string)
        .map_err(|e| OtherFailure(format!("Failed to parse ffprobe output: {}", e)))?;

    let ProbeOutput { streams, format } = probe;
    let stream = streams.into_iter().next().ok_or(NoVideoStream)?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(BadDimensions(width, height));
    }

    //r_frame_rate is the container's nominal rate, avg_frame_rate is what was actually measured.
    //Some containers leave one or the other as 0/0.
    let fps = [&stream.avg_frame_rate, &stream.r_frame_rate]
        .iter()
        .filter_map(|rate| rate.as_deref().and_then(parse_frame_rate))
        .next()
        .unwrap_or(0.0);

    //Not every container records a frame count (mkv usually doesn't), so fall back to duration * fps.
    let total_frames = match stream.nb_frames.as_deref().and_then(|n| n.trim().parse::<u64>().ok()) {
        Some(nb_frames) => nb_frames,
        None => {
            let duration = stream
                .duration
                .as_deref()
                .or_else(|| format.as_ref().and_then(|f| f.duration.as_deref()))
                .and_then(|d| d.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            (duration * fps).round().max(0.0) as u64
        }
    };

    Ok(VideoMetadata {
        total_frames,
        fps,
        width,
        height,
    })
}

fn parse_frame_rate(rate: &str) -> Option<f64> {
    let mut fields = rate.trim().split('/');
    let num = fields.next()?.parse::<f64>().ok()?;
    let den = match fields.next() {
        Some(den) => den.parse::<f64>().ok()?,
        None => 1.0,
    };

    if den == 0.0 || num <= 0.0 {
        None
    } else {
        Some(num / den)
    }
}

//Start an ffmpeg process which writes every decoded frame of the first video stream to stdout
//as packed rgb24, in decode order and at the native resolution.
pub fn spawn_raw_frame_decoder<P: AsRef<Path>>(src_path: P) -> Result<Child, FfmpegErrorKind> {
    #[rustfmt::skip]
    let spawn_result = Command::new("ffmpeg")
        .args(&[
            "-hide_banner",
            "-loglevel", "error",
            "-nostats",
            "-noautorotate",
            "-i",
        ])
        .arg(escaped_path(src_path.as_ref()))
        .args(&[
            "-map", "0:v:0",
            "-vsync", "passthrough",
            "-pix_fmt", "rgb24",
            "-c:v", "rawvideo",
            "-f", "rawvideo",
            "-",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    spawn_result.map_err(|e| OtherFailure(format!("failed to run ffmpeg: {}", e)))
}

//sometimes ffmpeg creates very long error messages. Limit them to the first 500 characters
pub fn make_ffmpeg_failure(msg: String) -> FfmpegErrorKind {
    FfmpegErrorKind::FfmpegFailure(msg.trim().chars().take(500).collect::<String>())
}

fn escaped_path(path: impl AsRef<Path>) -> OsString {
    path.as_ref().as_os_str().to_owned()
}
