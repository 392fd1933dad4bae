use std::{
    io::{BufReader, ErrorKind, Read},
    path::{Path, PathBuf},
    process::{Child, ChildStderr, ChildStdout},
    thread::JoinHandle,
};

use super::{DecodeError, DecoderFactory, DecoderSession, FrameRef, VideoMetadata};
use crate::library::{
    ffmpeg_ops::{make_ffmpeg_failure, probe_video_metadata, spawn_raw_frame_decoder},
    img_ops::RgbImgBuf,
};

/// Opens videos by probing them with ffprobe and decoding them with an ffmpeg child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegDecoder;

impl DecoderFactory for FfmpegDecoder {
    type Session = FfmpegSession;

    fn open(&self, src_path: &Path) -> Result<FfmpegSession, DecodeError> {
        FfmpegSession::open(src_path)
    }
}

//ffmpeg can print a lot to stderr when it meets a damaged file. It is drained on its own thread
//so that a full stderr pipe can never stall the frame pipe.
const MAX_STDERR_BYTES: u64 = 64 * 1024;

struct RunningDecoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_drain: Option<JoinHandle<String>>,
}

impl RunningDecoder {
    fn collect_stderr(&mut self) -> String {
        self.stderr_drain
            .take()
            .and_then(|drain| drain.join().ok())
            .unwrap_or_default()
    }
}

fn drain_stderr(stderr: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut kept = Vec::new();
        let mut stderr = stderr;
        let _ = (&mut stderr).take(MAX_STDERR_BYTES).read_to_end(&mut kept);
        //keep the pipe empty until ffmpeg exits, discarding anything past the limit.
        let _ = std::io::copy(&mut stderr, &mut std::io::sink());
        String::from_utf8_lossy(&kept).to_string()
    })
}

pub struct FfmpegSession {
    src_path: PathBuf,
    metadata: VideoMetadata,
    decoder: Option<RunningDecoder>,
    frame_buf: RgbImgBuf,
    next_index: u64,
    finished: bool,
    released: bool,
}

impl FfmpegSession {
    pub fn open<P: AsRef<Path>>(src_path: P) -> Result<Self, DecodeError> {
        let metadata = probe_video_metadata(&src_path)?;

        let mut ret = Self {
            src_path: src_path.as_ref().to_path_buf(),
            metadata,
            decoder: None,
            frame_buf: RgbImgBuf::new(metadata.width, metadata.height),
            next_index: 0,
            finished: false,
            released: false,
        };

        //ffprobe has vouched for the file by now. Start ffmpeg straight away so that a missing
        //binary is reported as an open failure.
        ret.start_decoder()?;
        Ok(ret)
    }

    fn start_decoder(&mut self) -> Result<(), DecodeError> {
        let mut child = spawn_raw_frame_decoder(&self.src_path)?;
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(DecodeError::Io(std::io::Error::new(
                    ErrorKind::BrokenPipe,
                    "ffmpeg stdout was not captured",
                )));
            }
        };

        let stderr_drain = child.stderr.take().map(drain_stderr);

        self.decoder = Some(RunningDecoder {
            child,
            stdout: BufReader::new(stdout),
            stderr_drain,
        });
        self.next_index = 0;
        self.finished = false;
        Ok(())
    }

    fn stop_decoder(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            //the process may well have exited already, in which case kill fails harmlessly.
            let _ = decoder.child.kill();
            let _ = decoder.child.wait();
            decoder.collect_stderr();
        }
    }

    //Called once ffmpeg has closed its stdout. Reaps the process and turns a failed exit into
    //an error, unless some frames were already produced (ffmpeg often complains about damage at
    //the end of otherwise good files).
    fn finish_decoder(&mut self) -> Result<(), DecodeError> {
        self.finished = true;

        let mut decoder = match self.decoder.take() {
            Some(decoder) => decoder,
            None => return Ok(()),
        };

        let status = decoder.child.wait()?;
        let stderr = decoder.collect_stderr();
        if status.success() {
            return Ok(());
        }

        if self.next_index == 0 {
            Err(make_ffmpeg_failure(stderr).into())
        } else {
            warn!(
                "ffmpeg exited with {} after {} frames of {}: {}",
                status,
                self.next_index,
                self.src_path.display(),
                stderr.trim()
            );
            Ok(())
        }
    }
}

impl DecoderSession for FfmpegSession {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn read_next_frame(&mut self) -> Result<Option<FrameRef<'_>>, DecodeError> {
        if self.released {
            return Err(DecodeError::Released);
        }
        if self.finished {
            return Ok(None);
        }
        if self.decoder.is_none() {
            self.start_decoder()?;
        }

        let bytes_read = match self.decoder.as_mut() {
            Some(decoder) => read_full(&mut decoder.stdout, &mut self.frame_buf)?,
            None => 0,
        };

        let frame_size = self.frame_buf.len();
        if bytes_read < frame_size {
            if bytes_read > 0 {
                warn!(
                    "Discarding truncated frame {} of {} ({} of {} bytes)",
                    self.next_index,
                    self.src_path.display(),
                    bytes_read,
                    frame_size
                );
            }
            self.finish_decoder()?;
            return Ok(None);
        }

        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(FrameRef::new(index, &self.frame_buf)))
    }

    fn seek_to_start(&mut self) -> Result<(), DecodeError> {
        if self.released {
            return Err(DecodeError::Released);
        }

        //a pipe cannot be rewound, so restart the decoder from the beginning of the file.
        self.stop_decoder();
        self.start_decoder()
    }

    fn release(&mut self) {
        if !self.released {
            trace!("Releasing decoder for {}", self.src_path.display());
            self.stop_decoder();
            self.released = true;
        }
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        self.release();
    }
}

//Like read_exact, but reports how much was read instead of failing on a short read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
