//! ffmpeg transcoder fed through stdin.

use super::{MediaStream, TranscodeJob, Transcoder};
use crate::error::{Result, YtError};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tracing::{debug, instrument};

/// Number of trailing ffmpeg stderr lines kept for error messages.
const STDERR_TAIL_LINES: usize = 20;

/// Transcoder driving the `ffmpeg` executable.
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command-line arguments for a job, reading the input from `pipe:0`.
    pub(crate) fn build_args(job: &TranscodeJob) -> Vec<String> {
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];

        if let Some(seek) = job.seek_seconds {
            args.push("-ss".into());
            args.push(format!("{:.3}", seek));
        }

        args.push("-i".into());
        args.push("pipe:0".into());

        if let Some(duration) = job.duration_seconds {
            args.push("-t".into());
            args.push(format!("{:.3}", duration));
        }

        if job.audio_only {
            args.push("-vn".into());
        }

        if let Some(bitrate) = job.audio_bitrate_kbps {
            args.push("-b:a".into());
            args.push(format!("{}k", bitrate));
        }

        args.push("-y".into());
        args.push(job.output.to_string_lossy().into_owned());
        args
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[instrument(skip_all, fields(output = %job.output.display()))]
    async fn transcode(&self, input: MediaStream, job: &TranscodeJob) -> Result<()> {
        let mut child = Command::new(&self.binary)
            .args(Self::build_args(job))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    YtError::ToolNotFound(self.binary.clone())
                } else {
                    YtError::Transcode(format!("failed to start {}: {}", self.binary, e))
                }
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| YtError::Internal("ffmpeg stdin was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| YtError::Internal("ffmpeg stderr was not captured".into()))?;

        let (mut reader, completion) = input.into_parts();

        let feed = async move {
            let result = tokio::io::copy(&mut reader, &mut stdin).await;
            // Closing stdin signals end of input
            drop(stdin);
            result
        };

        let (fed, stderr_tail, status) = tokio::join!(feed, relay_stderr(stderr), child.wait());

        let status = status.map_err(|e| YtError::Transcode(e.to_string()))?;
        if !status.success() {
            return Err(YtError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                status,
                stderr_tail.trim()
            )));
        }

        settle_input(fed, job, completion).await
    }
}

/// Decide the outcome of feeding ffmpeg once it has exited cleanly.
///
/// A closed pipe is expected only when `-t` cut the input short; otherwise
/// the producer must also have finished cleanly.
async fn settle_input(
    fed: std::io::Result<u64>,
    job: &TranscodeJob,
    completion: BoxFuture<'static, Result<()>>,
) -> Result<()> {
    match fed {
        Ok(bytes) => {
            debug!("Fed {} bytes to ffmpeg", bytes);
            completion.await
        }
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe && job.duration_seconds.is_some() => {
            debug!("ffmpeg closed its input after the requested duration");
            Ok(())
        }
        Err(e) => {
            completion.await?;
            Err(YtError::Stream(format!("Failed to feed ffmpeg: {}", e)))
        }
    }
}

/// Relay ffmpeg's stderr to the log, returning the last few lines.
async fn relay_stderr(stderr: ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    while let Ok(Some(line)) = lines.next_line().await {
        debug!("ffmpeg: {}", line);
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    Vec::from(tail).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_audio_slice_args() {
        let job = TranscodeJob {
            output: PathBuf::from("/tmp/out/song_audio_slice_10-20.mp3"),
            seek_seconds: Some(10.0),
            duration_seconds: Some(10.0),
            audio_bitrate_kbps: Some(128),
            audio_only: true,
        };

        let args = FfmpegTranscoder::build_args(&job);
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-loglevel", "error", "-ss", "10.000", "-i", "pipe:0", "-t",
                "10.000", "-vn", "-b:a", "128k", "-y",
                "/tmp/out/song_audio_slice_10-20.mp3",
            ]
        );
    }

    #[test]
    fn test_plain_args() {
        let job = TranscodeJob {
            output: PathBuf::from("clip.mp4"),
            seek_seconds: None,
            duration_seconds: None,
            audio_bitrate_kbps: None,
            audio_only: false,
        };

        let args = FfmpegTranscoder::build_args(&job);
        assert_eq!(
            args,
            vec!["-hide_banner", "-loglevel", "error", "-i", "pipe:0", "-y", "clip.mp4"]
        );
    }

    fn job(duration_seconds: Option<f64>) -> TranscodeJob {
        TranscodeJob {
            output: PathBuf::from("out.mp3"),
            seek_seconds: None,
            duration_seconds,
            audio_bitrate_kbps: Some(128),
            audio_only: true,
        }
    }

    fn broken_pipe() -> std::io::Result<u64> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }

    fn producer(result: Result<()>) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move { result })
    }

    #[tokio::test]
    async fn test_closed_pipe_after_duration_is_success() {
        let failed = producer(Err(YtError::Stream("yt-dlp killed".into())));
        assert!(settle_input(broken_pipe(), &job(Some(10.0)), failed).await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_pipe_on_full_transcode_fails() {
        let err = settle_input(broken_pipe(), &job(None), producer(Ok(())))
            .await
            .unwrap_err();
        assert!(matches!(err, YtError::Stream(_)));

        let err = settle_input(
            broken_pipe(),
            &job(None),
            producer(Err(YtError::Stream("yt-dlp exited with 1".into()))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), YtError::Stream("yt-dlp exited with 1".into()).to_string());
    }

    #[tokio::test]
    async fn test_producer_failure_after_full_feed() {
        let err = settle_input(Ok(42), &job(None), producer(Err(YtError::Stream("boom".into()))))
            .await
            .unwrap_err();
        assert!(matches!(err, YtError::Stream(_)));
        assert!(settle_input(Ok(42), &job(None), producer(Ok(()))).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let transcoder = FfmpegTranscoder::new("ffmpeg-definitely-not-installed");
        let job = TranscodeJob {
            output: PathBuf::from("never.mp3"),
            seek_seconds: None,
            duration_seconds: None,
            audio_bitrate_kbps: Some(128),
            audio_only: true,
        };

        let err = transcoder
            .transcode(MediaStream::from_reader(&b"bytes"[..]), &job)
            .await
            .unwrap_err();
        assert!(matches!(err, YtError::ToolNotFound(_)));
    }
}
