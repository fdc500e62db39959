//! yt-dlp media backend.
//!
//! Metadata comes from `yt-dlp --dump-json`; streams are read from
//! `yt-dlp --output -` so bytes flow straight to the consumer.

use super::{
    Encoding, MediaBackend, MediaReference, MediaStream, Quality, StreamSelection, VideoDetails,
};
use crate::error::{Result, YtError};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, instrument};

static HEIGHT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3,4})p").expect("Invalid regex"));

/// Media backend driving the `yt-dlp` executable.
pub struct YtDlpBackend {
    binary: String,
}

impl YtDlpBackend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> YtError {
        if e.kind() == std::io::ErrorKind::NotFound {
            YtError::ToolNotFound(self.binary.clone())
        } else {
            YtError::ToolFailed(format!("Failed to run {}: {}", self.binary, e))
        }
    }
}

impl Default for YtDlpBackend {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
    #[instrument(skip(self), fields(video_id = %reference.video_id()))]
    async fn resolve(&self, reference: &MediaReference) -> Result<VideoDetails> {
        let output = Command::new(&self.binary)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                reference.watch_url().as_str(),
            ])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(YtError::MediaSource(format!(
                "Video {} not found or unavailable: {}",
                reference.video_id(),
                stderr.trim()
            )));
        }

        let json: Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            YtError::MediaSource(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        let details = parse_video_details(&json);
        debug!(
            "Resolved '{}' ({}s, {} formats)",
            details.title,
            details.duration_seconds,
            details.encodings.len()
        );
        Ok(details)
    }

    #[instrument(skip(self), fields(video_id = %reference.video_id()))]
    async fn open_stream(
        &self,
        reference: &MediaReference,
        selection: &StreamSelection,
    ) -> Result<MediaStream> {
        let selector = format_selector(selection);
        info!("Streaming format '{}'", selector);

        let mut child = Command::new(&self.binary)
            .args([
                "--format",
                selector.as_str(),
                "--output",
                "-",
                "--no-playlist",
                "--no-part",
                "--quiet",
                "--no-warnings",
                reference.watch_url().as_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| YtError::Internal("yt-dlp stdout was not captured".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| YtError::Internal("yt-dlp stderr was not captured".into()))?;

        // Drain stderr concurrently so a chatty producer never blocks
        let stderr_task = tokio::spawn(async move { read_lossy(&mut stderr).await });

        let completion = async move {
            let status = child
                .wait()
                .await
                .map_err(|e| YtError::Stream(format!("yt-dlp wait failed: {}", e)))?;
            let stderr = stderr_task.await.unwrap_or_default();
            for line in stderr.lines() {
                debug!("yt-dlp: {}", line);
            }

            if status.success() {
                Ok(())
            } else {
                Err(YtError::Stream(format!(
                    "yt-dlp exited with {}: {}",
                    status,
                    stderr.trim()
                )))
            }
        };

        Ok(MediaStream::new(stdout, completion))
    }
}

/// Read `reader` to the end, replacing invalid UTF-8 rather than losing it.
async fn read_lossy<R>(reader: &mut R) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf).await {
        debug!("Failed to read yt-dlp stderr: {}", e);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// yt-dlp `--format` selector for a stream selection.
pub(crate) fn format_selector(selection: &StreamSelection) -> String {
    const COMBINED: &str = "[vcodec!=none][acodec!=none]";

    match selection {
        StreamSelection::AudioOnly => "bestaudio[vcodec=none]/bestaudio".to_string(),
        StreamSelection::VideoAndAudio(Quality::Highest) => format!("best{}", COMBINED),
        StreamSelection::VideoAndAudio(Quality::Lowest) => format!("worst{}", COMBINED),
        StreamSelection::VideoAndAudio(Quality::Label(label)) => {
            if let Some(caps) = HEIGHT_LABEL.captures(label) {
                format!("best[height={}]{}", &caps[1], COMBINED)
            } else {
                let note: String = label.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
                format!("best[format_note*={}]{}", note, COMBINED)
            }
        }
    }
}

/// Extract title, duration and encodings from `--dump-json` output.
pub(crate) fn parse_video_details(json: &Value) -> VideoDetails {
    let title = json["title"]
        .as_str()
        .unwrap_or("Unknown Title")
        .to_string();

    let duration_seconds = json["duration"].as_f64().map(|d| d.round() as u64).unwrap_or(0);

    let encodings = json["formats"]
        .as_array()
        .map(|formats| formats.iter().map(parse_encoding).collect())
        .unwrap_or_default();

    VideoDetails {
        title,
        duration_seconds,
        encodings,
    }
}

fn parse_encoding(format: &Value) -> Encoding {
    let has_codec = |key: &str| {
        format[key]
            .as_str()
            .is_some_and(|codec| !codec.is_empty() && codec != "none")
    };

    let quality = format["format_note"]
        .as_str()
        .map(str::to_string)
        .or_else(|| format["height"].as_u64().map(|h| format!("{}p", h)))
        .or_else(|| format["resolution"].as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    Encoding {
        id: format["format_id"].as_str().unwrap_or("unknown").to_string(),
        quality,
        container: format["ext"].as_str().unwrap_or("unknown").to_string(),
        has_video: has_codec("vcodec"),
        has_audio: has_codec("acodec"),
    }
}
