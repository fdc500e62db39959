//! Media operations and the backends they run against.
//!
//! The [`MediaService`] facade turns validated tool requests into calls on three
//! narrow backends: a [`MediaBackend`] for metadata and raw streams, a
//! [`Transcoder`] for seeking/trimming/re-encoding, and a [`CaptionBackend`]
//! for transcripts. Production implementations shell out to yt-dlp and ffmpeg
//! and read caption tracks over HTTPS.

mod captions;
mod ffmpeg;
mod filename;
mod reference;
mod service;
mod ytdlp;

#[cfg(test)]
pub(crate) mod testing;

pub use captions::YoutubeCaptions;
pub use ffmpeg::FfmpegTranscoder;
pub use filename::{format_seconds, sanitize_filename, validate_output_path};
pub use reference::{extract_video_id, MediaReference};
pub use service::{MediaRequest, MediaService, OperationOutput, ServiceOptions};
pub use ytdlp::YtDlpBackend;

use crate::error::{Result, YtError};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};

/// Metadata resolved for a video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub title: String,
    pub duration_seconds: u64,
    pub encodings: Vec<Encoding>,
}

/// One downloadable encoding of a video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encoding {
    pub id: String,
    pub quality: String,
    pub container: String,
    pub has_video: bool,
    pub has_audio: bool,
}

/// Requested video quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quality {
    Highest,
    Lowest,
    /// A label such as `720p` or `hd1080`.
    Label(String),
}

impl Quality {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "" | "highest" | "best" => Quality::Highest,
            "lowest" | "worst" => Quality::Lowest,
            other => Quality::Label(other.to_string()),
        }
    }
}

/// Which stream to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSelection {
    /// A single encoding carrying both video and audio.
    VideoAndAudio(Quality),
    /// The best audio-only encoding.
    AudioOnly,
}

/// Reader half of a media stream.
pub type StreamReader = Pin<Box<dyn AsyncRead + Send>>;

/// A readable media stream plus the producer's completion signal.
///
/// The completion future resolves once the producer has exited and reports
/// whether it delivered the whole stream. Dropping it abandons the producer.
pub struct MediaStream {
    reader: StreamReader,
    completion: BoxFuture<'static, Result<()>>,
}

impl MediaStream {
    pub fn new<R, F>(reader: R, completion: F) -> Self
    where
        R: AsyncRead + Send + 'static,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            reader: Box::pin(reader),
            completion: completion.boxed(),
        }
    }

    /// A stream whose producer cannot fail after the last byte.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::new(reader, async { Ok(()) })
    }

    pub fn into_parts(self) -> (StreamReader, BoxFuture<'static, Result<()>>) {
        (self.reader, self.completion)
    }

    /// Copy the whole stream into `writer`, then wait for the producer.
    pub async fn copy_to<W>(self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let (mut reader, completion) = self.into_parts();
        let bytes = tokio::io::copy(&mut reader, writer)
            .await
            .map_err(|e| YtError::Stream(e.to_string()))?;
        completion.await?;
        Ok(bytes)
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream").finish_non_exhaustive()
    }
}

/// Parameters for one transcoding run.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeJob {
    /// Destination file; its extension selects the output format.
    pub output: PathBuf,
    pub seek_seconds: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub audio_bitrate_kbps: Option<u32>,
    /// Drop the video track.
    pub audio_only: bool,
}

/// One timed caption line.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    pub text: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Source of video metadata and raw media streams.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Resolve title, duration and available encodings.
    async fn resolve(&self, reference: &MediaReference) -> Result<VideoDetails>;

    /// Open a stream for the selected encoding.
    async fn open_stream(
        &self,
        reference: &MediaReference,
        selection: &StreamSelection,
    ) -> Result<MediaStream>;
}

/// Consumes a media stream and writes a transcoded file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: MediaStream, job: &TranscodeJob) -> Result<()>;
}

/// Source of caption tracks.
#[async_trait]
pub trait CaptionBackend: Send + Sync {
    /// Fetch the caption segments for `language`, in playback order.
    async fn fetch_captions(&self, video_id: &str, language: &str) -> Result<Vec<CaptionSegment>>;
}
