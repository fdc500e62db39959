//! Media operations facade.

use super::{
    format_seconds, sanitize_filename, validate_output_path, CaptionBackend, FfmpegTranscoder,
    MediaBackend, MediaReference, MediaStream, Quality, StreamSelection, TranscodeJob,
    Transcoder, YoutubeCaptions, YtDlpBackend,
};
use crate::config::Settings;
use crate::error::{Result, YtError};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

/// Caption probes allowed in flight at once.
const PROBE_CONCURRENCY: usize = 2;

/// A validated tool call, one variant per tool.
///
/// Built from the schema-validated argument map with the tool name as tag, so
/// every field is present (defaults already applied).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MediaRequest {
    GetVideoInfo {
        url: String,
    },
    DownloadVideo {
        url: String,
        quality: String,
        output_path: String,
    },
    DownloadVideoSlice {
        url: String,
        start_time: f64,
        end_time: f64,
        output_path: String,
    },
    DownloadAudio {
        url: String,
        format: String,
        output_path: String,
    },
    DownloadAudioSlice {
        url: String,
        start_time: f64,
        end_time: f64,
        format: String,
        output_path: String,
    },
    GetTranscript {
        url: String,
        language: String,
    },
    GetAvailableTranscriptLanguages {
        url: String,
    },
}

impl MediaRequest {
    /// Type a validated argument map for tool `name`.
    pub fn from_validated(name: &str, mut params: Map<String, Value>) -> Result<Self> {
        params.insert("name".to_string(), Value::String(name.to_string()));
        serde_json::from_value(Value::Object(params)).map_err(|e| {
            YtError::Internal(format!("arguments for '{}' do not fit its handler: {}", name, e))
        })
    }
}

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutput {
    pub payload: String,
    pub metadata: Map<String, Value>,
}

impl OperationOutput {
    fn new(payload: String) -> Self {
        Self {
            payload,
            metadata: Map::new(),
        }
    }

    fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Facade knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub audio_bitrate_kbps: u32,
    pub probe_languages: Vec<String>,
}

impl From<&Settings> for ServiceOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            audio_bitrate_kbps: settings.downloads.audio_bitrate_kbps,
            probe_languages: settings.transcripts.probe_languages.clone(),
        }
    }
}

/// Payload of `get_video_info`.
#[derive(Debug, Serialize)]
struct VideoInfo<'a> {
    url: &'a str,
    title: &'a str,
    duration: u64,
    formats: &'a [super::Encoding],
}

/// A `[start, end)` interval in seconds.
#[derive(Debug, Clone, Copy)]
struct Slice {
    start: f64,
    end: f64,
}

impl Slice {
    fn new(start: f64, end: f64) -> Result<Self> {
        if start < 0.0 {
            return Err(YtError::InvalidParameters(format!(
                "startTime must not be negative, got {}",
                format_seconds(start)
            )));
        }
        if end <= start {
            return Err(YtError::InvalidParameters(format!(
                "endTime ({}) must be greater than startTime ({})",
                format_seconds(end),
                format_seconds(start)
            )));
        }
        Ok(Self { start, end })
    }

    fn duration(&self) -> f64 {
        self.end - self.start
    }

    fn label(&self) -> String {
        format!("{}-{}", format_seconds(self.start), format_seconds(self.end))
    }
}

/// Where a download lands.
struct Target {
    reference: MediaReference,
    dir: PathBuf,
    stem: String,
}

impl Target {
    fn file(&self, suffix: &str, extension: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", self.stem, suffix, extension))
    }
}

/// The seven media operations, run against pluggable backends.
pub struct MediaService {
    media: Arc<dyn MediaBackend>,
    transcoder: Arc<dyn Transcoder>,
    captions: Arc<dyn CaptionBackend>,
    options: ServiceOptions,
}

impl MediaService {
    pub fn new(
        media: Arc<dyn MediaBackend>,
        transcoder: Arc<dyn Transcoder>,
        captions: Arc<dyn CaptionBackend>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            media,
            transcoder,
            captions,
            options,
        }
    }

    /// Service backed by yt-dlp, ffmpeg and youtube.com captions.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            Arc::new(YtDlpBackend::new(settings.tools.ytdlp.clone())),
            Arc::new(FfmpegTranscoder::new(settings.tools.ffmpeg.clone())),
            Arc::new(YoutubeCaptions::new(&settings.transcripts)?),
            ServiceOptions::from(settings),
        ))
    }

    /// Run one request.
    pub async fn execute(&self, request: MediaRequest) -> Result<OperationOutput> {
        match request {
            MediaRequest::GetVideoInfo { url } => self.get_video_info(&url).await,
            MediaRequest::DownloadVideo {
                url,
                quality,
                output_path,
            } => self.download_video(&url, &quality, &output_path).await,
            MediaRequest::DownloadVideoSlice {
                url,
                start_time,
                end_time,
                output_path,
            } => {
                self.download_video_slice(&url, start_time, end_time, &output_path)
                    .await
            }
            MediaRequest::DownloadAudio {
                url,
                format,
                output_path,
            } => self.download_audio(&url, &format, &output_path).await,
            MediaRequest::DownloadAudioSlice {
                url,
                start_time,
                end_time,
                format,
                output_path,
            } => {
                self.download_audio_slice(&url, start_time, end_time, &format, &output_path)
                    .await
            }
            MediaRequest::GetTranscript { url, language } => {
                self.get_transcript(&url, &language).await
            }
            MediaRequest::GetAvailableTranscriptLanguages { url } => {
                Ok(self.get_available_transcript_languages(&url).await)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_video_info(&self, url: &str) -> Result<OperationOutput> {
        let reference = MediaReference::parse(url)?;
        let details = self.media.resolve(&reference).await?;

        let info = VideoInfo {
            url,
            title: &details.title,
            duration: details.duration_seconds,
            formats: &details.encodings,
        };

        Ok(OperationOutput::new(serde_json::to_string_pretty(&info)?))
    }

    #[instrument(skip(self))]
    pub async fn download_video(
        &self,
        url: &str,
        quality: &str,
        output_path: &str,
    ) -> Result<OperationOutput> {
        let target = self.prepare_target(url, output_path).await?;
        let filepath = target.file("", "mp4");

        let selection = StreamSelection::VideoAndAudio(Quality::parse(quality));
        let stream = self.media.open_stream(&target.reference, &selection).await?;
        let bytes = write_stream(stream, &filepath).await?;

        info!("Downloaded {} bytes to {}", bytes, filepath.display());
        Ok(download_output("Video downloaded successfully", &filepath, bytes))
    }

    #[instrument(skip(self))]
    pub async fn download_video_slice(
        &self,
        url: &str,
        start_time: f64,
        end_time: f64,
        output_path: &str,
    ) -> Result<OperationOutput> {
        let slice = Slice::new(start_time, end_time)?;
        let target = self.prepare_target(url, output_path).await?;
        let filepath = target.file(&format!("_slice_{}", slice.label()), "mp4");

        let stream = self
            .media
            .open_stream(
                &target.reference,
                &StreamSelection::VideoAndAudio(Quality::Highest),
            )
            .await?;

        let job = TranscodeJob {
            output: filepath.clone(),
            seek_seconds: Some(slice.start),
            duration_seconds: Some(slice.duration()),
            audio_bitrate_kbps: None,
            audio_only: false,
        };
        let bytes = self.run_transcode(stream, &job).await?;

        Ok(
            download_output("Video slice downloaded successfully", &filepath, bytes)
                .with("startTime", start_time)
                .with("endTime", end_time),
        )
    }

    #[instrument(skip(self))]
    pub async fn download_audio(
        &self,
        url: &str,
        format: &str,
        output_path: &str,
    ) -> Result<OperationOutput> {
        check_audio_format(format)?;
        let target = self.prepare_target(url, output_path).await?;
        let filepath = target.file("", format);

        let stream = self
            .media
            .open_stream(&target.reference, &StreamSelection::AudioOnly)
            .await?;

        let job = TranscodeJob {
            output: filepath.clone(),
            seek_seconds: None,
            duration_seconds: None,
            audio_bitrate_kbps: Some(self.options.audio_bitrate_kbps),
            audio_only: true,
        };
        let bytes = self.run_transcode(stream, &job).await?;

        Ok(download_output("Audio downloaded successfully", &filepath, bytes).with("format", format))
    }

    #[instrument(skip(self))]
    pub async fn download_audio_slice(
        &self,
        url: &str,
        start_time: f64,
        end_time: f64,
        format: &str,
        output_path: &str,
    ) -> Result<OperationOutput> {
        let slice = Slice::new(start_time, end_time)?;
        check_audio_format(format)?;
        let target = self.prepare_target(url, output_path).await?;
        let filepath = target.file(&format!("_audio_slice_{}", slice.label()), format);

        let stream = self
            .media
            .open_stream(&target.reference, &StreamSelection::AudioOnly)
            .await?;

        let job = TranscodeJob {
            output: filepath.clone(),
            seek_seconds: Some(slice.start),
            duration_seconds: Some(slice.duration()),
            audio_bitrate_kbps: Some(self.options.audio_bitrate_kbps),
            audio_only: true,
        };
        let bytes = self.run_transcode(stream, &job).await?;

        Ok(
            download_output("Audio slice downloaded successfully", &filepath, bytes)
                .with("format", format)
                .with("startTime", start_time)
                .with("endTime", end_time),
        )
    }

    #[instrument(skip(self))]
    pub async fn get_transcript(&self, url: &str, language: &str) -> Result<OperationOutput> {
        let reference = MediaReference::parse(url)?;
        let segments = self
            .captions
            .fetch_captions(reference.video_id(), language)
            .await?;

        if segments.is_empty() {
            return Err(YtError::Captions(
                "No transcript found for this video in the specified language".to_string(),
            ));
        }

        let transcript = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let char_count = transcript.chars().count();

        Ok(OperationOutput::new(transcript)
            .with("language", language)
            .with("charCount", char_count))
    }

    /// Probe the configured languages; falls back to `["en"]`, never fails.
    #[instrument(skip(self))]
    pub async fn get_available_transcript_languages(&self, url: &str) -> OperationOutput {
        let mut languages = match MediaReference::parse(url) {
            Ok(reference) => self.probe_languages(&reference).await,
            Err(e) => {
                warn!("Cannot probe transcripts for '{}': {}", url, e);
                Vec::new()
            }
        };

        if languages.is_empty() {
            languages.push("en".to_string());
        }

        let payload = serde_json::to_string_pretty(&languages)
            .unwrap_or_else(|_| format!("{:?}", languages));

        OperationOutput::new(payload)
            .with("availableLanguages", languages.len())
            .with("languages", json!(languages))
    }

    /// Languages with a caption track, in probe order.
    ///
    /// Every probe loads the watch page, so only a few run at once.
    async fn probe_languages(&self, reference: &MediaReference) -> Vec<String> {
        let probes: Vec<_> = self
            .options
            .probe_languages
            .iter()
            .map(|lang| async move {
                match self.captions.fetch_captions(reference.video_id(), lang).await {
                    Ok(segments) if !segments.is_empty() => Some(lang.clone()),
                    Ok(_) => None,
                    Err(e) => {
                        debug!("No {} captions: {}", lang, e);
                        None
                    }
                }
            })
            .collect();

        stream::iter(probes)
            .buffered(PROBE_CONCURRENCY)
            .filter_map(|found| async move { found })
            .collect()
            .await
    }

    /// Validate the directory, resolve the video and pick the file stem.
    ///
    /// Nothing touches the disk until the path and reference are known good.
    async fn prepare_target(&self, url: &str, output_path: &str) -> Result<Target> {
        let dir = validate_output_path(output_path)?;
        let reference = MediaReference::parse(url)?;

        tokio::fs::create_dir_all(&dir).await?;

        let details = self.media.resolve(&reference).await?;
        let mut stem = sanitize_filename(&details.title);
        if stem.is_empty() {
            stem = reference.video_id().to_string();
        }

        Ok(Target {
            reference,
            dir,
            stem,
        })
    }

    /// Transcode and report the size of the written file.
    async fn run_transcode(&self, stream: MediaStream, job: &TranscodeJob) -> Result<u64> {
        if let Err(e) = self.transcoder.transcode(stream, job).await {
            remove_partial(&job.output).await;
            return Err(e);
        }

        let metadata = tokio::fs::metadata(&job.output).await.map_err(|e| {
            YtError::Transcode(format!(
                "output {} missing after transcode: {}",
                job.output.display(),
                e
            ))
        })?;
        Ok(metadata.len())
    }
}

/// Stream straight to `path`, removing the file if anything fails.
async fn write_stream(stream: MediaStream, path: &Path) -> Result<u64> {
    let result = async {
        let mut file = tokio::fs::File::create(path).await?;
        let bytes = stream.copy_to(&mut file).await?;
        file.flush().await?;
        Ok::<_, YtError>(bytes)
    }
    .await;

    if result.is_err() {
        remove_partial(path).await;
    }
    result
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
}

fn check_audio_format(format: &str) -> Result<()> {
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(YtError::InvalidParameters(format!(
            "format must be a plain file extension such as mp3, got '{}'",
            format
        )));
    }
    Ok(())
}

fn download_output(message: &str, filepath: &Path, bytes: u64) -> OperationOutput {
    let filepath = filepath.display().to_string();
    OperationOutput::new(format!("{} to: {}", message, filepath))
        .with("filepath", filepath)
        .with("bytes", bytes)
}
