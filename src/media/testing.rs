//! In-memory backends for tests.

use super::{
    CaptionBackend, CaptionSegment, Encoding, MediaBackend, MediaReference, MediaService,
    MediaStream, ServiceOptions, StreamSelection, TranscodeJob, Transcoder, VideoDetails,
};
use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::error::{Result, YtError};
use crate::registry::Registry;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Serves a fixed title and byte payload.
pub struct StubMedia {
    title: String,
    bytes: Vec<u8>,
    fail_stream: bool,
    resolves: AtomicUsize,
    selections: Mutex<Vec<StreamSelection>>,
}

impl StubMedia {
    pub fn new(title: &str, bytes: Vec<u8>) -> Self {
        Self {
            title: title.to_string(),
            bytes,
            fail_stream: false,
            resolves: AtomicUsize::new(0),
            selections: Mutex::new(Vec::new()),
        }
    }

    /// Streams deliver their bytes, then report a producer failure.
    pub fn failing_stream(mut self) -> Self {
        self.fail_stream = true;
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    pub fn selections(&self) -> Vec<StreamSelection> {
        self.selections.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.resolve_calls() + self.selections.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaBackend for StubMedia {
    async fn resolve(&self, _reference: &MediaReference) -> Result<VideoDetails> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        Ok(VideoDetails {
            title: self.title.clone(),
            duration_seconds: 90,
            encodings: vec![Encoding {
                id: "18".into(),
                quality: "360p".into(),
                container: "mp4".into(),
                has_video: true,
                has_audio: true,
            }],
        })
    }

    async fn open_stream(
        &self,
        _reference: &MediaReference,
        selection: &StreamSelection,
    ) -> Result<MediaStream> {
        self.selections.lock().unwrap().push(selection.clone());
        let reader = std::io::Cursor::new(self.bytes.clone());

        if self.fail_stream {
            Ok(MediaStream::new(reader, async {
                Err(YtError::Stream("producer died".into()))
            }))
        } else {
            Ok(MediaStream::from_reader(reader))
        }
    }
}

/// Records jobs and writes the consumed input to the job's output.
#[derive(Default)]
pub struct StubTranscoder {
    jobs: Mutex<Vec<TranscodeJob>>,
}

impl StubTranscoder {
    pub fn jobs(&self) -> Vec<TranscodeJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for StubTranscoder {
    async fn transcode(&self, input: MediaStream, job: &TranscodeJob) -> Result<()> {
        self.jobs.lock().unwrap().push(job.clone());
        let mut file = tokio::fs::File::create(&job.output).await?;
        input.copy_to(&mut file).await?;
        Ok(())
    }
}

/// Serves captions for a fixed set of languages, rejecting the rest.
#[derive(Default)]
pub struct StubCaptions {
    languages: Vec<String>,
    requests: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubCaptions {
    pub fn with_languages(languages: &[&str]) -> Self {
        Self {
            languages: languages.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Most fetches that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptionBackend for StubCaptions {
    async fn fetch_captions(&self, video_id: &str, language: &str) -> Result<Vec<CaptionSegment>> {
        self.requests
            .lock()
            .unwrap()
            .push((video_id.to_string(), language.to_string()));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if !self.languages.iter().any(|l| l == language) {
            return Err(YtError::Captions(format!(
                "Could not find {} captions for {}",
                language, video_id
            )));
        }

        Ok(["hello".to_string(), format!("from {}", language), "world".to_string()]
            .into_iter()
            .enumerate()
            .map(|(i, text)| CaptionSegment {
                text,
                start_seconds: i as f64,
                duration_seconds: 1.0,
            })
            .collect())
    }
}

/// Backends shared between a dispatcher under test and its assertions.
pub struct Stubs {
    pub media: Arc<StubMedia>,
    pub transcoder: Arc<StubTranscoder>,
    pub captions: Arc<StubCaptions>,
}

impl Stubs {
    pub fn new() -> Self {
        Self {
            media: Arc::new(StubMedia::new("Test Video", b"0123456789".to_vec())),
            transcoder: Arc::new(StubTranscoder::default()),
            captions: Arc::new(StubCaptions::with_languages(&["en"])),
        }
    }

    pub fn service(&self) -> MediaService {
        MediaService::new(
            self.media.clone(),
            self.transcoder.clone(),
            self.captions.clone(),
            ServiceOptions::from(&Settings::default()),
        )
    }

    /// Dispatcher whose default output directory is `output_dir`.
    pub fn dispatcher(&self, output_dir: &str) -> Dispatcher {
        Dispatcher::new(Arc::new(Registry::new(output_dir)), self.service())
    }

    pub fn backend_calls(&self) -> usize {
        self.media.calls() + self.transcoder.jobs().len() + self.captions.requests().len()
    }
}
