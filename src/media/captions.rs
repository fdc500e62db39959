//! Caption tracks read from the YouTube watch page.
//!
//! The watch page embeds a `captionTracks` array; each track has a `baseUrl`
//! serving timed text as XML (`<text start=".." dur="..">..</text>`).

use super::{CaptionBackend, CaptionSegment};
use crate::config::TranscriptSettings;
use crate::error::{Result, YtError};
use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::header::ACCEPT_LANGUAGE;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};

static TEXT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text\s+start="([^"]*)"(?:\s+dur="([^"]*)")?[^>]*>(.*?)</text>"#)
        .expect("Invalid regex")
});

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("Invalid regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("Invalid regex")
});

/// One entry of the watch page's `captionTracks` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    vss_id: String,
    #[serde(default)]
    language_code: String,
}

/// Caption backend speaking to youtube.com over HTTPS.
pub struct YoutubeCaptions {
    client: reqwest::Client,
}

impl YoutubeCaptions {
    pub fn new(settings: &TranscriptSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;
        Ok(Self { client })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let text = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

#[async_trait]
impl CaptionBackend for YoutubeCaptions {
    #[instrument(skip(self))]
    async fn fetch_captions(&self, video_id: &str, language: &str) -> Result<Vec<CaptionSegment>> {
        let page = self
            .get_text(&format!("https://www.youtube.com/watch?v={}", video_id))
            .await?;

        let tracks = parse_caption_tracks(&page).ok_or_else(|| {
            YtError::Captions(format!("Could not find captions for video: {}", video_id))
        })?;
        debug!("Found {} caption tracks", tracks.len());

        let track = select_track(&tracks, language).ok_or_else(|| {
            YtError::Captions(format!(
                "Could not find {} captions for {}",
                language, video_id
            ))
        })?;

        let xml = self.get_text(&track.base_url).await?;
        let segments = parse_timed_text(&xml);

        if segments.is_empty() {
            return Err(YtError::Captions(format!(
                "Caption track for {} is empty",
                language
            )));
        }

        Ok(segments)
    }
}

/// Locate and decode the `captionTracks` array embedded in a watch page.
fn parse_caption_tracks(page: &str) -> Option<Vec<CaptionTrack>> {
    const KEY: &str = "\"captionTracks\":";
    let start = page.find(KEY)? + KEY.len();
    let array = balanced_json_array(&page[start..])?;
    serde_json::from_str(array).ok()
}

/// The JSON array at the start of `input`, up to its matching `]`.
fn balanced_json_array(input: &str) -> Option<&str> {
    let input = input.trim_start();
    if !input.starts_with('[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Prefer a manual track, then an auto-generated one, then any code match.
fn select_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    let manual = format!(".{}", language);
    let auto = format!("a.{}", language);

    tracks
        .iter()
        .find(|t| t.vss_id == manual)
        .or_else(|| tracks.iter().find(|t| t.vss_id == auto))
        .or_else(|| tracks.iter().find(|t| t.language_code == language))
}

/// Parse timed-text XML into caption segments.
fn parse_timed_text(xml: &str) -> Vec<CaptionSegment> {
    TEXT_ELEMENT
        .captures_iter(xml)
        .filter_map(|caps| {
            let text = clean_caption_text(&caps[3]);
            if text.is_empty() {
                return None;
            }

            Some(CaptionSegment {
                text,
                start_seconds: caps[1].parse().unwrap_or(0.0),
                duration_seconds: caps
                    .get(2)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0.0),
            })
        })
        .collect()
}

/// Timed text is escaped twice; undo both layers and drop inline markup.
fn clean_caption_text(raw: &str) -> String {
    let decoded = decode_entities(&raw.replace("&amp;", "&"));
    let stripped = MARKUP.replace_all(&decoded, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(input: &str) -> String {
    ENTITY
        .replace_all(input, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };

            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
