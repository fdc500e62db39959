//! Video references: turning URLs and bare IDs into a video ID.

use crate::error::{Result, YtError};
use regex::Regex;
use std::sync::LazyLock;

static VIDEO_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Matches the supported URL shapes and bare 11-character IDs
    Regex::new(
        r"(?x)
        (?:
            (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)
            ([a-zA-Z0-9_-]{11})
            (?:[^a-zA-Z0-9_-]|$)
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex")
});

/// Extract the video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = VIDEO_ID_REGEX.captures(input.trim())?;

    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// A resolved video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    video_id: String,
}

impl MediaReference {
    /// Resolve `input`, failing with `Invalid video URL or identifier`.
    pub fn parse(input: &str) -> Result<Self> {
        extract_video_id(input)
            .map(|video_id| Self { video_id })
            .ok_or(YtError::InvalidReference)
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Canonical watch URL handed to the media backend.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abcdefghij1"),
            Some("abcdefghij1".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtube.com/embed/dQw4w9WgXcQ?autoplay=1"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_bare_id_unchanged() {
        assert_eq!(extract_video_id("abcdefghij1"), Some("abcdefghij1".to_string()));
        assert_eq!(extract_video_id("a-b_c-d_e-f"), Some("a-b_c-d_e-f".to_string()));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(extract_video_id("not-a-video-id"), None);
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("abcdefghij12"), None);
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abcdefghij1toolong"),
            None
        );
        assert_eq!(extract_video_id("https://vimeo.com/123456789"), None);
    }

    #[test]
    fn test_reference_parse() {
        let reference = MediaReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(reference.video_id(), "dQw4w9WgXcQ");
        assert_eq!(
            reference.watch_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );

        let err = MediaReference::parse("nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid video URL or identifier");
    }
}
