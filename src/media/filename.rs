//! Output path validation and filename sanitization.

use crate::config::Settings;
use crate::error::{Result, YtError};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("Invalid regex"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

const RESERVED_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Turn a video title into a filesystem-safe file stem.
///
/// Drops everything but word characters, whitespace and hyphens, trims, then
/// collapses whitespace runs into single underscores. Idempotent.
pub fn sanitize_filename(name: &str) -> String {
    let stripped = DISALLOWED_CHARS.replace_all(name, "");
    WHITESPACE_RUNS
        .replace_all(stripped.trim(), "_")
        .into_owned()
}

/// Check a caller-supplied output directory and expand `~`.
///
/// Rejects empty paths and the reserved characters `< > : " | ? *`.
/// Touches nothing on disk.
pub fn validate_output_path(output_path: &str) -> Result<PathBuf> {
    if output_path.trim().is_empty() {
        return Err(YtError::InvalidOutputPath(
            "Output path cannot be empty".to_string(),
        ));
    }

    if output_path.contains(RESERVED_PATH_CHARS) {
        return Err(YtError::InvalidOutputPath(
            "Output path contains invalid characters: < > : \" | ? *".to_string(),
        ));
    }

    Ok(Settings::expand_path(output_path))
}

/// Render seconds the short way: `10`, `10.5`.
pub fn format_seconds(seconds: f64) -> String {
    format!("{}", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(
            sanitize_filename("Rick Astley - Never Gonna Give You Up (Official Video)"),
            "Rick_Astley_-_Never_Gonna_Give_You_Up_Official_Video"
        );
        assert_eq!(sanitize_filename("  a/b\\c: d?  "), "abc_d");
        assert_eq!(sanitize_filename("tabs\tand\n\nnewlines"), "tabs_and_newlines");
        assert_eq!(sanitize_filename("!!!"), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "Rick Astley - Never Gonna Give You Up (Official Video)",
            "  leading and trailing  ",
            "émoji 🎵 and ünïcödé",
            "a  -  b",
            "already_sanitized-name",
            "",
            "\u{00a0}non-breaking\u{00a0}space",
            "mixed\t \n whitespace",
        ];

        for sample in samples {
            let once = sanitize_filename(sample);
            assert_eq!(sanitize_filename(&once), once, "sample: {:?}", sample);
        }
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_sanitize_is_idempotent(title in any::<String>()) {
                let once = sanitize_filename(&title);
                prop_assert_eq!(sanitize_filename(&once), once);
            }

            #[test]
            fn prop_sanitize_is_idempotent_on_titles(title in "\\PC{0,80}") {
                let once = sanitize_filename(&title);
                prop_assert_eq!(sanitize_filename(&once), once);
            }
        }
    }

    #[test]
    fn test_output_path_rules() {
        assert!(validate_output_path("/tmp/out").is_ok());

        let err = validate_output_path("   ").unwrap_err();
        assert_eq!(err.to_string(), "Output path cannot be empty");

        for bad in ["a:b", "out<1>", "what?", "star*", "pipe|d", "quote\""] {
            let err = validate_output_path(bad).unwrap_err();
            assert!(
                err.to_string().contains("invalid characters"),
                "path: {}",
                bad
            );
        }
    }

    #[test]
    fn test_tilde_expanded() {
        let path = validate_output_path("~/videos").unwrap();
        assert!(!path.to_string_lossy().starts_with('~') || dirs::home_dir().is_none());
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(10.0), "10");
        assert_eq!(format_seconds(10.5), "10.5");
        assert_eq!(format_seconds(0.0), "0");
    }
}
