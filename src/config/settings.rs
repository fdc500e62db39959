//! Configuration settings for yt-mcp.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the default download directory.
pub const DOWNLOAD_PATH_ENV: &str = "YOUTUBE_DOWNLOAD_PATH";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub downloads: DownloadSettings,
    pub tools: ToolSettings,
    pub transcripts: TranscriptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Download destination and encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory used when a tool call does not pass `outputPath`.
    pub output_dir: String,
    /// Bitrate for transcoded audio, in kbps.
    pub audio_bitrate_kbps: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/Downloads/YouTube".to_string(),
            audio_bitrate_kbps: 128,
        }
    }
}

/// External binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// yt-dlp executable name or path.
    pub ytdlp: String,
    /// ffmpeg executable name or path.
    pub ffmpeg: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ytdlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

/// Caption fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Languages probed, in order, by `get_available_transcript_languages`.
    pub probe_languages: Vec<String>,
    /// Timeout for each HTTP request to YouTube.
    pub request_timeout_seconds: u64,
    /// User agent sent with caption requests.
    pub user_agent: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            probe_languages: [
                "en", "es", "fr", "de", "it", "pt", "ru", "ja", "ko", "zh", "ar", "hi",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            request_timeout_seconds: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// `YOUTUBE_DOWNLOAD_PATH` takes precedence over the file's `output_dir`.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(std::env::var(DOWNLOAD_PATH_ENV).ok());
        Ok(settings)
    }

    /// Apply an environment override for the download directory.
    pub fn apply_env(&mut self, download_path: Option<String>) {
        if let Some(dir) = download_path.filter(|d| !d.trim().is_empty()) {
            self.downloads.output_dir = dir;
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yt-mcp")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded default output directory.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.downloads.output_dir)
    }
}
