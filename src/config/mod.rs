//! Configuration module for yt-mcp.
//!
//! Handles loading application settings from TOML and the environment.

mod settings;

pub use settings::{
    DownloadSettings, GeneralSettings, Settings, ToolSettings, TranscriptSettings,
    DOWNLOAD_PATH_ENV,
};
