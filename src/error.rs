//! Error types for yt-mcp.

use serde::Serialize;
use thiserror::Error;

/// Library-level error type for yt-mcp operations.
#[derive(Error, Debug)]
pub enum YtError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid video URL or identifier")]
    InvalidReference,

    #[error("{0}")]
    InvalidOutputPath(String),

    #[error("Failed to get video info: {0}")]
    MediaSource(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("FFmpeg error: {0}")]
    Transcode(String),

    #[error("Failed to get transcript: {0}")]
    Captions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Category reported to the caller of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownOperation,
    InvalidParameters,
    OperationFailed,
    InternalError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnknownOperation => write!(f, "unknown_operation"),
            ErrorKind::InvalidParameters => write!(f, "invalid_parameters"),
            ErrorKind::OperationFailed => write!(f, "operation_failed"),
            ErrorKind::InternalError => write!(f, "internal_error"),
        }
    }
}

impl YtError {
    /// Map this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            YtError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            YtError::InvalidParameters(_) => ErrorKind::InvalidParameters,
            YtError::Internal(_) | YtError::Json(_) | YtError::Config(_) => {
                ErrorKind::InternalError
            }
            _ => ErrorKind::OperationFailed,
        }
    }
}

/// Result type alias for yt-mcp operations.
pub type Result<T> = std::result::Result<T, YtError>;
