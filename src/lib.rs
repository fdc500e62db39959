//! yt-mcp - YouTube tools over the Model Context Protocol
//!
//! An MCP server that lets AI assistants fetch video metadata, download full
//! videos or audio, cut time slices, and read caption transcripts.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `registry` - Tool descriptors and parameter schemas
//! - `dispatch` - Tool lookup, validation and error categorization
//! - `media` - Media operations over yt-dlp, ffmpeg and YouTube captions
//! - `mcp` - JSON-RPC 2.0 transport over stdio
//!
//! # Example
//!
//! ```rust,no_run
//! use yt_mcp::config::Settings;
//! use yt_mcp::dispatch::{Dispatcher, InvocationOutcome};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let dispatcher = Dispatcher::from_settings(&settings)?;
//!
//!     let args = json!({ "url": "dQw4w9WgXcQ", "language": "en" });
//!     if let InvocationOutcome::Success { payload, .. } =
//!         dispatcher.dispatch("get_transcript", Some(&args)).await
//!     {
//!         println!("{}", payload);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mcp;
pub mod media;
pub mod registry;

pub use error::{ErrorKind, Result, YtError};
