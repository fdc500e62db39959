//! CLI module for yt-mcp.

pub mod commands;
mod output;

pub use output::{display_value, Output};

use clap::{Parser, Subcommand};

/// yt-mcp - YouTube tools over the Model Context Protocol
///
/// Serves video, audio and transcript tools to AI assistants over stdio.
/// Requires yt-dlp and ffmpeg on the PATH.
#[derive(Parser, Debug)]
#[command(name = "yt-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "YT_MCP_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP server on stdio (default)
    Serve,

    /// List the available tools and their parameters
    Tools,

    /// Invoke a single tool and print its result
    Call {
        /// Tool name (e.g., "get_video_info")
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["yt-mcp"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_call_args() {
        let cli = Cli::try_parse_from([
            "yt-mcp",
            "-vv",
            "call",
            "get_transcript",
            r#"{"url":"dQw4w9WgXcQ","language":"de"}"#,
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Call { tool, args }) => {
                assert_eq!(tool, "get_transcript");
                assert!(args.contains("\"de\""));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_call_default_args() {
        let cli = Cli::try_parse_from(["yt-mcp", "call", "get_video_info"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Call { ref args, .. }) if args == "{}"));
    }
}
