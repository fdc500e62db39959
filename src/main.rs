//! yt-mcp CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use yt_mcp::cli::{commands, Cli, Commands};
use yt_mcp::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging; stdout belongs to the protocol
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("yt_mcp={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Execute command
    match &cli.command {
        None | Some(Commands::Serve) => {
            commands::run_serve(settings).await?;
        }

        Some(Commands::Tools) => {
            commands::run_tools(&settings)?;
        }

        Some(Commands::Call { tool, args }) => {
            commands::run_call(tool, args, settings).await?;
        }

        Some(Commands::Doctor) => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Some(Commands::Config { action }) => {
            commands::run_config(action, &settings, &config_path)?;
        }
    }

    Ok(())
}
