//! MCP server command.

use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::mcp::McpServer;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Run the MCP server on stdio.
pub async fn run_serve(settings: Settings) -> Result<()> {
    info!("Default output directory: {}", settings.output_dir().display());

    let dispatcher = Dispatcher::from_settings(&settings)?;
    let server = McpServer::new(Arc::new(dispatcher));
    server.run().await
}
