//! MCP (Model Context Protocol) server for yt-mcp.
//!
//! Lets AI assistants call the YouTube tools.
//! Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod server;

pub use server::McpServer;
