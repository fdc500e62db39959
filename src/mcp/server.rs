//! MCP server implementation.

use super::protocol::*;
use crate::dispatch::{Dispatcher, InvocationOutcome};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "mcp-youtube";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How handling of one request ended.
enum Flow {
    Respond(Option<JsonRpcResponse>),
    Stop,
}

/// MCP server exposing the yt-mcp tools.
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Serve stdin/stdout until EOF or Ctrl-C.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!(
            "YouTube MCP server running on stdio ({} tools)",
            self.dispatcher.registry().list().len()
        );

        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, shutting down");
            }
        };

        self.serve(tokio::io::stdin(), tokio::io::stdout(), shutdown)
            .await
    }

    /// Serve newline-delimited JSON-RPC from `input` to `output`.
    ///
    /// Requests are handled one at a time. Lines arriving meanwhile are queued;
    /// EOF or `shutdown` abandons the request in flight.
    pub async fn serve<R, W, S>(&self, input: R, mut output: W, shutdown: S) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let mut lines = BufReader::new(input).lines();
        let mut backlog = VecDeque::new();
        tokio::pin!(shutdown);

        loop {
            let line = match backlog.pop_front() {
                Some(line) => line,
                None => tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    next = lines.next_line() => match next? {
                        Some(line) => line,
                        None => break,
                    },
                },
            };

            if line.trim().is_empty() {
                continue;
            }

            let flow = {
                let handling = self.handle_line(&line);
                tokio::pin!(handling);
                watch_input(handling, &mut lines, &mut backlog, &mut shutdown).await?
            };

            match flow {
                Flow::Respond(Some(response)) => {
                    let mut json = serde_json::to_string(&response)?;
                    json.push('\n');
                    output.write_all(json.as_bytes()).await?;
                    output.flush().await?;
                }
                Flow::Respond(None) => {}
                Flow::Stop => break,
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Handle one raw line. Returns `None` for notifications.
    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Some(JsonRpcResponse::error(Value::Null, PARSE_ERROR, "Parse error"));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid Request: {}", e),
                ))
            }
        };

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                "Invalid Request: jsonrpc must be \"2.0\"",
            ));
        }

        Some(self.handle_request(id, request).await)
    }

    async fn handle_request(&self, id: Value, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Request: {}", request.method);

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        respond(id, result)
    }

    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        let tools = self
            .dispatcher
            .registry()
            .list()
            .iter()
            .map(|d| Tool {
                name: d.name.clone(),
                description: d.description.clone(),
                input_schema: d.input_schema(),
            })
            .collect();

        respond(id, ToolsListResult { tools })
    }

    async fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid params: {}", e),
                    )
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        match self
            .dispatcher
            .dispatch(&params.name, params.arguments.as_ref())
            .await
        {
            InvocationOutcome::Success { payload, metadata } => {
                respond(id, ToolCallResult::text(payload, metadata))
            }
            InvocationOutcome::Failure { kind, message } => {
                JsonRpcResponse::tool_error(id, kind, message)
            }
        }
    }
}

/// Drive `handling` to completion while queueing any lines that arrive.
async fn watch_input<F, R, S>(
    mut handling: std::pin::Pin<&mut F>,
    lines: &mut Lines<BufReader<R>>,
    backlog: &mut VecDeque<String>,
    shutdown: &mut std::pin::Pin<&mut S>,
) -> anyhow::Result<Flow>
where
    F: Future<Output = Option<JsonRpcResponse>>,
    R: AsyncRead + Unpin,
    S: Future<Output = ()>,
{
    loop {
        tokio::select! {
            biased;
            response = &mut handling => return Ok(Flow::Respond(response)),
            _ = shutdown.as_mut() => {
                warn!("Shutdown requested, abandoning request in flight");
                return Ok(Flow::Stop);
            }
            next = lines.next_line() => match next? {
                Some(line) => backlog.push_back(line),
                None => {
                    warn!("Input closed, abandoning request in flight");
                    return Ok(Flow::Stop);
                }
            },
        }
    }
}

fn respond(id: Value, result: impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::Stubs;
    use tokio::io::{split, AsyncWriteExt};

    /// Send raw lines, collect `expected` responses, then close the input.
    async fn exchange(requests: &[&str], expected: usize) -> Vec<Value> {
        let stubs = Stubs::new();
        let server = McpServer::new(Arc::new(stubs.dispatcher("/tmp/unused")));

        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = split(server_io);
        let (client_read, mut client_write) = split(client);

        let handle = tokio::spawn(async move {
            server
                .serve(server_read, server_write, std::future::pending())
                .await
        });

        for request in requests {
            client_write.write_all(request.as_bytes()).await.unwrap();
            client_write.write_all(b"\n").await.unwrap();
        }

        let mut lines = BufReader::new(client_read).lines();
        let mut responses = Vec::new();
        for _ in 0..expected {
            let line = lines.next_line().await.unwrap().unwrap();
            responses.push(serde_json::from_str(&line).unwrap());
        }

        client_write.shutdown().await.unwrap();
        handle.await.unwrap().unwrap();
        assert!(lines.next_line().await.unwrap().is_none(), "unexpected extra response");

        responses
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let responses = exchange(
            &[
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"0"}}}"#,
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            ],
            2,
        )
        .await;

        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], SERVER_NAME);

        let tools = responses[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        assert_eq!(tools[0]["name"], "get_video_info");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["url"]));
    }

    #[tokio::test]
    async fn test_tool_call_success() {
        let responses = exchange(
            &[r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"get_transcript","arguments":{"url":"dQw4w9WgXcQ"}}}"#],
            1,
        )
        .await;

        let content = &responses[0]["result"]["content"][0];
        assert_eq!(responses[0]["id"], "a");
        assert_eq!(content["type"], "text");
        assert_eq!(content["text"], "hello from en world");
        assert_eq!(content["metadata"]["tool"], "get_transcript");
    }

    #[tokio::test]
    async fn test_tool_call_failures() {
        let responses = exchange(
            &[
                r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"download_video","arguments":{}}}"#,
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_video_info","arguments":{"url":"bad"}}}"#,
            ],
            3,
        )
        .await;

        assert_eq!(responses[0]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses[0]["error"]["data"]["kind"], "unknown_operation");
        assert_eq!(responses[1]["error"]["code"], INVALID_PARAMS);
        assert_eq!(responses[1]["error"]["data"]["kind"], "invalid_parameters");
        assert_eq!(responses[2]["error"]["code"], INTERNAL_ERROR);
        assert_eq!(responses[2]["error"]["data"]["kind"], "operation_failed");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let responses = exchange(
            &[
                "{not json",
                r#"{"jsonrpc":"2.0","id":5}"#,
                r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#,
                r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#,
            ],
            4,
        )
        .await;

        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], INVALID_REQUEST);
        assert_eq!(responses[1]["id"], 5);
        assert_eq!(responses[2]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses[3]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let stubs = Stubs::new();
        let server = McpServer::new(Arc::new(stubs.dispatcher("/tmp/unused")));
        let (_client, server_io) = tokio::io::duplex(1024);
        let (server_read, server_write) = split(server_io);

        server
            .serve(server_read, server_write, async {})
            .await
            .unwrap();
    }
}
