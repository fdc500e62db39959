//! MCP protocol types (JSON-RPC 2.0).

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC code reported for a tool failure category.
pub fn error_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::UnknownOperation => METHOD_NOT_FOUND,
        ErrorKind::InvalidParameters => INVALID_PARAMS,
        ErrorKind::OperationFailed | ErrorKind::InternalError => INTERNAL_ERROR,
    }
}

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Requests without an id are notifications and get no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Error response for a failed tool call, tagged with its category.
    pub fn tool_error(id: Value, kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut response = Self::error(id, error_code(kind), message);
        if let Some(error) = response.error.as_mut() {
            error.data = Some(json!({ "kind": kind }));
        }
        response
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP Initialize response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Tool definition.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tools list response.
#[derive(Debug, Serialize)]
pub struct ToolsListResult {
    pub tools: Vec<Tool>,
}

/// Tool call request params.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Tool call response.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<Map<String, Value>>,
    },
}

impl ToolCallResult {
    pub fn text(text: String, metadata: Map<String, Value>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text,
                metadata: Some(metadata),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_carries_kind() {
        let response = JsonRpcResponse::tool_error(json!(7), ErrorKind::InvalidParameters, "bad");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], INVALID_PARAMS);
        assert_eq!(value["error"]["data"]["kind"], "invalid_parameters");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(error_code(ErrorKind::UnknownOperation), METHOD_NOT_FOUND);
        assert_eq!(error_code(ErrorKind::OperationFailed), INTERNAL_ERROR);
        assert_eq!(error_code(ErrorKind::InternalError), INTERNAL_ERROR);
    }

    #[test]
    fn test_text_content_shape() {
        let mut metadata = Map::new();
        metadata.insert("tool".into(), json!("get_transcript"));
        let value = serde_json::to_value(ToolCallResult::text("hi".into(), metadata)).unwrap();

        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "hi");
        assert_eq!(value["content"][0]["metadata"]["tool"], "get_transcript");
    }
}
