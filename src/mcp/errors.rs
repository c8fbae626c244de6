use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error handling for MCP server operations
pub type MCPResult<T> = Result<T, MCPError>;

/// Main error type for all MCP operations
#[derive(Debug, thiserror::Error)]
pub enum MCPError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Tool execution error: {0}")]
    ToolExecution(#[from] ToolError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Transport layer errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Transport closed")]
    Closed,
}

/// Protocol-level errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid JSON-RPC message: {0}")]
    InvalidMessage(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Tool execution errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Server operation errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

/// Standard JSON-RPC 2.0 error codes
#[derive(Debug, Clone, Copy)]
pub enum JsonRpcErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

/// JSON-RPC error response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: JsonRpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
        }
    }
}

impl From<MCPError> for JsonRpcError {
    fn from(error: MCPError) -> Self {
        match error {
            MCPError::Protocol(ProtocolError::MethodNotFound(msg)) => {
                JsonRpcError::new(JsonRpcErrorCode::MethodNotFound, msg)
            }
            MCPError::Server(ServerError::InvalidParams(msg)) => {
                JsonRpcError::new(JsonRpcErrorCode::InvalidParams, msg)
            }
            MCPError::Protocol(ProtocolError::ParseError(msg)) => {
                JsonRpcError::new(JsonRpcErrorCode::ParseError, msg)
            }
            MCPError::Protocol(ProtocolError::InvalidMessage(msg)) => {
                JsonRpcError::new(JsonRpcErrorCode::InvalidRequest, msg)
            }
            MCPError::ToolExecution(tool_error) => tool_error.into(),
            MCPError::Validation(msg) => JsonRpcError::new(JsonRpcErrorCode::InvalidParams, msg),
            _ => JsonRpcError::new(JsonRpcErrorCode::InternalError, error.to_string()),
        }
    }
}

impl From<ProtocolError> for JsonRpcError {
    fn from(error: ProtocolError) -> Self {
        MCPError::Protocol(error).into()
    }
}

impl From<ToolError> for JsonRpcError {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::NotFound(_) | ToolError::InvalidParams(_) => {
                JsonRpcError::new(JsonRpcErrorCode::InvalidParams, error.to_string())
            }
            _ => JsonRpcError::new(JsonRpcErrorCode::InternalError, error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_maps_to_invalid_params() {
        let error: JsonRpcError = ToolError::NotFound("nope".to_string()).into();
        assert_eq!(error.code, JsonRpcErrorCode::InvalidParams as i32);
        assert!(error.message.contains("nope"));
    }

    #[test]
    fn test_method_not_found_code() {
        let error: JsonRpcError = ProtocolError::MethodNotFound("foo/bar".to_string()).into();
        assert_eq!(error.code, -32601);
    }

    #[test]
    fn test_internal_errors_fall_through() {
        let error: JsonRpcError = MCPError::Transport(TransportError::Closed).into();
        assert_eq!(error.code, JsonRpcErrorCode::InternalError as i32);
    }
}
