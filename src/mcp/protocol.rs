use crate::mcp::errors::{JsonRpcError, JsonRpcErrorCode, MCPError, MCPResult, ProtocolError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 message structure for MCP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPMessage {
    pub jsonrpc: String,
    /// `None` only when the key is absent; an explicit `null` id is kept
    #[serde(
        default,
        deserialize_with = "present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// Request message structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Notification message structure (no id, no response expected)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl MCPMessage {
    const JSONRPC_VERSION: &'static str = "2.0";

    /// Create a new response message
    pub fn response(id: Value, result: Option<Value>) -> Self {
        Self {
            jsonrpc: Self::JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: None,
            params: None,
            result,
            error: None,
        }
    }

    /// Create a new error response message
    pub fn error_response(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: Self::JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: None,
            params: None,
            result: None,
            error: Some(error),
        }
    }

    /// Create a new notification message
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Self::JSONRPC_VERSION.to_string(),
            id: None,
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    pub fn is_request(&self) -> bool {
        self.method.is_some() && self.id.is_some()
    }

    pub fn is_response(&self) -> bool {
        self.id.is_some()
            && self.method.is_none()
            && (self.result.is_some() || self.error.is_some())
    }

    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    /// Validate the message structure
    pub fn validate(&self) -> MCPResult<()> {
        if self.jsonrpc != Self::JSONRPC_VERSION {
            return Err(MCPError::Protocol(ProtocolError::InvalidMessage(format!(
                "Invalid JSON-RPC version: {}",
                self.jsonrpc
            ))));
        }

        if self.is_request() || self.is_notification() {
            if self.result.is_some() || self.error.is_some() {
                return Err(MCPError::Protocol(ProtocolError::InvalidMessage(
                    "Request or notification cannot have result or error fields".to_string(),
                )));
            }
        } else if self.is_response() {
            if self.params.is_some() {
                return Err(MCPError::Protocol(ProtocolError::InvalidMessage(
                    "Response message cannot have params field".to_string(),
                )));
            }
            if self.result.is_some() && self.error.is_some() {
                return Err(MCPError::Protocol(ProtocolError::InvalidMessage(
                    "Response cannot have both result and error".to_string(),
                )));
            }
        } else {
            return Err(MCPError::Protocol(ProtocolError::InvalidMessage(
                "Message does not match any valid type (request, response, notification)"
                    .to_string(),
            )));
        }

        Ok(())
    }

    /// Convert to typed request
    pub fn as_request(&self) -> MCPResult<MCPRequest> {
        match (&self.id, &self.method) {
            (Some(id), Some(method)) => Ok(MCPRequest {
                jsonrpc: self.jsonrpc.clone(),
                id: id.clone(),
                method: method.clone(),
                params: self.params.clone(),
            }),
            _ => Err(MCPError::Protocol(ProtocolError::InvalidMessage(
                "Message is not a request".to_string(),
            ))),
        }
    }

    /// Convert to typed notification
    pub fn as_notification(&self) -> MCPResult<MCPNotification> {
        match (&self.id, &self.method) {
            (None, Some(method)) => Ok(MCPNotification {
                jsonrpc: self.jsonrpc.clone(),
                method: method.clone(),
                params: self.params.clone(),
            }),
            _ => Err(MCPError::Protocol(ProtocolError::InvalidMessage(
                "Message is not a notification".to_string(),
            ))),
        }
    }
}

/// MCP protocol initialization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(rename = "clientInfo")]
    pub client_info: ClientInfo,
}

/// Client information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged", default)]
    pub list_changed: bool,
}

/// Server capabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

/// Server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Initialize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Protocol message parser
pub struct MessageParser;

impl MessageParser {
    /// Parse a message from JSON bytes
    pub fn parse_message(data: &[u8]) -> MCPResult<MCPMessage> {
        let message: MCPMessage = serde_json::from_slice(data)
            .map_err(|e| MCPError::Protocol(ProtocolError::ParseError(e.to_string())))?;

        message.validate()?;
        Ok(message)
    }

    /// Serialize a message to JSON bytes
    pub fn serialize_message(message: &MCPMessage) -> MCPResult<Vec<u8>> {
        message.validate()?;
        serde_json::to_vec(message)
            .map_err(|e| MCPError::Protocol(ProtocolError::InternalError(e.to_string())))
    }

    /// Build the error response owed to a line that could not be parsed.
    ///
    /// Lines that are not JSON at all get a parse error with a null id. Lines
    /// that are JSON but not a valid message are answered as invalid requests,
    /// echoing their id when one is present.
    pub fn rejection_for(data: &[u8], error: &MCPError) -> MCPMessage {
        match serde_json::from_slice::<Value>(data) {
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                MCPMessage::error_response(
                    id,
                    JsonRpcError::new(JsonRpcErrorCode::InvalidRequest, error.to_string()),
                )
            }
            Err(e) => MCPMessage::error_response(
                Value::Null,
                JsonRpcError::new(JsonRpcErrorCode::ParseError, e.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(method: &str) -> MCPMessage {
        MCPMessage {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: Some(method.to_string()),
            params: None,
            result: None,
            error: None,
        }
    }

    #[test]
    fn test_request_message() {
        let msg = request("tools/list");
        assert!(msg.is_request());
        assert!(!msg.is_response());
        assert!(!msg.is_notification());
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_notification_message() {
        let msg = MCPMessage::notification("notifications/initialized", None);
        assert!(msg.is_notification());
        assert!(msg.validate().is_ok());
        assert_eq!(msg.as_notification().unwrap().method, "notifications/initialized");
    }

    #[test]
    fn test_error_response_validates() {
        let msg = MCPMessage::error_response(
            Value::Null,
            JsonRpcError::new(JsonRpcErrorCode::ParseError, "bad"),
        );
        assert!(msg.is_response());
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_invalid_message() {
        let mut msg = request("tools/call");
        msg.result = Some(json!("invalid"));
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_message_parsing() {
        let json_data = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"read_files"}}"#;
        let message = MessageParser::parse_message(json_data.as_bytes()).unwrap();
        assert!(message.is_request());
        let request = message.as_request().unwrap();
        assert_eq!(request.method, "tools/call");
        assert_eq!(request.id, json!(1));
    }

    #[test]
    fn test_null_id_is_still_a_request() {
        let data = br#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#;
        let message = MessageParser::parse_message(data).unwrap();
        assert!(message.is_request());
        assert!(!message.is_notification());
        assert_eq!(message.as_request().unwrap().id, Value::Null);

        let reply = MCPMessage::response(message.id.clone().unwrap(), Some(json!({})));
        let bytes = MessageParser::serialize_message(&reply).unwrap();
        let echoed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(echoed, json!({"jsonrpc": "2.0", "id": null, "result": {}}));

        let without_id = MessageParser::parse_message(br#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert!(without_id.is_notification());
        assert_eq!(without_id.id, None);
    }

    #[test]
    fn test_rejection_for_garbage_is_parse_error() {
        let data = b"not json";
        let err = MessageParser::parse_message(data).unwrap_err();
        let rejection = MessageParser::rejection_for(data, &err);
        assert_eq!(rejection.id, Some(Value::Null));
        assert_eq!(rejection.error.unwrap().code, -32700);
    }

    #[test]
    fn test_rejection_echoes_id() {
        let data = br#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#;
        let err = MessageParser::parse_message(data).unwrap_err();
        let rejection = MessageParser::rejection_for(data, &err);
        assert_eq!(rejection.id, Some(json!(7)));
        assert_eq!(rejection.error.unwrap().code, -32600);
    }
}
