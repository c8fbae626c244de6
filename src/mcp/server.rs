use serde_json::{json, Value};
/// MCP server - reads JSON-RPC requests from a transport and routes
/// `tools/*` calls to the tool registry.
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::mcp::{
    errors::{JsonRpcError, MCPError, MCPResult, ProtocolError, ServerError, TransportError},
    protocol::{
        InitializeParams, InitializeResult, MCPMessage, MCPRequest, ServerCapabilities,
        ServerInfo, ToolsCapability,
    },
    tools::{
        command::ExecuteCommandTool,
        filesystem::{
            DeletePathTool, InitProjectTool, ProjectStructureTool, ReadFilesTool, WriteFileTool,
        },
        ExecutionContext, SessionPermissions, ToolRegistry,
    },
    transport::MCPTransport,
    MCP_PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION,
};

/// MCP Server configuration
#[derive(Debug, Clone)]
pub struct MCPServerConfig {
    /// Directory relative tool paths are resolved against
    pub working_directory: PathBuf,

    /// Permissions granted to the connected client
    pub permissions: SessionPermissions,
}

impl Default for MCPServerConfig {
    fn default() -> Self {
        Self {
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            permissions: SessionPermissions::default(),
        }
    }
}

/// MCP Server implementation
pub struct MCPServer {
    config: MCPServerConfig,
    tool_registry: ToolRegistry,
}

impl MCPServer {
    /// Create a server with every built-in tool registered
    pub fn new(config: MCPServerConfig) -> MCPResult<Self> {
        let mut tool_registry = ToolRegistry::new();
        Self::register_builtin_tools(&mut tool_registry)?;

        info!(
            "MCP Server created with working directory: {}",
            config.working_directory.display()
        );
        Ok(Self {
            config,
            tool_registry,
        })
    }

    pub fn config(&self) -> &MCPServerConfig {
        &self.config
    }

    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    /// Serve one client until its input stream ends
    pub async fn serve(&self, mut transport: Box<dyn MCPTransport>) -> MCPResult<()> {
        info!("Serving {} v{} over {:?}", SERVER_NAME, SERVER_VERSION, transport.transport_type());
        let started = Instant::now();
        let mut handled: u64 = 0;

        loop {
            match transport.receive().await {
                Ok(message) => {
                    handled += 1;
                    if let Err(e) = self.handle_message(message, transport.as_mut()).await {
                        error!("Error handling message: {}", e);
                        if matches!(e, MCPError::Transport(_)) {
                            break;
                        }
                    }
                }
                Err(MCPError::Transport(TransportError::Closed)) => {
                    debug!("Client input closed");
                    break;
                }
                Err(e) => {
                    error!("Transport error: {}", e);
                    break;
                }
            }
        }

        transport.close().await?;
        info!(
            "Connection closed after {} messages (duration: {:?})",
            handled,
            started.elapsed()
        );
        Ok(())
    }

    /// Handle a single message
    async fn handle_message(&self, message: MCPMessage, transport: &mut dyn MCPTransport) -> MCPResult<()> {
        if message.is_request() {
            let request = message.as_request()?;
            let response = self.handle_request(request).await;
            transport.send(response).await?;
        } else if message.is_notification() {
            let notification = message.as_notification()?;
            debug!("Ignoring notification: {}", notification.method);
        } else {
            warn!("Received unexpected message type");
        }

        Ok(())
    }

    /// Answer a request; failures become JSON-RPC error responses
    pub(crate) async fn handle_request(&self, request: MCPRequest) -> MCPMessage {
        debug!("Request {}: {}", request.id, request.method);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_tool_call(request.params).await,
            _ => Err(MCPError::Protocol(ProtocolError::MethodNotFound(
                request.method.clone(),
            ))),
        };

        match response {
            Ok(result) => MCPMessage::response(request.id, Some(result)),
            Err(error) => {
                warn!("Request '{}' failed: {}", request.method, error);
                MCPMessage::error_response(request.id, JsonRpcError::from(error))
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, params: Option<Value>) -> MCPResult<Value> {
        if let Some(params) = params {
            let init_params: InitializeParams = serde_json::from_value(params)
                .map_err(|e| MCPError::Server(ServerError::InvalidParams(e.to_string())))?;
            info!(
                "Client {} {} connected (protocol {})",
                init_params.client_info.name,
                init_params.client_info.version,
                init_params.protocol_version
            );
        }

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            instructions: Some(
                "File, project scaffolding and shell tools. Relative paths resolve against the server's working directory."
                    .to_string(),
            ),
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_tools(&self) -> MCPResult<Value> {
        let tools = self.tool_registry.list_tools();
        Ok(json!({ "tools": tools }))
    }

    /// Handle tool call request
    async fn handle_tool_call(&self, params: Option<Value>) -> MCPResult<Value> {
        let params = params.ok_or_else(|| {
            MCPError::Server(ServerError::InvalidParams("Missing parameters".to_string()))
        })?;

        let tool_name = params["name"].as_str().ok_or_else(|| {
            MCPError::Server(ServerError::InvalidParams("Missing tool name".to_string()))
        })?;
        let tool_params = match params.get("arguments") {
            Some(Value::Null) | None => json!({}),
            Some(arguments) => arguments.clone(),
        };

        let context = ExecutionContext::new(
            self.config.working_directory.clone(),
            self.config.permissions.clone(),
        );

        let result = self
            .tool_registry
            .execute_tool(tool_name, tool_params, &context)
            .await?;

        Ok(serde_json::to_value(result)?)
    }

    /// Register built-in tools
    fn register_builtin_tools(registry: &mut ToolRegistry) -> MCPResult<()> {
        registry.register_tool(Box::new(ReadFilesTool))?;
        registry.register_tool(Box::new(WriteFileTool))?;
        registry.register_tool(Box::new(DeletePathTool))?;
        registry.register_tool(Box::new(InitProjectTool))?;
        registry.register_tool(Box::new(ProjectStructureTool))?;
        registry.register_tool(Box::new(ExecuteCommandTool))?;

        info!("Registered {} built-in tools", registry.len());
        Ok(())
    }
}
