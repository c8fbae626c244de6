use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::mcp::errors::{MCPError, MCPResult};
use crate::mcp::tools::{
    ExecutionContext, MCPTool, SessionPermissions, ToolError, ToolResult,
};

/// Tool registry for managing and executing MCP tools
pub struct ToolRegistry {
    /// Registered tools indexed by name
    tools: HashMap<String, RegisteredTool>,
}

struct RegisteredTool {
    tool: Box<dyn MCPTool>,
    schema: JSONSchema,
}

/// Tool information for MCP client discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register_tool(&mut self, tool: Box<dyn MCPTool>) -> MCPResult<()> {
        let name = tool.name().to_string();

        if name.is_empty() {
            return Err(MCPError::Validation("Tool name cannot be empty".to_string()));
        }
        if self.tools.contains_key(&name) {
            return Err(MCPError::Validation(format!("Tool '{}' is already registered", name)));
        }

        let input_schema = tool.input_schema();
        if !input_schema.is_object() {
            return Err(MCPError::Validation("Tool input schema must be a JSON object".to_string()));
        }
        let schema = JSONSchema::compile(&input_schema).map_err(|e| {
            MCPError::Validation(format!("Invalid input schema for '{}': {}", name, e))
        })?;

        debug!("Registered tool: {} ({:?})", name, tool.category());
        self.tools.insert(name, RegisteredTool { tool, schema });
        Ok(())
    }

    /// List all available tools, sorted by name
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        let mut tools: Vec<ToolInfo> = self
            .tools
            .values()
            .map(|entry| ToolInfo {
                name: entry.tool.name().to_string(),
                description: entry.tool.description().to_string(),
                input_schema: entry.tool.input_schema(),
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool with given parameters and context
    pub async fn execute_tool(
        &self,
        name: &str,
        params: Value,
        context: &ExecutionContext,
    ) -> Result<ToolResult, ToolError> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        Self::validate_params(&entry.schema, &params)?;

        Self::check_permissions(entry.tool.as_ref(), &context.permissions)?;

        let start_time = Instant::now();
        debug!("Executing tool: {} with ID: {}", name, context.execution_id);

        let result = entry.tool.execute(params, context).await;

        match &result {
            Ok(tool_result) if tool_result.is_error => {
                warn!(
                    "Tool {} ({}) reported an error after {:?}",
                    name,
                    context.execution_id,
                    start_time.elapsed()
                );
            }
            Ok(_) => {
                info!(
                    "Tool {} ({}) completed in {:?}",
                    name,
                    context.execution_id,
                    start_time.elapsed()
                );
            }
            Err(e) => {
                warn!("Tool {} ({}) failed: {}", name, context.execution_id, e);
            }
        }

        result
    }

    fn validate_params(schema: &JSONSchema, params: &Value) -> Result<(), ToolError> {
        if let Err(errors) = schema.validate(params) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(ToolError::InvalidParams(messages.join("; ")));
        }
        Ok(())
    }

    /// Check if session has required permissions for tool
    fn check_permissions(
        tool: &dyn MCPTool,
        session_permissions: &SessionPermissions,
    ) -> Result<(), ToolError> {
        for permission in tool.required_permissions() {
            if !session_permissions.allows(&permission) {
                return Err(ToolError::PermissionDenied(format!(
                    "Missing required permission: {:?}",
                    permission
                )));
            }
        }
        Ok(())
    }
}
