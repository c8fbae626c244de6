/// MCP Tools module - tool trait, execution context and result types
///
/// Every tool exposed by the server implements [`MCPTool`]; the
/// [`ToolRegistry`] owns them and routes `tools/call` requests by name.

pub mod command;
pub mod filesystem;
pub mod registry;

pub use self::registry::ToolRegistry;
pub use crate::mcp::errors::ToolError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Core trait that all MCP tools must implement
#[async_trait]
pub trait MCPTool: Send + Sync {
    /// Get the tool name (unique identifier)
    fn name(&self) -> &str;

    /// Get the tool description for documentation
    fn description(&self) -> &str;

    /// Get the JSON schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool with given parameters and context
    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolResult, ToolError>;

    /// Get required permissions for this tool
    fn required_permissions(&self) -> Vec<Permission> {
        vec![]
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::General
    }
}

/// Tool execution context
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Identifier of this tool invocation, used in logs
    pub execution_id: String,

    /// Directory that relative paths are resolved against
    pub working_directory: PathBuf,

    /// Permissions granted to the connected client
    pub permissions: SessionPermissions,
}

impl ExecutionContext {
    pub fn new(working_directory: impl Into<PathBuf>, permissions: SessionPermissions) -> Self {
        Self {
            execution_id: uuid::Uuid::new_v4().to_string(),
            working_directory: working_directory.into(),
            permissions,
        }
    }

    /// Absolute, normalized form of a path argument
    pub fn resolve_path(&self, raw: impl AsRef<Path>) -> PathBuf {
        crate::paths::resolve(&self.working_directory, raw)
    }
}

/// Tool execution result, serialized as an MCP `CallToolResult`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<Content>,

    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,

    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

/// Content types that tools can return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Text of every content item, joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                Content::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Tool categories for organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolCategory {
    General,
    FileSystem,
    Project,
    Process,
}

/// Permission types for tool access control
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Read files from filesystem
    FileRead,
    /// Create, modify or delete files
    FileWrite,
    /// Execute shell commands
    Execute,
}

/// Permissions granted to a client session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPermissions {
    pub granted_permissions: HashSet<Permission>,
}

impl SessionPermissions {
    pub fn read_only() -> Self {
        Self {
            granted_permissions: [Permission::FileRead].into_iter().collect(),
        }
    }

    pub fn without(mut self, permission: &Permission) -> Self {
        self.granted_permissions.remove(permission);
        self
    }

    pub fn allows(&self, permission: &Permission) -> bool {
        self.granted_permissions.contains(permission)
    }
}

impl Default for SessionPermissions {
    fn default() -> Self {
        Self {
            granted_permissions: [Permission::FileRead, Permission::FileWrite, Permission::Execute]
                .into_iter()
                .collect(),
        }
    }
}

/// Deserialize tool arguments, applying serde defaults for omitted fields
pub fn parse_args<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, ToolError> {
    serde_json::from_value(params).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

/// Helper trait for creating tool results
pub trait ToolResultBuilder {
    fn success() -> ToolResult;
    fn failure(error: impl Into<String>) -> ToolResult;
    fn with_content(self, content: Content) -> ToolResult;
    fn with_structured(self, value: Value) -> ToolResult;
}

impl ToolResultBuilder for ToolResult {
    fn success() -> ToolResult {
        ToolResult::default()
    }

    fn failure(error: impl Into<String>) -> ToolResult {
        ToolResult {
            content: vec![Content::Text { text: error.into() }],
            structured_content: None,
            is_error: true,
        }
    }

    fn with_content(mut self, content: Content) -> ToolResult {
        self.content.push(content);
        self
    }

    /// Attach a structured object, mirrored as pretty JSON text
    fn with_structured(mut self, value: Value) -> ToolResult {
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        self.content.push(Content::Text { text });
        self.structured_content = Some(value);
        self
    }
}
