use async_trait::async_trait;
use serde_json::{json, Value};

use crate::file_ops::{write_file, WriteRequest, WriteResponse};
use crate::mcp::tools::{
    parse_args, ExecutionContext, MCPTool, Permission, ToolCategory, ToolError, ToolResult,
    ToolResultBuilder,
};

/// Write or append content to a single file
pub struct WriteFileTool;

#[async_trait]
impl MCPTool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write or append content to a file, optionally creating parent directories"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write (base64 when binary is set)"
                },
                "mode": {
                    "type": "string",
                    "enum": ["w", "a"],
                    "description": "'w' to overwrite, 'a' to append",
                    "default": "w"
                },
                "create_dirs": {
                    "type": "boolean",
                    "description": "Create parent directories if they don't exist",
                    "default": true
                },
                "encoding": {
                    "type": "string",
                    "description": "Text encoding: utf-8, ascii or latin-1",
                    "default": "utf-8"
                },
                "overwrite_protection": {
                    "type": "boolean",
                    "description": "Refuse to overwrite an existing file",
                    "default": false
                },
                "binary": {
                    "type": "boolean",
                    "description": "Treat content as base64-encoded bytes",
                    "default": false
                }
            },
            "required": ["path", "content"]
        })
    }

    fn required_permissions(&self) -> Vec<Permission> {
        vec![Permission::FileWrite]
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileSystem
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolResult, ToolError> {
        let request: WriteRequest = parse_args(params)?;

        let response = WriteResponse::from(write_file(&request, &context.working_directory).await);
        let is_error = matches!(response, WriteResponse::Error(_));

        let value = serde_json::to_value(&response)
            .map_err(|e| ToolError::Internal(format!("Failed to serialize write result: {}", e)))?;
        let mut result = ToolResult::success().with_structured(value);
        result.is_error = is_error;
        Ok(result)
    }
}
