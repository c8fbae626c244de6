use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::file_ops::delete_path;
use crate::mcp::tools::{
    parse_args, ExecutionContext, MCPTool, Permission, ToolCategory, ToolError, ToolResult,
    ToolResultBuilder,
};

/// Delete a file, or a directory and everything under it
pub struct DeletePathTool;

#[derive(Debug, Deserialize)]
struct DeleteArgs {
    path: String,
}

#[async_trait]
impl MCPTool for DeletePathTool {
    fn name(&self) -> &str {
        "delete_path"
    }

    fn description(&self) -> &str {
        "Delete a file or directory (directories are removed recursively)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file or directory to delete"
                }
            },
            "required": ["path"]
        })
    }

    fn required_permissions(&self) -> Vec<Permission> {
        vec![Permission::FileWrite]
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileSystem
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolResult, ToolError> {
        let args: DeleteArgs = parse_args(params)?;

        match delete_path(&args.path, &context.working_directory).await {
            Ok(_) => Ok(ToolResult::success()),
            Err(e) => Ok(ToolResult::failure(e.to_string())),
        }
    }
}
