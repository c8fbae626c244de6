use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::mcp::tools::{
    parse_args, ExecutionContext, MCPTool, Permission, ToolCategory, ToolError, ToolResult,
    ToolResultBuilder,
};
use crate::structure::{enumerate, nest_under_segments};

/// Describe an existing directory tree
pub struct ProjectStructureTool;

#[derive(Debug, Deserialize)]
struct ProjectStructureArgs {
    directory: String,
}

#[async_trait]
impl MCPTool for ProjectStructureTool {
    fn name(&self) -> &str {
        "get_project_structure"
    }

    fn description(&self) -> &str {
        "Return the directory tree under a path; files are marked \"file\" and hidden directories are skipped"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to describe"
                }
            },
            "required": ["directory"]
        })
    }

    fn required_permissions(&self) -> Vec<Permission> {
        vec![Permission::FileRead]
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Project
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolResult, ToolError> {
        let args: ProjectStructureArgs = parse_args(params)?;
        let root = context.resolve_path(&args.directory);
        let requested = PathBuf::from(&args.directory);

        let tree = tokio::task::spawn_blocking(move || enumerate(&root))
            .await
            .map_err(|e| ToolError::Internal(format!("Enumeration task failed: {}", e)))?;

        let tree = match tree {
            Ok(tree) => nest_under_segments(&requested, tree),
            Err(e) => return Ok(ToolResult::failure(e.to_string())),
        };

        let value = serde_json::to_value(&tree)
            .map_err(|e| ToolError::Internal(format!("Failed to serialize structure: {}", e)))?;
        Ok(ToolResult::success().with_structured(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::SessionPermissions;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_project_structure_tool() {
        let temp_dir = TempDir::new().unwrap();
        let app = temp_dir.path().join("proj/app");
        std::fs::create_dir_all(app.join(".git")).unwrap();
        std::fs::write(app.join("main.rs"), "fn main() {}").unwrap();
        std::fs::write(app.join(".env"), "X=1").unwrap();
        let context = ExecutionContext::new(temp_dir.path(), SessionPermissions::default());

        let result = ProjectStructureTool
            .execute(json!({ "directory": "proj/app" }), &context)
            .await
            .unwrap();

        assert!(!result.is_error);
        assert_eq!(
            result.structured_content.unwrap(),
            json!({ "proj": { "app": { "main.rs": "file", ".env": "file" } } })
        );
    }

    #[tokio::test]
    async fn test_project_structure_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let context = ExecutionContext::new(temp_dir.path(), SessionPermissions::default());

        let result = ProjectStructureTool
            .execute(json!({ "directory": "nowhere" }), &context)
            .await
            .unwrap();
        assert!(result.is_error);
    }
}
