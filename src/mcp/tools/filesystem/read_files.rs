use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::file_reader::{read_many, ReadOptions};
use crate::mcp::tools::{
    parse_args, ExecutionContext, MCPTool, Permission, ToolCategory, ToolError, ToolResult,
    ToolResultBuilder,
};

/// Read files and directories in one batch
pub struct ReadFilesTool;

#[derive(Debug, Deserialize)]
struct ReadFilesArgs {
    paths: Vec<String>,
    #[serde(default = "default_max_size_mb")]
    max_size_mb: f64,
    #[serde(default)]
    include_binary: bool,
    #[serde(default = "default_recursive")]
    recursive: bool,
}

fn default_max_size_mb() -> f64 {
    1.0
}

fn default_recursive() -> bool {
    true
}

#[async_trait]
impl MCPTool for ReadFilesTool {
    fn name(&self) -> &str {
        "read_files"
    }

    fn description(&self) -> &str {
        "Read the contents of files and directories, with metadata for every file"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "paths": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Files or directories to read"
                },
                "max_size_mb": {
                    "type": "number",
                    "description": "Files larger than this are skipped",
                    "default": 1.0
                },
                "include_binary": {
                    "type": "boolean",
                    "description": "Return binary files as base64",
                    "default": false
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Descend into subdirectories",
                    "default": true
                }
            },
            "required": ["paths"]
        })
    }

    fn required_permissions(&self) -> Vec<Permission> {
        vec![Permission::FileRead]
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileSystem
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolResult, ToolError> {
        let args: ReadFilesArgs = parse_args(params)?;

        if args.paths.is_empty() {
            let mut result = ToolResult::success()
                .with_structured(json!({ "status": "error", "message": "No paths provided." }));
            result.is_error = true;
            return Ok(result);
        }

        let options = ReadOptions::from_megabytes(args.max_size_mb, args.include_binary, args.recursive);
        let base_dir = context.working_directory.clone();
        let paths = args.paths;

        let report = tokio::task::spawn_blocking(move || read_many(&paths, &options, &base_dir))
            .await
            .map_err(|e| ToolError::Internal(format!("Read task failed: {}", e)))?;

        debug!(
            "read_files returned {} files ({} ok)",
            report.file_count, report.success_count
        );

        let value = serde_json::to_value(&report)
            .map_err(|e| ToolError::Internal(format!("Failed to serialize read report: {}", e)))?;
        Ok(ToolResult::success().with_structured(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::SessionPermissions;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_files_tool() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), "alpha").unwrap();
        let context = ExecutionContext::new(temp_dir.path(), SessionPermissions::default());

        let result = ReadFilesTool
            .execute(json!({ "paths": ["a.txt", "missing.txt"] }), &context)
            .await
            .unwrap();

        assert!(!result.is_error);
        let report = result.structured_content.unwrap();
        assert_eq!(report["status"], "partial_success");
        assert_eq!(report["file_count"], 2);
        assert_eq!(report["success_count"], 1);
        assert_eq!(report["files"][0]["content"], "alpha");
        assert_eq!(report["errors"][0], "Path not found: missing.txt");
    }

    #[tokio::test]
    async fn test_read_files_empty_paths() {
        let context = ExecutionContext::new(std::env::temp_dir(), SessionPermissions::default());
        let result = ReadFilesTool.execute(json!({ "paths": [] }), &context).await.unwrap();

        assert!(result.is_error);
        assert_eq!(
            result.structured_content.unwrap(),
            json!({ "status": "error", "message": "No paths provided." })
        );
    }

    #[test]
    fn test_tool_metadata() {
        assert_eq!(ReadFilesTool.name(), "read_files");
        assert_eq!(ReadFilesTool.category(), ToolCategory::FileSystem);
        assert!(ReadFilesTool.required_permissions().contains(&Permission::FileRead));
    }
}
