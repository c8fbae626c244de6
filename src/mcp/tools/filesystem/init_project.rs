use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::mcp::tools::{
    parse_args, Content, ExecutionContext, MCPTool, Permission, ToolCategory, ToolError,
    ToolResult, ToolResultBuilder,
};
use crate::paths::ensure_writable_dir;
use crate::structure::{materialize, ProjectNode};

/// Create a project directory tree from a nested description
pub struct InitProjectTool;

#[derive(Debug, Deserialize)]
struct InitProjectArgs {
    name: String,
    #[serde(default = "default_path")]
    path: String,
    structure: Value,
}

fn default_path() -> String {
    ".".to_string()
}

#[async_trait]
impl MCPTool for InitProjectTool {
    fn name(&self) -> &str {
        "init_project"
    }

    fn description(&self) -> &str {
        "Create a project under <path>/<name> from a nested structure: \
         objects are directories, strings are file contents"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Project directory name"
                },
                "path": {
                    "type": "string",
                    "description": "Directory the project is created in",
                    "default": "."
                },
                "structure": {
                    "type": "object",
                    "description": "Nested mapping of names to file contents or sub-mappings"
                }
            },
            "required": ["name", "structure"]
        })
    }

    fn required_permissions(&self) -> Vec<Permission> {
        vec![Permission::FileWrite]
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Project
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolResult, ToolError> {
        let args: InitProjectArgs = parse_args(params)?;
        let base_dir = context.resolve_path(&args.path);

        let outcome = tokio::task::spawn_blocking(move || create_project(base_dir, &args))
            .await
            .map_err(|e| ToolError::Internal(format!("Project task failed: {}", e)))?;

        match outcome {
            Ok(target) => Ok(ToolResult::success().with_content(Content::Text {
                text: format!("✅ Project created at {}", target.display()),
            })),
            Err(message) => {
                warn!("init_project failed: {}", message);
                Ok(ToolResult::failure(format!("❌ Error: {}", message)))
            }
        }
    }
}

fn create_project(base_dir: PathBuf, args: &InitProjectArgs) -> Result<PathBuf, String> {
    if args.name.trim().is_empty() {
        return Err("Project name cannot be empty".to_string());
    }

    let tree = ProjectNode::from_value(&args.structure).map_err(|e| e.to_string())?;
    if !matches!(tree, ProjectNode::Directory(_)) {
        return Err("Project structure must be an object".to_string());
    }

    let base_dir = ensure_writable_dir(&base_dir).map_err(|e| e.to_string())?;
    let target = base_dir.join(&args.name);
    let written = materialize(&target, &tree).map_err(|e| e.to_string())?;

    info!("Created project {} ({} files)", target.display(), written);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::SessionPermissions;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_project_tool() {
        let temp_dir = TempDir::new().unwrap();
        let context = ExecutionContext::new(temp_dir.path(), SessionPermissions::default());

        let result = InitProjectTool
            .execute(
                json!({
                    "name": "demo",
                    "path": "workspace",
                    "structure": {
                        "README.md": "# Demo",
                        "src": { "main.py": "print('hi')" }
                    }
                }),
                &context,
            )
            .await
            .unwrap();

        let project = temp_dir.path().join("workspace/demo");
        assert!(!result.is_error);
        assert_eq!(result.text(), format!("✅ Project created at {}", project.display()));
        assert_eq!(std::fs::read_to_string(project.join("README.md")).unwrap(), "# Demo");
        assert_eq!(
            std::fs::read_to_string(project.join("src/main.py")).unwrap(),
            "print('hi')"
        );
    }

    #[tokio::test]
    async fn test_init_project_rejects_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let context = ExecutionContext::new(temp_dir.path(), SessionPermissions::default());

        let result = InitProjectTool
            .execute(
                json!({ "name": "demo", "structure": { "empty.txt": "   " } }),
                &context,
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.text().starts_with("❌ Error:"));
        assert!(!temp_dir.path().join("demo").exists());
    }

    #[test]
    fn test_tool_metadata() {
        assert_eq!(InitProjectTool.category(), ToolCategory::Project);
        assert!(InitProjectTool.required_permissions().contains(&Permission::FileWrite));
    }
}
