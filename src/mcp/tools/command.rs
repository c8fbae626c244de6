use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::mcp::tools::{
    parse_args, ExecutionContext, MCPTool, Permission, ToolCategory, ToolError, ToolResult,
    ToolResultBuilder,
};

/// Run a shell command and capture its output
pub struct ExecuteCommandTool;

#[derive(Debug, Deserialize)]
struct ExecuteCommandArgs {
    #[serde(default)]
    command: String,
}

#[async_trait]
impl MCPTool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Run a shell command in the working directory and return its stdout and stderr"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command line passed to the system shell"
                }
            },
            "required": ["command"]
        })
    }

    fn required_permissions(&self) -> Vec<Permission> {
        vec![Permission::Execute]
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Process
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolResult, ToolError> {
        let args: ExecuteCommandArgs = parse_args(params)?;
        let command = args.command.trim();

        if command.is_empty() {
            return Ok(error_result(json!({ "error": "No command provided" })));
        }

        info!("Executing command [{}]: {}", context.execution_id, command);

        let output = match shell(command)
            .current_dir(&context.working_directory)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to spawn command '{}': {}", command, e);
                return Ok(error_result(json!({
                    "error": format!("Failed to execute command '{}': {}", command, e)
                })));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            return Ok(ToolResult::success().with_structured(json!({
                "output": stdout,
                "error": stderr
            })));
        }

        // killed by a signal: no exit code
        let exit_code = output.status.code().unwrap_or(-1);
        warn!("Command '{}' exited with status {}", command, exit_code);

        Ok(error_result(json!({
            "error": format!("Command '{}' returned non-zero exit status {}.", command, exit_code),
            "output": stdout,
            "stderr": stderr,
            "exit_code": exit_code
        })))
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

fn error_result(value: Value) -> ToolResult {
    let mut result = ToolResult::success().with_structured(value);
    result.is_error = true;
    result
}
