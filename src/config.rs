//! Command line and environment configuration.

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;

use crate::mcp::tools::{Permission, SessionPermissions};
use crate::mcp::{MCPServerConfig, SERVER_NAME};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Working directory '{path}' is not usable: {source}")]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot locate the server executable: {0}")]
    Executable(#[source] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "filegen",
    version,
    about = "MCP server exposing file, project scaffolding and shell tools over stdio"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory relative tool paths are resolved against
    #[arg(long, global = true, env = "FILEGEN_WORKING_DIR")]
    pub working_dir: Option<PathBuf>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info", env = "FILEGEN_LOG_LEVEL")]
    pub log_level: String,

    /// Write logs to a daily rolling file in this directory instead of stderr
    #[arg(long, global = true, env = "FILEGEN_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Only allow reading tools
    #[arg(
        long,
        global = true,
        env = "FILEGEN_READ_ONLY",
        value_parser = BoolishValueParser::new()
    )]
    pub read_only: bool,

    /// Disable execute_command
    #[arg(
        long,
        global = true,
        env = "FILEGEN_DISABLE_COMMANDS",
        value_parser = BoolishValueParser::new()
    )]
    pub disable_commands: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,
    /// Print the mcpServers entry an MCP client needs to launch this server
    ClientConfig {
        /// Write the snippet to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

impl CliArgs {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }

    pub fn permissions(&self) -> SessionPermissions {
        if self.read_only {
            return SessionPermissions::read_only();
        }
        let permissions = SessionPermissions::default();
        if self.disable_commands {
            permissions.without(&Permission::Execute)
        } else {
            permissions
        }
    }

    /// Working directory as an absolute path, defaulting to the current directory
    pub fn working_directory(&self) -> Result<PathBuf, ConfigError> {
        let current = std::env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            path: PathBuf::from("."),
            source,
        })?;

        let directory = match &self.working_dir {
            Some(dir) => crate::paths::resolve(&current, dir),
            None => current,
        };

        if !directory.is_dir() {
            return Err(ConfigError::WorkingDirectory {
                path: directory,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }
        Ok(directory)
    }

    pub fn server_config(&self) -> Result<MCPServerConfig, ConfigError> {
        Ok(MCPServerConfig {
            working_directory: self.working_directory()?,
            permissions: self.permissions(),
        })
    }

    /// Flags that should be passed again when a client launches the server
    fn forwarded_args(&self) -> Vec<String> {
        let mut args = vec!["serve".to_string()];
        if self.read_only {
            args.push("--read-only".to_string());
        }
        if self.disable_commands {
            args.push("--disable-commands".to_string());
        }
        if self.log_level != "info" {
            args.push("--log-level".to_string());
            args.push(self.log_level.clone());
        }
        if let Some(log_dir) = &self.log_dir {
            args.push("--log-dir".to_string());
            args.push(log_dir.to_string_lossy().to_string());
        }
        args
    }
}

/// `mcpServers` snippet for MCP client configuration files
pub fn client_config(args: &CliArgs) -> Result<Value, ConfigError> {
    let executable = std::env::current_exe().map_err(ConfigError::Executable)?;
    let working_directory = args.working_directory()?;
    Ok(client_config_for(&executable, &working_directory, args.forwarded_args()))
}

fn client_config_for(executable: &std::path::Path, cwd: &std::path::Path, args: Vec<String>) -> Value {
    json!({
        "mcpServers": {
            SERVER_NAME: {
                "command": executable.to_string_lossy(),
                "args": args,
                "cwd": cwd.to_string_lossy()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    // parsing reads FILEGEN_* variables, which one test sets
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn try_parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("filegen").chain(args.iter().copied()))
    }

    fn parse(args: &[&str]) -> CliArgs {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        try_parse(args).unwrap()
    }

    fn parse_with_env(vars: &[(&str, &str)]) -> Result<CliArgs, clap::Error> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for (key, value) in vars {
            // SAFETY: every reader of these variables holds ENV_LOCK
            unsafe { std::env::set_var(key, value) };
        }
        let parsed = try_parse(&[]);
        for (key, _) in vars {
            unsafe { std::env::remove_var(key) };
        }
        parsed
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.command(), Commands::Serve);
        assert_eq!(args.log_level, "info");
        assert!(args.permissions().allows(&Permission::Execute));
    }

    #[test]
    fn test_permission_flags() {
        let read_only = parse(&["--read-only"]).permissions();
        assert!(read_only.allows(&Permission::FileRead));
        assert!(!read_only.allows(&Permission::FileWrite));
        assert!(!read_only.allows(&Permission::Execute));

        let no_commands = parse(&["serve", "--disable-commands"]).permissions();
        assert!(no_commands.allows(&Permission::FileWrite));
        assert!(!no_commands.allows(&Permission::Execute));
    }

    #[test]
    fn test_boolish_env_flags() {
        let args = parse_with_env(&[("FILEGEN_DISABLE_COMMANDS", "1")]).unwrap();
        assert!(args.disable_commands);
        assert!(!args.permissions().allows(&Permission::Execute));

        let args = parse_with_env(&[("FILEGEN_READ_ONLY", "yes")]).unwrap();
        assert!(args.read_only);
        assert!(!args.permissions().allows(&Permission::FileWrite));

        let args = parse_with_env(&[("FILEGEN_READ_ONLY", "0"), ("FILEGEN_DISABLE_COMMANDS", "off")])
            .unwrap();
        assert!(!args.read_only);
        assert!(!args.disable_commands);
    }

    #[test]
    fn test_client_config_subcommand() {
        let args = parse(&["client-config", "--output", "mcp.json"]);
        assert_eq!(
            args.command(),
            Commands::ClientConfig {
                output: Some(PathBuf::from("mcp.json"))
            }
        );
    }

    #[test]
    fn test_working_directory_must_exist() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().to_string_lossy().to_string();
        assert_eq!(parse(&["--working-dir", &dir]).working_directory().unwrap(), temp_dir.path());

        let missing = temp_dir.path().join("missing").to_string_lossy().to_string();
        assert!(parse(&["--working-dir", &missing]).working_directory().is_err());
    }

    #[test]
    fn test_client_config_shape() {
        let args = parse(&["--read-only"]);
        let value = client_config_for(Path::new("/usr/bin/filegen"), Path::new("/work"), args.forwarded_args());
        assert_eq!(
            value,
            json!({
                "mcpServers": {
                    "filegen": {
                        "command": "/usr/bin/filegen",
                        "args": ["serve", "--read-only"],
                        "cwd": "/work"
                    }
                }
            })
        );
    }
}
