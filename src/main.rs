use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use filegen::config::{client_config, CliArgs, Commands};
use filegen::logging;
use filegen::mcp::{MCPServer, StdioTransport};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = CliArgs::parse();
    let _log_guard = logging::init(&args.log_level, args.log_dir.as_deref());

    let outcome = match args.command() {
        Commands::Serve => serve(&args).await,
        Commands::ClientConfig { output } => write_client_config(&args, output.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            eprintln!("filegen: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn serve(args: &CliArgs) -> Result<(), String> {
    let config = args.server_config().map_err(|e| e.to_string())?;
    let server = MCPServer::new(config).map_err(|e| e.to_string())?;

    info!("Starting filegen MCP server on stdio");
    server
        .serve(Box::new(StdioTransport::new()))
        .await
        .map_err(|e| e.to_string())
}

fn write_client_config(args: &CliArgs, output: Option<&std::path::Path>) -> Result<(), String> {
    let snippet = client_config(args).map_err(|e| e.to_string())?;
    let text = serde_json::to_string_pretty(&snippet).map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", text))
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            info!("Client configuration written to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
