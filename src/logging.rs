//! Tracing subscriber setup.
//!
//! stdout carries protocol traffic, so logs go to stderr or to a file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE_NAME: &str = "filegen.log";

/// Filter from `RUST_LOG`, falling back to `default_level`
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber.
///
/// With a `log_dir`, output goes to a daily rolling file through a
/// non-blocking writer; the returned guard must live until shutdown or
/// buffered lines are lost.
pub fn init(default_level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = env_filter(default_level);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let installed = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init();
            installed.ok().map(|_| guard)
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .try_init();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_writes_rolling_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let guard = init("info", Some(temp_dir.path()));
        assert!(guard.is_some());

        tracing::warn!("file logging test line");
        drop(guard);

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(names.iter().any(|name| name.starts_with(LOG_FILE_NAME)));
    }
}
