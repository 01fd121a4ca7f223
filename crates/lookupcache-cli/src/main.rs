//! lookupcache - keep lookup tables in sync with the backend from the shell.
//!
//! Each invocation starts a lookup store, dispatches the requested actions,
//! waits for every worker (including post-write reloads) to finish and
//! prints the resulting cache.

mod cli;
mod commands;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use lookupcache_core::Config;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr unless `log_file` is configured. The returned guard
/// flushes the file writer and must live until exit.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.log_file.as_deref().and_then(split_log_path) {
        Some((dir, file_name)) => {
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn split_log_path(path: &Path) -> Option<(&Path, &Path)> {
    let file_name = Path::new(path.file_name()?);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some((dir, file_name))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match cli::parse(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    // The log file comes from the config file only, so logging can start
    // before environment overrides are applied and report on them.
    let mut config = Config::load_stored()?;
    let _log_guard = init_tracing(&config);
    for ignored in config.apply_env_overrides(|name| std::env::var(name).ok()) {
        warn!("{}", ignored);
    }
    info!(command = ?invocation.command, "lookupcache starting");

    commands::run(invocation, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/lookupcache.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log"));
        assert_eq!(name, Path::new("lookupcache.log"));

        let (dir, name) = split_log_path(Path::new("lookupcache.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, Path::new("lookupcache.log"));

        assert!(split_log_path(Path::new("/")).is_none());
    }
}
