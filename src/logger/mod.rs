//! Logger module
//!
//! Installs the `tracing` subscriber and provides the access log sink:
//! - Diagnostics go to stderr, filtered by `logging.level` or `RUST_LOG`
//! - Access lines use the `access` target and go to stdout or a file

mod format;

pub use format::AccessLogEntry;

use std::net::SocketAddr;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{Config, LoggingConfig};
use crate::error::{Result, ServerError};

/// Target used for access log events
pub const ACCESS_TARGET: &str = "access";

/// Keeps the non-blocking access log writer flushing; hold it until exit
#[derive(Debug)]
pub struct LoggerGuard {
    _access: Option<WorkerGuard>,
}

/// Initialize the global subscriber
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> Result<LoggerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{ACCESS_TARGET}=info", config.level)));

    let (access_writer, guard) = match config.access_log_file.as_deref() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_access_file(path)?);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|meta| meta.target() != ACCESS_TARGET));

    // Entries carry their own timestamp, so print the bare message
    let access_layer = fmt::layer()
        .with_writer(access_writer)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_filter(filter_fn(|meta| meta.target() == ACCESS_TARGET));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(access_layer)
        .try_init()
        .map_err(|e| ServerError::Logger(e.to_string()))?;

    Ok(LoggerGuard { _access: guard })
}

/// Open the access log for appending, creating parent directories
fn open_access_file(path: &str) -> Result<RollingFileAppender> {
    let path = Path::new(path);
    let file_name = path
        .file_name()
        .ok_or_else(|| ServerError::Logger(format!("invalid access log path '{}'", path.display())))?
        .to_string_lossy()
        .into_owned();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| ServerError::Logger(e.to_string()))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("SPA server started, listening on http://{addr}");
    tracing::info!("Static directory: {}", config.spa.static_dir);
    tracing::info!(
        "Fallback: non-{} paths -> {}",
        config.spa.api_prefix,
        config.spa.index_file
    );
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.access_log_file {
        tracing::info!("Access log: {path}");
    }
    tracing::info!("======================================");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}
