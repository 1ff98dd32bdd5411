//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - File-based logging support
//!
//! Library code logs through the `log` macros; [`init`] routes them to the
//! configured targets.

mod format;
pub mod writer;

pub use format::{AccessLogEntry, AccessLogFormat};

use crate::config::Config;
use log::LevelFilter;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse().unwrap_or_else(|_| {
        eprintln!(
            "[WARN] Unknown log level '{}', using info",
            config.logging.level
        );
        LevelFilter::Info
    });

    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        level,
    )
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log::info!("======================================");
    log::info!("Filer started successfully");
    log::info!("Listening on: http://{addr}");
    log::info!("Serving: {}", config.assets.root);
    log::info!("Index file: {}", config.assets.index_file);
    log::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        log::info!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.access_log_file {
        log::info!("Access log: {path}");
    }
    if let Some(ref path) = config.logging.error_log_file {
        log::info!("Error log: {path}");
    }
    log::info!("======================================");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log::error!("Failed to serve connection: {err:?}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &AccessLogFormat) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}
