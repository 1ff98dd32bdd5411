//! Log writer module
//!
//! Thread-safe log writing to files or stdout/stderr. The writer is installed
//! as the `log` backend: info and below go to the access target, warnings and
//! errors to the error target.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl LogTarget {
    fn open(path: Option<&str>, default: Self) -> io::Result<Self> {
        match path {
            Some(p) => Ok(Self::File(Mutex::new(open_log_file(p)?))),
            None => Ok(default),
        }
    }

    fn write_line(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{message}");
                }
            }
        }
    }

    fn flush(&self) {
        match self {
            Self::Stdout => {
                let _ = io::stdout().flush();
            }
            Self::Stderr => {}
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = f.flush();
                }
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    access: LogTarget,
    error: LogTarget,
    level: LevelFilter,
}

impl LogWriter {
    fn new(
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
        level: LevelFilter,
    ) -> io::Result<Self> {
        Ok(Self {
            access: LogTarget::open(access_log_file, LogTarget::Stdout)?,
            error: LogTarget::open(error_log_file, LogTarget::Stderr)?,
            level,
        })
    }

    /// Write a preformatted line to the access log
    pub fn write_access(&self, message: &str) {
        self.access.write_line(message);
    }
}

impl Log for LogWriter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_record(record);
        match record.level() {
            Level::Error | Level::Warn => self.error.write_line(&line),
            Level::Info | Level::Debug | Level::Trace => self.access.write_line(&line),
        }
    }

    fn flush(&self) {
        self.access.flush();
        self.error.flush();
    }
}

fn format_record(record: &Record<'_>) -> String {
    format!(
        "{} [{}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.args()
    )
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer and install it as the `log` backend
///
/// Returns error if log files cannot be opened or a logger is already set.
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    level: LevelFilter,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, level)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })?;

    if let Some(writer) = LOG_WRITER.get() {
        log::set_logger(writer)
            .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_rejected() {
        let _ = init(None, None, LevelFilter::Error);
        let err = init(None, None, LevelFilter::Error).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(get().is_some());
    }

    #[test]
    fn test_file_targets_split_by_level() {
        let dir = tempfile::tempdir().unwrap();
        let access = dir.path().join("logs/access.log");
        let error = dir.path().join("logs/error.log");
        let writer = LogWriter::new(
            Some(access.to_str().unwrap()),
            Some(error.to_str().unwrap()),
            LevelFilter::Info,
        )
        .unwrap();

        writer.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("served /index.html"))
                .build(),
        );
        writer.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("traversal blocked"))
                .build(),
        );
        writer.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("filtered out"))
                .build(),
        );
        writer.write_access("127.0.0.1 - - GET /");
        writer.flush();

        let access_log = std::fs::read_to_string(&access).unwrap();
        let error_log = std::fs::read_to_string(&error).unwrap();
        assert!(access_log.contains("[INFO] served /index.html"));
        assert!(access_log.contains("127.0.0.1 - - GET /"));
        assert!(!access_log.contains("filtered out"));
        assert!(error_log.contains("[WARN] traversal blocked"));
        assert!(!error_log.contains("served"));
    }
}
