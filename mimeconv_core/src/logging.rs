//! Logging setup shared by the mimeconv binaries.
//!
//! Everything is logged through `tracing`. Binaries call [`init_logging`]
//! once at startup; it installs:
//! - an `EnvFilter` (`RUST_LOG` wins over the configured level)
//! - a stderr layer
//! - optionally, a daily rolling log file `{program}.log.YYYY-MM-DD`
//!
//! # Examples
//!
//! ```no_run
//! use mimeconv_core::logging::{init_logging, LogConfig};
//! use tracing::Level;
//!
//! init_logging("mimeconv", LogConfig::default().with_level(Level::INFO))
//!     .expect("Failed to initialize logging");
//! tracing::info!("Program started");
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for the rolling log file; `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
    /// Rotated log files to keep.
    pub max_files: usize,
    pub level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            max_files: 5,
            level: Level::WARN,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.log_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// `-v` count to level: quiet by default so converted bytes on stdout
    /// are the only thing a pipeline sees.
    pub fn with_verbosity(self, verbose: u8) -> Self {
        let level = match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        self.with_level(level)
    }
}

/// Default filter: this crate and the calling program at `level`.
fn default_directives(program_name: &str, level: Level) -> String {
    let target = program_name.replace('-', "_");
    format!("mimeconv_core={level},{target}={level}")
}

pub fn init_logging(program_name: &str, config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(program_name, config.level)));

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
            let log_file_name = format!("{}.log", program_name);
            let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, log_file_name);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        program = program_name,
        log_dir = ?config.log_dir,
        max_files = config.max_files,
        level = ?config.level,
        "Logging system initialized"
    );

    if let Some(dir) = &config.log_dir {
        cleanup_old_logs(dir, program_name, config.max_files)?;
    }

    Ok(())
}

/// Delete all but the newest `max_files` rotated logs of `program_name`.
fn cleanup_old_logs(log_dir: &Path, program_name: &str, max_files: usize) -> Result<()> {
    use std::fs;

    let prefix = format!("{}.log", program_name);
    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("Failed to read log directory: {:?}", log_dir))?;

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let matches = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with(&prefix))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        if let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    if log_files.len() <= max_files {
        return Ok(());
    }

    // Newest first.
    log_files.sort_by(|a, b| b.1.cmp(&a.1));
    for (path, _) in log_files.iter().skip(max_files) {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = ?path, "Removed old log file"),
            Err(e) => tracing::warn!(path = ?path, error = %e, "Failed to remove old log file"),
        }
    }

    Ok(())
}
