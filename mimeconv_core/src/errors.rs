use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("bad converter {0}")]
    MalformedIdentifier(String),

    #[error("no converter {0} found")]
    ConverterNotFound(String),

    #[error("converter {converter} failed{}{}", exit_suffix(.exit_code), stderr_suffix(.stderr))]
    ConversionFailed {
        converter: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("could not start converter {converter}")]
    ConverterLaunch {
        converter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot list converters directory {}", .dir.display())]
    InventoryUnavailable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => " (terminated by signal)".to_string(),
    }
}

// Diagnostics stay on one line, so only the last stderr line is shown.
fn stderr_suffix(stderr: &str) -> String {
    match stderr.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(line) => format!(": {}", line.trim()),
        None => String::new(),
    }
}
