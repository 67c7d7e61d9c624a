//! Running external converter programs.
//!
//! ## Converter contract
//!
//! A converter is invoked with five positional arguments
//! `INPUT SRC-TYPE DEST-TYPE EXTENSION BASENAME`, writes the converted bytes
//! to stdout and exits 0 on success.
//!
//! ## Pipes
//!
//! stdout and stderr are both piped. If only stdout were read, a converter
//! writing more than a pipe buffer of diagnostics would block on stderr while
//! we block on stdout. stderr is therefore drained on its own thread.

use crate::errors::{ConvertError, Result};
use crate::mime_type::MimeType;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

/// One fully resolved converter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterInvocation {
    /// Identifier of the converter, used in diagnostics.
    pub converter: String,
    pub program: PathBuf,
    pub input: PathBuf,
    pub src: MimeType,
    pub dest: MimeType,
    /// Extension with its leading dot, or empty.
    pub extension: String,
    pub base_name: String,
}

impl ConverterInvocation {
    /// Positional arguments in contract order.
    pub fn args(&self) -> [OsString; 5] {
        [
            self.input.clone().into_os_string(),
            self.src.as_str().into(),
            self.dest.as_str().into(),
            self.extension.as_str().into(),
            self.base_name.as_str().into(),
        ]
    }

    pub fn command_line(&self) -> String {
        format!(
            "{} {} {} {} {:?} {:?}",
            self.program.display(),
            self.input.display(),
            self.src,
            self.dest,
            self.extension,
            self.base_name
        )
    }
}

/// Split a path into the extension and base name handed to converters:
/// `notes/report.tar.gz` → (`.gz`, `report.tar`).
pub fn split_file_name(path: &Path) -> (String, String) {
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let base_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    (extension, base_name)
}

/// The single seam between dispatch logic and the outside world.
pub trait ConverterRunner {
    /// Run the converter and return everything it wrote to stdout.
    fn run(&self, invocation: &ConverterInvocation) -> Result<Vec<u8>>;
}

impl<R: ConverterRunner + ?Sized> ConverterRunner for &R {
    fn run(&self, invocation: &ConverterInvocation) -> Result<Vec<u8>> {
        (**self).run(invocation)
    }
}

/// Runs converters as child processes. Blocks until the child exits; there
/// is no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ConverterRunner for ProcessRunner {
    fn run(&self, invocation: &ConverterInvocation) -> Result<Vec<u8>> {
        info!(
            converter = %invocation.converter,
            command = %invocation.command_line(),
            "Executing converter"
        );

        let start_time = Instant::now();
        let launch_error = |source| ConvertError::ConverterLaunch {
            converter: invocation.converter.clone(),
            source,
        };

        let mut child = Command::new(&invocation.program)
            .args(invocation.args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch_error)?;

        let stderr_thread = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        let mut stdout = Vec::new();
        let read_result = match child.stdout.take() {
            Some(mut pipe) => pipe.read_to_end(&mut stdout).map(|_| ()),
            None => Ok(()),
        };

        // Always reap the child, even when reading stdout failed.
        let status = child.wait();
        let stderr = stderr_thread
            .map(|t| t.join().unwrap_or_default())
            .unwrap_or_default();
        let duration = start_time.elapsed();

        read_result?;
        let status = status?;

        if status.success() {
            info!(
                converter = %invocation.converter,
                duration_secs = duration.as_secs_f64(),
                output_bytes = stdout.len(),
                "Converter completed successfully"
            );
            debug!(converter = %invocation.converter, stderr_output = %stderr, "Converter stderr");
            Ok(stdout)
        } else {
            error!(
                converter = %invocation.converter,
                duration_secs = duration.as_secs_f64(),
                exit_code = status.code(),
                stderr_output = %stderr,
                "Converter failed"
            );
            Err(ConvertError::ConversionFailed {
                converter: invocation.converter.clone(),
                exit_code: status.code(),
                stderr,
            })
        }
    }
}
