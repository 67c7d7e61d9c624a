//! Type detection: content sniffing first, then a filename lookup when the
//! sniffer's answer is too generic to choose a converter with.

use crate::dispatcher::STDIN_SENTINEL;
use crate::errors::{ConvertError, Result};
use crate::magic;
use crate::mime_type::MimeType;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Content-based type oracle.
pub trait ContentSniffer {
    /// Best guess for the file's type. May carry parameters
    /// (`text/plain; charset=us-ascii`).
    fn sniff(&self, path: &Path) -> anyhow::Result<String>;

    fn name(&self) -> &'static str;
}

/// Built-in magic-number table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicTable;

impl ContentSniffer for MagicTable {
    fn sniff(&self, path: &Path) -> anyhow::Result<String> {
        Ok(magic::sniff_file(path)?.to_string())
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}

/// The system `file` command, i.e. libmagic.
#[derive(Debug, Clone)]
pub struct FileCommandSniffer {
    program: PathBuf,
}

impl FileCommandSniffer {
    /// Locate `file` on `PATH`.
    pub fn locate() -> Option<Self> {
        which::which("file").ok().map(|program| Self { program })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ContentSniffer for FileCommandSniffer {
    fn sniff(&self, path: &Path) -> anyhow::Result<String> {
        let output = Command::new(&self.program)
            .arg("--brief")
            .arg("--mime-type")
            .arg("--")
            .arg(path)
            .output()?;

        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {:?}: {}",
                self.program.display(),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let answer = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if answer.is_empty() || (!answer.contains('/') && answer != "binary") {
            anyhow::bail!("unexpected answer from {}: {:?}", self.program.display(), answer);
        }
        Ok(answer)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Filename/extension database lookup, independent of content.
pub fn lookup_by_name(path: &Path) -> Option<MimeType> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| MimeType::new(mime.essence_str()))
}

/// Type for a file that is only named, e.g. a destination that does not
/// exist yet. Unknown names are `application/octet-stream`.
pub fn detect_from_name(path: &Path) -> MimeType {
    lookup_by_name(path).unwrap_or_default()
}

pub struct TypeDetector {
    sniffer: Box<dyn ContentSniffer>,
}

impl Default for TypeDetector {
    /// libmagic when `file` is installed, the built-in table otherwise.
    fn default() -> Self {
        match FileCommandSniffer::locate() {
            Some(sniffer) => Self::new(sniffer),
            None => Self::new(MagicTable),
        }
    }
}

impl TypeDetector {
    pub fn new(sniffer: impl ContentSniffer + 'static) -> Self {
        Self {
            sniffer: Box::new(sniffer),
        }
    }

    pub fn sniffer_name(&self) -> &'static str {
        self.sniffer.name()
    }

    /// Best-guess type of the file at `path`.
    ///
    /// Fails only with [`ConvertError::FileNotFound`]. Standard input cannot be
    /// sniffed without consuming it and is reported as
    /// `application/octet-stream`.
    pub fn detect(&self, path: &Path) -> Result<MimeType> {
        if path == Path::new(STDIN_SENTINEL) {
            return Ok(MimeType::octet_stream());
        }
        if !path.exists() {
            return Err(ConvertError::FileNotFound(path.to_path_buf()));
        }

        let sniffed = match self.sniffer.sniff(path) {
            Ok(raw) => MimeType::new(raw).essence(),
            Err(e) => {
                warn!(
                    path = ?path,
                    sniffer = self.sniffer.name(),
                    error = %e,
                    "Content sniffing failed, treating as binary"
                );
                MimeType::octet_stream()
            }
        };

        if !sniffed.is_generic() {
            debug!(path = ?path, mime = %sniffed, "Type from content");
            return Ok(sniffed);
        }

        // Second opinion when the content alone says too little.
        let refined = match lookup_by_name(path) {
            Some(by_name) => by_name,
            None if sniffed.as_str() == "binary" => MimeType::octet_stream(),
            None => sniffed.clone(),
        };
        debug!(path = ?path, sniffed = %sniffed, mime = %refined, "Type refined from file name");
        Ok(refined)
    }
}
