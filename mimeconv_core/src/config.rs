//! Where the converters live.
//!
//! Precedence: explicit `--converters-dir`, then `MIMECONV_CONVERTERS_DIR`,
//! then a `converters` directory beside the running executable.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const CONVERTERS_DIR_ENV: &str = "MIMECONV_CONVERTERS_DIR";
pub const CONVERTERS_DIR_NAME: &str = "converters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertersDirSource {
    Flag,
    Environment,
    BesideExecutable,
    WorkingDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertersDir {
    pub path: PathBuf,
    pub source: ConvertersDirSource,
}

impl ConvertersDir {
    /// Resolve from the process environment.
    pub fn resolve(flag: Option<PathBuf>) -> Self {
        Self::resolve_from(flag, env::var_os(CONVERTERS_DIR_ENV), env::current_exe().ok())
    }

    /// Resolution with every input supplied by the caller.
    pub fn resolve_from(
        flag: Option<PathBuf>,
        env_value: Option<OsString>,
        current_exe: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = flag {
            return Self {
                path,
                source: ConvertersDirSource::Flag,
            };
        }

        if let Some(value) = env_value.filter(|v| !v.is_empty()) {
            return Self {
                path: PathBuf::from(value),
                source: ConvertersDirSource::Environment,
            };
        }

        match current_exe.as_deref().and_then(Path::parent) {
            Some(exe_dir) => Self {
                path: exe_dir.join(CONVERTERS_DIR_NAME),
                source: ConvertersDirSource::BesideExecutable,
            },
            None => Self {
                path: PathBuf::from(CONVERTERS_DIR_NAME),
                source: ConvertersDirSource::WorkingDirectory,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins() {
        let dir = ConvertersDir::resolve_from(
            Some(PathBuf::from("/opt/conv")),
            Some(OsString::from("/env/conv")),
            Some(PathBuf::from("/usr/bin/mimeconv")),
        );
        assert_eq!(dir.path, PathBuf::from("/opt/conv"));
        assert_eq!(dir.source, ConvertersDirSource::Flag);
    }

    #[test]
    fn test_environment_before_executable() {
        let dir = ConvertersDir::resolve_from(
            None,
            Some(OsString::from("/env/conv")),
            Some(PathBuf::from("/usr/bin/mimeconv")),
        );
        assert_eq!(dir.path, PathBuf::from("/env/conv"));
        assert_eq!(dir.source, ConvertersDirSource::Environment);
    }

    #[test]
    fn test_empty_environment_is_ignored() {
        let dir = ConvertersDir::resolve_from(
            None,
            Some(OsString::new()),
            Some(PathBuf::from("/usr/lib/mimeconv/mimeconv")),
        );
        assert_eq!(dir.path, PathBuf::from("/usr/lib/mimeconv/converters"));
        assert_eq!(dir.source, ConvertersDirSource::BesideExecutable);
    }

    #[test]
    fn test_working_directory_fallback() {
        let dir = ConvertersDir::resolve_from(None, None, None);
        assert_eq!(dir.path, PathBuf::from("converters"));
        assert_eq!(dir.source, ConvertersDirSource::WorkingDirectory);
    }
}
