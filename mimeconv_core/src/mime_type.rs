//! MIME type value used throughout converter resolution.
//!
//! A `MimeType` is deliberately opaque: the only structure the tools rely on
//! is the `major/minor` slash that the converter name codec escapes.

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MimeType(String);

impl MimeType {
    /// Generic "unknown binary" type, the default for unspecified types.
    pub const OCTET_STREAM: &'static str = "application/octet-stream";
    pub const TEXT_PLAIN: &'static str = "text/plain";
    pub const EMPTY: &'static str = "application/x-empty";

    /// Sniffer answers too vague to pick a converter with.
    pub const GENERIC: [&'static str; 3] = ["binary", Self::OCTET_STREAM, Self::TEXT_PLAIN];

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn octet_stream() -> Self {
        Self::new(Self::OCTET_STREAM)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The type without parameters: `text/plain; charset=utf-8` → `text/plain`.
    pub fn essence(&self) -> MimeType {
        let bare = self.0.split(';').next().unwrap_or_default().trim();
        Self::new(bare)
    }

    pub fn is_generic(&self) -> bool {
        Self::GENERIC.contains(&self.essence().as_str())
    }
}

impl Default for MimeType {
    fn default() -> Self {
        Self::octet_stream()
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MimeType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MimeType {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for MimeType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MimeType {
    fn borrow(&self) -> &str {
        &self.0
    }
}
