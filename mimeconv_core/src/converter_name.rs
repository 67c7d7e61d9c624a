//! Converter name codec.
//!
//! A converter is an executable whose file name spells out the pair of types
//! it converts between: `text/plain` → `text/html` is `text_plain→text_html`.

use crate::errors::{ConvertError, Result};
use crate::mime_type::MimeType;
use std::fmt;

/// Stands in for `/` inside each type, since file names cannot contain it.
pub const SLASH_ESCAPE: char = '_';

/// Joins source and destination; never legal inside a MIME type.
pub const PAIR_SEPARATOR: char = '→';

/// Raw converter identifier, i.e. the converter's file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConverterId(String);

impl ConverterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConverterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConverterId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn encode(src: &MimeType, dest: &MimeType) -> ConverterId {
    let src = src.as_str().replace('/', &SLASH_ESCAPE.to_string());
    let dest = dest.as_str().replace('/', &SLASH_ESCAPE.to_string());
    ConverterId(format!("{}{}{}", src, PAIR_SEPARATOR, dest))
}

pub fn decode(identifier: &str) -> Result<(MimeType, MimeType)> {
    let (src, dest) = identifier
        .split_once(PAIR_SEPARATOR)
        .ok_or_else(|| ConvertError::MalformedIdentifier(identifier.to_string()))?;

    Ok((unescape(src), unescape(dest)))
}

fn unescape(half: &str) -> MimeType {
    MimeType::new(half.replace(SLASH_ESCAPE, "/"))
}

/// Human form of a pair for listings: `text/plain→text/html`.
pub fn render_pair(src: &MimeType, dest: &MimeType) -> String {
    format!("{}{}{}", src, PAIR_SEPARATOR, dest)
}
