//! mimeconv core
//!
//! Converts a file from one MIME type to another by finding an external
//! converter whose file name encodes the type pair, and running it:
//! - Type detection (content sniffing, refined by file name)
//! - Converter name codec (`text/plain`, `text/html` ↔ `text_plain→text_html`)
//! - Converter inventory (one directory, listed once)
//! - Dispatch (identity shortcut, lookup, one converter run)
//! - Converter directory configuration and logging setup for the binaries
//!
//! Only direct conversions exist: when no converter for the exact pair is
//! installed, nothing tries to chain converters through intermediate types.

pub mod config;
pub mod converter_name;
pub mod converter_process;
pub mod dispatcher;
pub mod errors;
pub mod inventory;
pub mod logging;
pub mod magic;
pub mod mime_type;
pub mod type_detector;

pub use config::{ConvertersDir, ConvertersDirSource, CONVERTERS_DIR_ENV};
pub use converter_name::{decode, encode, render_pair, ConverterId, PAIR_SEPARATOR};
pub use converter_process::{ConverterInvocation, ConverterRunner, ProcessRunner};
pub use dispatcher::{ConversionRequest, Dispatcher, STDIN_SENTINEL};
pub use errors::{ConvertError, Result};
pub use inventory::ConverterInventory;
pub use mime_type::MimeType;
pub use type_detector::{
    detect_from_name, ContentSniffer, FileCommandSniffer, MagicTable, TypeDetector,
};
