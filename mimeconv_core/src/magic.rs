//! Built-in magic-number table.
//!
//! Used when the system `file` command is not available. Only the leading
//! bytes of a file are inspected.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How much of a file the table looks at.
pub const HEADER_LEN: usize = 8192;

/// Fixed signatures at offset 0.
const PREFIX_SIGNATURES: &[(&[u8], &str)] = &[
    (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], "image/png"),
    (&[0xFF, 0xD8, 0xFF], "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"II*\0", "image/tiff"),
    (b"MM\0*", "image/tiff"),
    (&[0x00, 0x00, 0x01, 0x00], "image/vnd.microsoft.icon"),
    (&[0xFF, 0x0A], "image/jxl"),
    (&[0x00, 0x00, 0x00, 0x0C, b'J', b'X', b'L', b' '], "image/jxl"),
    (b"%PDF-", "application/pdf"),
    (b"%!PS", "application/postscript"),
    (b"{\\rtf", "text/rtf"),
    (b"PK\x03\x04", "application/zip"),
    (b"PK\x05\x06", "application/zip"),
    (&[0x1F, 0x8B], "application/gzip"),
    (&[0xFD, b'7', b'z', b'X', b'Z', 0x00], "application/x-xz"),
    (&[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C], "application/x-7z-compressed"),
    (&[0x28, 0xB5, 0x2F, 0xFD], "application/zstd"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (&[0x1A, 0x45, 0xDF, 0xA3], "video/x-matroska"),
    (&[0x7F, b'E', b'L', b'F'], "application/x-executable"),
    (b"\0asm", "application/wasm"),
    (b"SQLite format 3\0", "application/vnd.sqlite3"),
];

/// Short ASCII prefixes that ordinary prose can start with ("BMW", "ID3
/// tags"). Only consulted once the header has been ruled out as text.
const WEAK_SIGNATURES: &[(&[u8], &str)] = &[
    (b"BZh", "application/x-bzip2"),
    (b"ID3", "audio/mpeg"),
    (b"MThd", "audio/midi"),
];

/// BITMAPINFOHEADER and friends, stored at offset 14 of a BMP.
const BMP_DIB_HEADER_SIZES: &[u32] = &[12, 40, 52, 56, 64, 108, 124];

/// RIFF containers: form type at offset 8.
const RIFF_FORMS: &[(&[u8], &str)] = &[
    (b"WEBP", "image/webp"),
    (b"WAVE", "audio/x-wav"),
    (b"AVI ", "video/x-msvideo"),
];

/// ISO base media `ftyp` major brands at offset 8.
const FTYP_BRANDS: &[(&[u8], &str)] = &[
    (b"avif", "image/avif"),
    (b"avis", "image/avif"),
    (b"heic", "image/heic"),
    (b"heix", "image/heic"),
    (b"mif1", "image/heif"),
    (b"qt  ", "video/quicktime"),
    (b"M4A ", "audio/mp4"),
    (b"3gp4", "video/3gpp"),
    (b"3gp5", "video/3gpp"),
];

/// Markup recognised after leading whitespace, compared case-insensitively.
const TEXT_SIGNATURES: &[(&str, &str)] = &[
    ("<?xml", "text/xml"),
    ("<!doctype html", "text/html"),
    ("<html", "text/html"),
    ("<head", "text/html"),
    ("<svg", "image/svg+xml"),
];

/// Sniff a file on disk from its first [`HEADER_LEN`] bytes.
pub fn sniff_file(path: &Path) -> std::io::Result<&'static str> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(sniff_bytes(&header))
}

/// Classify a file header. Never fails: unknown binary data is
/// `application/octet-stream`.
pub fn sniff_bytes(header: &[u8]) -> &'static str {
    if header.is_empty() {
        return "application/x-empty";
    }

    if let Some((_, mime)) = PREFIX_SIGNATURES
        .iter()
        .find(|(magic, _)| header.starts_with(magic))
    {
        // Matroska and WebM share a header; the doctype says which.
        if *mime == "video/x-matroska" && contains(header, b"webm") {
            return "video/webm";
        }
        return *mime;
    }

    if header.len() >= 12 && header.starts_with(b"RIFF") {
        if let Some((_, mime)) = RIFF_FORMS.iter().find(|(form, _)| &header[8..12] == *form) {
            return *mime;
        }
    }

    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        let brand = &header[8..12];
        return FTYP_BRANDS
            .iter()
            .find(|(b, _)| brand == *b)
            .map(|(_, mime)| *mime)
            .unwrap_or("video/mp4");
    }

    // MPEG audio frame sync without an ID3 tag.
    if header.len() >= 2 && header[0] == 0xFF && (header[1] & 0xE0) == 0xE0 {
        return "audio/mpeg";
    }

    if looks_like_text(header) {
        return classify_text(header);
    }

    if is_bmp(header) {
        return "image/bmp";
    }

    WEAK_SIGNATURES
        .iter()
        .find(|(magic, _)| header.starts_with(magic))
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}

fn is_bmp(header: &[u8]) -> bool {
    if header.len() < 18 || !header.starts_with(b"BM") {
        return false;
    }
    let dib_size = u32::from_le_bytes([header[14], header[15], header[16], header[17]]);
    BMP_DIB_HEADER_SIZES.contains(&dib_size)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// NUL bytes never occur in text; a truncated multi-byte sequence at the end
// of the header is tolerated.
fn looks_like_text(header: &[u8]) -> bool {
    if header.contains(&0) {
        return false;
    }
    match std::str::from_utf8(header) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && header.len() >= HEADER_LEN,
    }
}

fn classify_text(header: &[u8]) -> &'static str {
    if header.starts_with(b"#!") {
        let first_line = header.split(|b| *b == b'\n').next().unwrap_or_default();
        let first_line = String::from_utf8_lossy(first_line);
        return if first_line.contains("python") {
            "text/x-python"
        } else if first_line.contains("perl") {
            "text/x-perl"
        } else {
            "text/x-shellscript"
        };
    }

    let text = String::from_utf8_lossy(header);
    let start = text
        .trim_start_matches('\u{feff}')
        .trim_start()
        .chars()
        .take(32)
        .collect::<String>()
        .to_ascii_lowercase();

    TEXT_SIGNATURES
        .iter()
        .find(|(prefix, _)| start.starts_with(prefix))
        .map(|(_, mime)| *mime)
        .unwrap_or("text/plain")
}
