//! File content classification
//!
//! One read pass per file, producing a tagged outcome instead of raising:
//! binary (null byte in the leading sample), empty, UTF-8 text, read failure,
//! or gone-by-read-time. Callers render these as in-band markers; nothing
//! here panics on expected filesystem conditions.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

/// Size of the leading sample inspected for null bytes
pub const BINARY_SNIFF_BYTES: usize = 1024;

/// Why a read failed, kept coarse for reporting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadFailure {
    #[error("access denied")]
    AccessDenied,

    #[error("{0}")]
    Io(String),
}

/// Outcome of classifying one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedContent {
    /// Nonempty file whose leading sample contains a null byte
    Binary,
    /// Zero-length file
    Empty,
    /// Full file content decoded as UTF-8 (lossily when necessary)
    Text(String),
    /// The file existed but reading it failed
    ReadError(ReadFailure),
    /// The path no longer resolves to a regular file
    NotFound,
}

impl ClassifiedContent {
    pub fn is_text(&self) -> bool {
        matches!(self, ClassifiedContent::Text(_))
    }
}

fn from_io_error(err: &std::io::Error) -> ClassifiedContent {
    match err.kind() {
        ErrorKind::NotFound => ClassifiedContent::NotFound,
        ErrorKind::PermissionDenied => ClassifiedContent::ReadError(ReadFailure::AccessDenied),
        _ => ClassifiedContent::ReadError(ReadFailure::Io(err.to_string())),
    }
}

/// Classify a file with a single metadata probe and read.
///
/// Races between enumeration and read are tolerated: a file that vanished
/// classifies as `NotFound`, one that became unreadable as `ReadError`.
pub fn classify(path: &Path) -> ClassifiedContent {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => return from_io_error(&e),
    };

    if !metadata.is_file() {
        return ClassifiedContent::NotFound;
    }
    if metadata.len() == 0 {
        return ClassifiedContent::Empty;
    }

    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => return from_io_error(&e),
    };

    // Size may have changed since the probe; re-check so an emptied file is
    // never reported binary.
    if bytes.is_empty() {
        return ClassifiedContent::Empty;
    }

    let sniff_len = bytes.len().min(BINARY_SNIFF_BYTES);
    if bytes[..sniff_len].contains(&0) {
        return ClassifiedContent::Binary;
    }

    match String::from_utf8(bytes) {
        Ok(text) => ClassifiedContent::Text(text),
        Err(e) => ClassifiedContent::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}
