// crates/harbormaster-store/src/fsio.rs
// ============================================================================
// Module: Filesystem Primitives
// Description: Atomic writes, tolerant sidecar reads, and checksums.
// Purpose: Give every store write crash-safe semantics.
// Dependencies: serde, serde_yaml, sha2, tracing
// ============================================================================

//! ## Overview
//! All durable writes go to `<path>.tmp` and rename into place, so either
//! the old or the new file exists, never a half-written one. Sidecar reads
//! are tolerant by design: absent or corrupt files yield `None` and a
//! warning so a single damaged sidecar never aborts a scan.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Digest;
use sha2::Sha256;

use crate::documents::StoreError;

// ============================================================================
// SECTION: Atomic Writes
// ============================================================================

/// Writes `bytes` to `path` atomically via a sibling temp file plus rename.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`StoreError::Io`] when any filesystem step fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path.parent().ok_or_else(|| {
        StoreError::Io(format!("path has no parent directory: {}", path.display()))
    })?;
    fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, bytes).map_err(|err| io_error(tmp, &err))?;
    fs::rename(tmp, path).map_err(|err| io_error(path, &err))
}

/// Serializes `value` as YAML and writes it atomically.
///
/// # Errors
///
/// Returns [`StoreError`] when serialization or the write fails.
pub fn write_yaml_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_yaml::to_string(value)
        .map_err(|err| StoreError::Parse(format!("{}: {err}", path.display())))?;
    write_atomic(path, text.as_bytes())
}

/// Serializes `value` as pretty JSON and writes it atomically.
///
/// # Errors
///
/// Returns [`StoreError`] when serialization or the write fails.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| StoreError::Parse(format!("{}: {err}", path.display())))?;
    write_atomic(path, text.as_bytes())
}

// ============================================================================
// SECTION: Tolerant Reads
// ============================================================================

/// Reads a YAML sidecar, yielding `None` when absent or unreadable.
///
/// Corruption is logged as a warning rather than surfaced; derived state
/// treats a damaged sidecar as not present.
#[must_use]
pub fn read_yaml_tolerant<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "sidecar unreadable");
            return None;
        }
    };
    match serde_yaml::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "sidecar corrupt");
            None
        }
    }
}

// ============================================================================
// SECTION: Checksums
// ============================================================================

/// Computes the lowercase SHA-256 hex digest of a file.
///
/// # Errors
///
/// Returns [`StoreError::Io`] when the file cannot be read.
pub fn sha256_hex_file(path: &Path) -> Result<String, StoreError> {
    let mut file = File::open(path).map_err(|err| io_error(path, &err))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf).map_err(|err| io_error(path, &err))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push(char::from_digit(u32::from(byte >> 4), 16).unwrap_or('0'));
        hex.push(char::from_digit(u32::from(byte & 0x0f), 16).unwrap_or('0'));
    }
    Ok(hex)
}

/// Builds a [`StoreError::Io`] tagged with the offending path.
fn io_error(path: &Path, err: &io::Error) -> StoreError {
    StoreError::Io(format!("{}: {err}", path.display()))
}
