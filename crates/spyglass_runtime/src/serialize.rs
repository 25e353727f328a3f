//! Host snapshots.
//!
//! A snapshot captures a host (units, heap, statics, globals) together with
//! the value to inspect. Snapshots are stored as `MessagePack` or, for files
//! with a `.json` extension, as JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use spyglass_foundation::{Error, ErrorKind, Result, Value};
use spyglass_storage::Host;

/// A host plus the named value to inspect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostSnapshot {
    /// The captured host.
    pub host: Host,
    /// Name shown for the root value.
    pub name: String,
    /// The value to inspect.
    pub root: Value,
}

impl HostSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(host: Host, name: impl Into<String>, root: Value) -> Self {
        Self {
            host,
            name: name.into(),
            root,
        }
    }
}

/// Encoding of a snapshot file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// `MessagePack` with named fields.
    MessagePack,
    /// JSON.
    Json,
}

impl SnapshotFormat {
    /// Picks the format from a file extension; anything but `.json` is `MessagePack`.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::MessagePack,
        }
    }
}

fn serialization(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Serialization(e.to_string()))
}

/// Serializes a snapshot to bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(snapshot: &HostSnapshot, format: SnapshotFormat) -> Result<Vec<u8>> {
    match format {
        SnapshotFormat::MessagePack => rmp_serde::to_vec_named(snapshot).map_err(serialization),
        SnapshotFormat::Json => serde_json::to_vec_pretty(snapshot).map_err(serialization),
    }
}

/// Deserializes a snapshot from bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8], format: SnapshotFormat) -> Result<HostSnapshot> {
    match format {
        SnapshotFormat::MessagePack => rmp_serde::from_slice(bytes).map_err(serialization),
        SnapshotFormat::Json => serde_json::from_slice(bytes).map_err(serialization),
    }
}

/// Saves a snapshot, choosing the format from the extension.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(snapshot: &HostSnapshot, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(snapshot, SnapshotFormat::for_path(path))?;

    let file = File::create(path)
        .map_err(|e| Error::io(format!("failed to create file '{}'", path.display()), &e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| Error::io(format!("failed to write to file '{}'", path.display()), &e))?;
    writer
        .flush()
        .map_err(|e| Error::io(format!("failed to flush file '{}'", path.display()), &e))?;
    Ok(())
}

/// Loads a snapshot, choosing the format from the extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<HostSnapshot> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::io(format!("failed to open file '{}'", path.display()), &e))?;

    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(format!("failed to read file '{}'", path.display()), &e))?;

    from_bytes(&bytes, SnapshotFormat::for_path(path))
}
