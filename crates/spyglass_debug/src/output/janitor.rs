//! Sweeping of stale spill files.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use spyglass_foundation::{Error, Result};

/// Prefix of every spill file name.
pub const CHUNK_PREFIX: &str = "spyglass-";

/// Extension of every spill file name.
pub const CHUNK_EXTENSION: &str = "chunk";

/// Returns true if `name` looks like a spill file.
#[must_use]
pub fn is_chunk_file(name: &str) -> bool {
    name.starts_with(CHUNK_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == CHUNK_EXTENSION)
}

/// Deletes spill files in `dir` older than `ttl` as of `now`.
///
/// Returns the number of files removed. A missing directory counts as empty.
pub fn sweep(dir: &Path, ttl: Duration, now: SystemTime) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(Error::io(format!("reading {}", dir.display()), &e)),
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_str().is_some_and(is_chunk_file) {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > ttl && fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    tracing::debug!(dir = %dir.display(), removed, "swept stale spill files");
    Ok(removed)
}

/// Runs the stale-file sweep at most once per process.
#[derive(Debug, Default)]
pub struct ChunkJanitor {
    swept: AtomicBool,
}

impl ChunkJanitor {
    /// Creates a janitor that has not swept yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweeps `dir` unless a sweep already ran. Returns `None` if skipped.
    pub fn sweep_once(&self, dir: &Path, ttl: Duration) -> Option<Result<usize>> {
        if self.swept.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(sweep(dir, ttl, SystemTime::now()))
    }

    /// Returns true once a sweep has run.
    #[must_use]
    pub fn has_swept(&self) -> bool {
        self.swept.load(Ordering::SeqCst)
    }
}
