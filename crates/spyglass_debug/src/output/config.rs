//! Configuration for output assembly.

use std::path::PathBuf;
use std::time::Duration;

use spyglass_engine::Settings;

/// Default spill threshold: 256 KiB.
pub const DEFAULT_THRESHOLD_BYTES: usize = 256 * 1024;

/// Default age after which stale spill files are swept: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Configuration for the [`OutputAccumulator`](super::OutputAccumulator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    /// Fragments at least this large are spilled.
    pub threshold_bytes: usize,
    /// Directory holding spill files.
    pub chunk_dir: PathBuf,
    /// Spill files older than this are swept.
    pub ttl: Duration,
    /// Whether spilling is attempted at all.
    pub spill: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            chunk_dir: default_chunk_dir(),
            ttl: DEFAULT_TTL,
            spill: true,
        }
    }
}

impl OutputConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that keeps everything inline.
    #[must_use]
    pub fn inline() -> Self {
        Self {
            spill: false,
            ..Self::default()
        }
    }

    /// Derives the configuration from inspection settings.
    ///
    /// A zero threshold disables spilling.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            threshold_bytes: settings.chunk_threshold_bytes,
            chunk_dir: settings.chunk_dir.clone().unwrap_or_else(default_chunk_dir),
            ttl: DEFAULT_TTL,
            spill: settings.chunk_threshold_bytes > 0,
        }
    }

    /// Builder method to set the spill threshold.
    #[must_use]
    pub fn with_threshold(mut self, bytes: usize) -> Self {
        self.threshold_bytes = bytes;
        self
    }

    /// Builder method to set the spill directory.
    #[must_use]
    pub fn with_chunk_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chunk_dir = dir.into();
        self
    }

    /// Builder method to set the sweep TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builder method to enable or disable spilling.
    #[must_use]
    pub fn with_spill(mut self, spill: bool) -> Self {
        self.spill = spill;
        self
    }
}

fn default_chunk_dir() -> PathBuf {
    std::env::temp_dir().join("spyglass-chunks")
}
