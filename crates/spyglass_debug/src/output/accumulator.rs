//! Incremental output assembly with spilling.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use spyglass_engine::{Diagnostics, FragmentSink, MessageKey};
use spyglass_foundation::{Error, ErrorKind, Result};

use super::config::OutputConfig;
use super::janitor::{CHUNK_EXTENSION, CHUNK_PREFIX};

/// Wraps spill tokens. Renderers escape control characters, so rendered
/// content never contains it.
pub const TOKEN_DELIMITER: &str = "\u{1e}\u{1f}\u{1e}";

/// Assembles rendered output, moving large fragments to spill files.
///
/// Fragments at or above the threshold are written to the chunk directory
/// and replaced by a short token. [`emit`](Self::emit) streams the final
/// output, expanding tokens (including tokens inside spilled fragments) as it
/// goes and deleting each spill file once read.
#[derive(Debug)]
pub struct OutputAccumulator {
    config: OutputConfig,
    session_key: String,
    spilling: bool,
    dir_ready: bool,
    chunks: Vec<Option<PathBuf>>,
    parts: Vec<String>,
    pending: Vec<(MessageKey, Vec<String>)>,
    spilled_bytes: u64,
}

impl OutputAccumulator {
    /// Creates an accumulator.
    #[must_use]
    pub fn new(config: OutputConfig) -> Self {
        let spilling = config.spill;
        Self {
            config,
            session_key: session_key(),
            spilling,
            dir_ready: false,
            chunks: Vec::new(),
            parts: Vec::new(),
            pending: Vec::new(),
            spilled_bytes: 0,
        }
    }

    /// Creates an accumulator that never spills.
    #[must_use]
    pub fn inline() -> Self {
        Self::new(OutputConfig::inline())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Key namespacing this session's spill files.
    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Returns true while spilling is enabled.
    #[must_use]
    pub fn is_spilling(&self) -> bool {
        self.spilling
    }

    /// Number of fragments spilled so far.
    #[must_use]
    pub fn spilled_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total bytes written to spill files.
    #[must_use]
    pub fn spilled_bytes(&self) -> u64 {
        self.spilled_bytes
    }

    /// Spill files not yet resolved or removed.
    #[must_use]
    pub fn live_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_some()).count()
    }

    /// Takes a fragment, returning either it or a token standing for it.
    pub fn absorb(&mut self, fragment: String) -> String {
        if !self.spilling || fragment.len() < self.config.threshold_bytes {
            return fragment;
        }
        match self.spill(&fragment) {
            Ok(index) => {
                self.spilled_bytes += fragment.len() as u64;
                tracing::debug!(index, bytes = fragment.len(), "spilled fragment");
                token(index)
            }
            Err(e) => {
                self.degrade(&e.to_string());
                fragment
            }
        }
    }

    /// Appends a top-level part of the document.
    pub fn append(&mut self, part: String) {
        self.parts.push(part);
    }

    /// Moves pending diagnostics (such as degraded spilling) into `diag`.
    pub fn report(&mut self, diag: &mut dyn Diagnostics) {
        for (key, args) in self.pending.drain(..) {
            diag.add_message(key, args);
        }
    }

    /// Streams every appended part to `out`, resolving tokens.
    ///
    /// Returns the number of bytes written. Spill files are deleted as they
    /// are read; any left unreferenced are removed afterwards.
    pub fn emit(&mut self, out: &mut dyn Write) -> Result<u64> {
        let parts = std::mem::take(&mut self.parts);
        let mut written = 0u64;

        for part in parts {
            let mut stack: Vec<(String, usize)> = vec![(part, 0)];
            while let Some((text, offset)) = stack.pop() {
                let rest = &text[offset..];
                let Some((start, end, index)) = find_token(rest) else {
                    write_out(out, rest, &mut written)?;
                    continue;
                };
                write_out(out, &rest[..start], &mut written)?;
                let resume = offset + end;
                let chunk = self.take_chunk(index)?;
                stack.push((text, resume));
                stack.push((chunk, 0));
            }
        }

        out.flush().map_err(|e| Error::io("flushing output", &e))?;
        self.cleanup();
        Ok(written)
    }

    /// Emits everything into a string.
    pub fn emit_to_string(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        self.emit(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))
    }

    /// Deletes every spill file still owned by this accumulator.
    pub fn cleanup(&mut self) {
        for path in self.chunks.iter_mut().filter_map(Option::take) {
            let _ = fs::remove_file(path);
        }
    }

    fn spill(&mut self, fragment: &str) -> std::io::Result<usize> {
        if !self.dir_ready {
            fs::create_dir_all(&self.config.chunk_dir)?;
            self.dir_ready = true;
        }
        let index = self.chunks.len();
        let path = self.config.chunk_dir.join(format!(
            "{CHUNK_PREFIX}{}-{index}.{CHUNK_EXTENSION}",
            self.session_key
        ));
        if let Err(e) = fs::write(&path, fragment) {
            let _ = fs::remove_file(&path);
            return Err(e);
        }
        self.chunks.push(Some(path));
        Ok(index)
    }

    fn take_chunk(&mut self, index: usize) -> Result<String> {
        let path = self
            .chunks
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| Error::new(ErrorKind::Internal(format!("unknown spill token {index}"))))?;
        let content = fs::read_to_string(&path).map_err(|e| Error::io(format!("reading {}", path.display()), &e));
        let _ = fs::remove_file(&path);
        content
    }

    fn degrade(&mut self, reason: &str) {
        if !self.spilling {
            return;
        }
        tracing::debug!(dir = %self.config.chunk_dir.display(), reason, "spilling disabled");
        self.spilling = false;
        self.pending.push((
            MessageKey::SpillUnavailable,
            vec![format!("{}: {reason}", self.config.chunk_dir.display())],
        ));
    }
}

impl FragmentSink for OutputAccumulator {
    fn absorb(&mut self, fragment: String) -> String {
        OutputAccumulator::absorb(self, fragment)
    }
}

impl Drop for OutputAccumulator {
    fn drop(&mut self) {
        self.cleanup();
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn token(index: usize) -> String {
    format!("{TOKEN_DELIMITER}{index}{TOKEN_DELIMITER}")
}

/// Finds the first well-formed token: (start, end past closing delimiter, index).
fn find_token(text: &str) -> Option<(usize, usize, usize)> {
    let start = text.find(TOKEN_DELIMITER)?;
    let body = start + TOKEN_DELIMITER.len();
    let len = text[body..].find(TOKEN_DELIMITER)?;
    let index = text[body..body + len].parse().ok()?;
    Some((start, body + len + TOKEN_DELIMITER.len(), index))
}

fn write_out(out: &mut dyn Write, text: &str, written: &mut u64) -> Result<()> {
    out.write_all(text.as_bytes())
        .map_err(|e| Error::io("writing output", &e))?;
    *written += text.len() as u64;
    Ok(())
}

fn session_key() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    format!("{millis}-{:08x}", rand::random::<u32>())
}

// =============================================================================
// Tests
// =============================================================================
