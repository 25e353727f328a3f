//! Ring buffer of diagnostics.
//!
//! Keeps the most recent diagnostics of a session so they can be rendered
//! after the tree, and mirrors each one to `tracing`.

use std::collections::{HashMap, VecDeque};

use spyglass_engine::{Diagnostics, MessageKey, Severity};

// =============================================================================
// Diagnostic Record
// =============================================================================

/// One recorded diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Monotonic id within the log.
    pub id: u64,
    /// Message key.
    pub key: MessageKey,
    /// Message arguments.
    pub args: Vec<String>,
    /// Severity.
    pub severity: Severity,
}

impl Diagnostic {
    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        self.key.describe(&self.args)
    }
}

// =============================================================================
// Diagnostic Log
// =============================================================================

/// Bounded log of diagnostics, oldest first.
#[derive(Clone, Debug)]
pub struct DiagnosticLog {
    records: VecDeque<Diagnostic>,
    max_size: usize,
    next_id: u64,
    dropped: u64,
}

impl DiagnosticLog {
    /// Creates a log holding at most `max_size` records.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(max_size.min(64)),
            max_size,
            next_id: 0,
            dropped: 0,
        }
    }

    /// Creates a log with the default size (256 records).
    #[must_use]
    pub fn default_size() -> Self {
        Self::new(256)
    }

    /// Appends a record, evicting the oldest when full. Returns its id.
    pub fn push(&mut self, key: MessageKey, args: Vec<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push_back(Diagnostic {
            id,
            key,
            args,
            severity: key.severity(),
        });
        while self.records.len() > self.max_size {
            self.records.pop_front();
            self.dropped += 1;
        }
        id
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes all records. Ids keep increasing.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterates over records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    /// The most recent `count` records.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&Diagnostic> {
        let start = self.records.len().saturating_sub(count);
        self.records.iter().skip(start).collect()
    }

    /// Records with the given severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.records.iter().filter(|r| r.severity == severity).collect()
    }

    /// Records with the given key.
    #[must_use]
    pub fn by_key(&self, key: MessageKey) -> Vec<&Diagnostic> {
        self.records.iter().filter(|r| r.key == key).collect()
    }

    /// Returns true if any record has the key.
    #[must_use]
    pub fn contains(&self, key: MessageKey) -> bool {
        self.records.iter().any(|r| r.key == key)
    }

    /// Statistics about the log.
    #[must_use]
    pub fn stats(&self) -> DiagnosticStats {
        let mut key_counts = HashMap::new();
        for record in &self.records {
            *key_counts.entry(record.key.as_str()).or_insert(0) += 1;
        }
        DiagnosticStats {
            record_count: self.records.len(),
            max_size: self.max_size,
            dropped: self.dropped,
            key_counts,
        }
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::default_size()
    }
}

impl Diagnostics for DiagnosticLog {
    fn add_message(&mut self, key: MessageKey, args: Vec<String>) {
        let message = key.describe(&args);
        match key.severity() {
            Severity::Info => tracing::info!(key = key.as_str(), "{message}"),
            Severity::Warning | Severity::Error => tracing::warn!(key = key.as_str(), "{message}"),
        }
        self.push(key, args);
    }
}

// =============================================================================
// Log Statistics
// =============================================================================

/// Statistics about a diagnostic log.
#[derive(Clone, Debug)]
pub struct DiagnosticStats {
    /// Records currently held.
    pub record_count: usize,
    /// Capacity.
    pub max_size: usize,
    /// Records evicted so far.
    pub dropped: u64,
    /// Count per message key.
    pub key_counts: HashMap<&'static str, usize>,
}

// =============================================================================
// Tests
// =============================================================================
