//! Resource governance.
//!
//! Every unit of work starts with [`ResourceGovernor::check_break`]. The
//! first failed check trips a [`Fuse`] shared by everything in the process;
//! after that every check short-circuits until the fuse is reset.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use spyglass_foundation::ResourceLimit;

use crate::config::Settings;
use crate::diagnostics::{Diagnostics, MessageKey};

const MIB: u64 = 1024 * 1024;

// =============================================================================
// Fuse
// =============================================================================

/// Sticky process-wide kill switch.
#[derive(Debug, Default)]
pub struct Fuse {
    tripped: AtomicBool,
    disable_requested: AtomicBool,
    trips: AtomicU64,
}

impl Fuse {
    /// Creates an intact fuse.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once tripped.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Trips the fuse and asks the owning facility to disable itself.
    ///
    /// Returns true if this call tripped it.
    pub fn trip(&self) -> bool {
        let first = !self.tripped.swap(true, Ordering::AcqRel);
        if first {
            self.trips.fetch_add(1, Ordering::Relaxed);
            self.disable_requested.store(true, Ordering::Release);
        }
        first
    }

    /// Returns true if a trip asked the facility to disable itself.
    #[must_use]
    pub fn disable_requested(&self) -> bool {
        self.disable_requested.load(Ordering::Acquire)
    }

    /// Number of times the fuse has tripped since creation.
    #[must_use]
    pub fn trip_count(&self) -> u64 {
        self.trips.load(Ordering::Relaxed)
    }

    /// Restores the fuse.
    pub fn reset(&self) {
        self.tripped.store(false, Ordering::Release);
        self.disable_requested.store(false, Ordering::Release);
    }
}

// =============================================================================
// Memory Probe
// =============================================================================

/// Reports current memory usage.
pub trait MemoryProbe: Send + Sync {
    /// Bytes in use; zero when unknown.
    fn used_bytes(&self) -> u64;
}

/// Reads the resident set size from `/proc/self/statm`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcMemoryProbe;

impl MemoryProbe for ProcMemoryProbe {
    fn used_bytes(&self) -> u64 {
        // statm reports pages: size resident shared ...
        fs::read_to_string("/proc/self/statm")
            .ok()
            .and_then(|s| s.split_whitespace().nth(1)?.parse::<u64>().ok())
            .map_or(0, |pages| pages * 4096)
    }
}

/// Probe returning a fixed value that tests can change.
#[derive(Debug, Default)]
pub struct FixedMemoryProbe {
    used: AtomicU64,
    reads: AtomicU64,
}

impl FixedMemoryProbe {
    /// Creates a probe reporting `used` bytes.
    #[must_use]
    pub fn new(used: u64) -> Self {
        Self {
            used: AtomicU64::new(used),
            reads: AtomicU64::new(0),
        }
    }

    /// Changes the reported usage.
    pub fn set(&self, used: u64) {
        self.used.store(used, Ordering::Relaxed);
    }

    /// Number of times the probe was read.
    #[must_use]
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn used_bytes(&self) -> u64 {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.used.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Governor
// =============================================================================

/// Limits enforced by a governor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Deadline measured from first use.
    pub max_runtime: Option<Duration>,
    /// Memory ceiling in bytes; zero disables the headroom check.
    pub memory_limit: u64,
    /// Minimum headroom in bytes.
    pub min_memory_left: u64,
    /// Calls allowed; zero disables the budget.
    pub max_calls: u32,
    /// Maximum nesting depth.
    pub max_depth: usize,
}

impl Limits {
    /// Extracts limits from settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_runtime: settings.max_runtime(),
            memory_limit: settings.memory_limit_mb.saturating_mul(MIB),
            min_memory_left: settings.min_memory_left_mb.saturating_mul(MIB),
            max_calls: settings.max_calls,
            max_depth: settings.max_depth,
        }
    }
}

/// Tracks time, memory headroom, calls, and nesting depth.
pub struct ResourceGovernor {
    limits: Limits,
    fuse: Arc<Fuse>,
    probe: Arc<dyn MemoryProbe>,
    started: Option<Instant>,
    depth: usize,
    deepest: usize,
    calls: u32,
    warned_calls: bool,
}

impl std::fmt::Debug for ResourceGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGovernor")
            .field("limits", &self.limits)
            .field("tripped", &self.fuse.is_tripped())
            .field("depth", &self.depth)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl ResourceGovernor {
    /// Creates a governor sharing `fuse`, reading memory from `/proc`.
    #[must_use]
    pub fn new(limits: Limits, fuse: Arc<Fuse>) -> Self {
        Self::with_probe(limits, fuse, Arc::new(ProcMemoryProbe))
    }

    /// Creates a governor with a custom memory probe.
    #[must_use]
    pub fn with_probe(limits: Limits, fuse: Arc<Fuse>, probe: Arc<dyn MemoryProbe>) -> Self {
        Self {
            limits,
            fuse,
            probe,
            started: None,
            depth: 0,
            deepest: 0,
            calls: 0,
            warned_calls: false,
        }
    }

    /// The enforced limits.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The shared fuse.
    #[must_use]
    pub fn fuse(&self) -> &Arc<Fuse> {
        &self.fuse
    }

    /// Returns true if work must stop.
    ///
    /// The deadline starts at the first call. Once the fuse is tripped
    /// neither time nor memory is measured again.
    pub fn check_break(&mut self, diag: &mut dyn Diagnostics) -> bool {
        if self.fuse.is_tripped() {
            return true;
        }

        let started = *self.started.get_or_insert_with(Instant::now);
        if let Some(limit) = self.limits.max_runtime {
            if started.elapsed() > limit {
                let limit = ResourceLimit::Time {
                    limit_secs: limit.as_secs(),
                };
                return self.trip(limit, diag);
            }
        }

        if self.limits.memory_limit > 0 {
            let used = self.probe.used_bytes();
            let left = self.limits.memory_limit.saturating_sub(used);
            if left < self.limits.min_memory_left {
                let limit = ResourceLimit::Memory {
                    floor_bytes: self.limits.min_memory_left,
                    left_bytes: left,
                };
                return self.trip(limit, diag);
            }
        }

        false
    }

    fn trip(&mut self, limit: ResourceLimit, diag: &mut dyn Diagnostics) -> bool {
        if self.fuse.trip() {
            tracing::warn!(%limit, "resource limit reached, disabling inspection");
            diag.add_message(MessageKey::ResourceExhausted, vec![limit.to_string()]);
        }
        true
    }

    /// Pushes one nesting level.
    pub fn enter_nesting(&mut self) {
        self.depth += 1;
        self.deepest = self.deepest.max(self.depth);
    }

    /// Pops one nesting level.
    pub fn leave_nesting(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced leave_nesting");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Returns true if the current depth exceeds the limit.
    #[must_use]
    pub fn check_nesting_too_deep(&self) -> bool {
        self.depth > self.limits.max_depth
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Deepest level entered so far.
    #[must_use]
    pub fn deepest(&self) -> usize {
        self.deepest
    }

    /// Counts a call; returns true if it must be denied.
    ///
    /// A warning is issued one call before the limit.
    pub fn check_call_budget(&mut self, diag: &mut dyn Diagnostics) -> bool {
        self.calls = self.calls.saturating_add(1);
        let max = self.limits.max_calls;
        if max == 0 {
            return false;
        }
        if self.calls >= max {
            if self.calls == max {
                tracing::warn!(limit = max, "call budget spent");
                diag.add_message(MessageKey::CallBudgetSpent, vec![max.to_string()]);
            }
            return true;
        }
        if self.calls + 1 == max && !self.warned_calls {
            self.warned_calls = true;
            diag.add_message(MessageKey::CallBudgetLow, vec![max.to_string()]);
        }
        false
    }

    /// Calls counted so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls
    }
}
