//! Error types for the Spyglass system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Traversal itself never fails; these errors come from building host
//! models, loading snapshots, and setting up spill storage.

use std::fmt;

use thiserror::Error;

use crate::identity::InstanceId;

/// The main error type for Spyglass operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an instance not found error.
    #[must_use]
    pub fn instance_not_found(id: InstanceId) -> Self {
        Self::new(ErrorKind::InstanceNotFound(id))
    }

    /// Creates a stale instance reference error.
    #[must_use]
    pub fn stale_instance(id: InstanceId) -> Self {
        Self::new(ErrorKind::StaleInstance(id))
    }

    /// Creates a unit not found error.
    #[must_use]
    pub fn unit_not_found(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnitNotFound(name.into()))
    }

    /// Creates an I/O error with a description of the failed operation.
    #[must_use]
    pub fn io(operation: impl Into<String>, source: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io(format!("{}: {source}", operation.into())))
    }

    /// Creates an invalid setting error.
    #[must_use]
    pub fn invalid_setting(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSetting {
            name: name.into(),
            value: value.into(),
        })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Instance was not found in the heap.
    #[error("instance not found: {0:?}")]
    InstanceNotFound(InstanceId),

    /// Instance reference is stale (generation mismatch).
    #[error("stale instance reference: {0:?}")]
    StaleInstance(InstanceId),

    /// Unit name was not registered.
    #[error("unit not found: {0}")]
    UnitNotFound(String),

    /// Unit name was registered twice.
    #[error("duplicate unit: {0}")]
    DuplicateUnit(String),

    /// A unit composes something it cannot compose.
    #[error("invalid composition: {unit} cannot use {target} ({reason})")]
    InvalidComposition {
        /// The composing unit.
        unit: String,
        /// The unit it tried to compose.
        target: String,
        /// Why the composition is invalid.
        reason: String,
    },

    /// Filesystem operation failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// Snapshot encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A configuration value could not be interpreted.
    #[error("invalid setting {name}: {value:?}")]
    InvalidSetting {
        /// Setting name.
        name: String,
        /// The rejected raw value.
        value: String,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Resource limits (kill switches) that can be reached during a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLimit {
    /// Elapsed time passed the deadline.
    Time {
        /// The configured limit in seconds.
        limit_secs: u64,
    },
    /// Memory headroom dropped below the floor.
    Memory {
        /// The configured floor in bytes.
        floor_bytes: u64,
        /// Headroom measured when the limit tripped.
        left_bytes: u64,
    },
    /// Call budget used up.
    Calls {
        /// The configured limit.
        limit: u32,
    },
    /// Nesting depth exceeded.
    Nesting {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time { limit_secs } => write!(f, "max runtime ({limit_secs}s) exceeded"),
            Self::Memory {
                floor_bytes,
                left_bytes,
            } => write!(
                f,
                "memory headroom {} KiB below floor {} KiB",
                left_bytes / 1024,
                floor_bytes / 1024
            ),
            Self::Calls { limit } => write!(f, "max call count ({limit}) reached"),
            Self::Nesting { limit } => write!(f, "max nesting level ({limit}) reached"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file or snapshot path.
    pub source: Option<String>,
    /// Chain of units or members being processed.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
