//! Diagnostics facility.
//!
//! Anomalies never abort a traversal. They are reported here and rendered
//! alongside the tree.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Informational.
    Info,
    /// Output may be incomplete.
    Warning,
    /// Output was cut short.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Identifies a diagnostic message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// A resource limit tripped the fuse. Args: limit description.
    ResourceExhausted,
    /// The call budget is one call from exhaustion. Args: limit.
    CallBudgetLow,
    /// The call budget is spent. Args: limit.
    CallBudgetSpent,
    /// The inspector is disabled and skipped the request.
    InspectorDisabled,
    /// Spill storage is unusable; output stays inline. Args: reason.
    SpillUnavailable,
    /// A setting could not be parsed. Args: name, raw value.
    InvalidSetting,
    /// The host could not answer an introspection query. Args: subject.
    IntrospectionGap,
    /// A secondary classification probe panicked. Args: value label.
    ProbeFailed,
}

impl MessageKey {
    /// Stable identifier used in rendered output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResourceExhausted => "resource-exhausted",
            Self::CallBudgetLow => "call-budget-low",
            Self::CallBudgetSpent => "call-budget-spent",
            Self::InspectorDisabled => "inspector-disabled",
            Self::SpillUnavailable => "spill-unavailable",
            Self::InvalidSetting => "invalid-setting",
            Self::IntrospectionGap => "introspection-gap",
            Self::ProbeFailed => "probe-failed",
        }
    }

    /// Default severity of the message.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::ResourceExhausted | Self::CallBudgetSpent => Severity::Error,
            Self::CallBudgetLow
            | Self::SpillUnavailable
            | Self::InvalidSetting
            | Self::IntrospectionGap
            | Self::ProbeFailed => Severity::Warning,
            Self::InspectorDisabled => Severity::Info,
        }
    }

    /// Renders the message text from its arguments.
    #[must_use]
    pub fn describe(self, args: &[String]) -> String {
        let arg = |i: usize| args.get(i).map_or("?", String::as_str);
        match self {
            Self::ResourceExhausted => {
                format!("{}; inspection disabled for this process", arg(0))
            }
            Self::CallBudgetLow => format!("one call left before the limit of {}", arg(0)),
            Self::CallBudgetSpent => format!("max call count ({}) reached", arg(0)),
            Self::InspectorDisabled => "inspector is disabled".to_string(),
            Self::SpillUnavailable => format!("spilling disabled: {}", arg(0)),
            Self::InvalidSetting => format!("ignored setting {} = {:?}", arg(0), arg(1)),
            Self::IntrospectionGap => format!("cannot introspect {}", arg(0)),
            Self::ProbeFailed => format!("classification probe failed for {}", arg(0)),
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives diagnostics.
pub trait Diagnostics {
    /// Records a message.
    fn add_message(&mut self, key: MessageKey, args: Vec<String>);
}

/// Collects messages in order; useful where no log is wired up.
impl Diagnostics for Vec<(MessageKey, Vec<String>)> {
    fn add_message(&mut self, key: MessageKey, args: Vec<String>) {
        self.push((key, args));
    }
}
