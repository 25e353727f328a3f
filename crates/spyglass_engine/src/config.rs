//! Settings for inspection.
//!
//! Settings come from a [`SettingSource`]. Values that fail to parse keep
//! their defaults and are reported as diagnostics.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use spyglass_foundation::{Error, Result};

use crate::diagnostics::{Diagnostics, MessageKey};

/// Supplies raw setting values by name.
pub trait SettingSource {
    /// Returns the raw value of a setting, if set.
    fn get_setting(&self, name: &str) -> Option<String>;
}

impl SettingSource for HashMap<String, String> {
    fn get_setting(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Reads settings from environment variables.
///
/// `max-nesting-level` is read from `SPYGLASS_MAX_NESTING_LEVEL`.
#[derive(Clone, Debug)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    /// Creates a source using the `SPYGLASS_` prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix("SPYGLASS_")
    }

    /// Creates a source with a custom prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable consulted for a setting.
    #[must_use]
    pub fn variable(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name.to_uppercase().replace('-', "_"))
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingSource for EnvSource {
    fn get_setting(&self, name: &str) -> Option<String> {
        std::env::var(self.variable(name)).ok()
    }
}

/// How budgets map onto host invocations.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HostModel {
    /// One budget per request; repeated invocations share the deadline.
    #[default]
    Request,
    /// Every top-level invocation gets a fresh budget.
    Cli,
}

/// Inspection settings.
///
/// The memory headroom check is off by default. `memory_limit_mb` starts at
/// zero, and the floor has no effect until a ceiling is set with
/// [`Settings::with_memory`] or the `memory-limit-mb` setting.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Show protected members.
    pub analyse_protected: bool,
    /// Show private members.
    pub analyse_private: bool,
    /// Derive values for getter-style methods.
    pub analyse_getters: bool,
    /// Show constants.
    pub analyse_constants: bool,
    /// Show methods.
    pub analyse_methods: bool,
    /// Show members exposed by debug providers.
    pub analyse_debug_members: bool,
    /// Maximum composite nesting depth.
    pub max_depth: usize,
    /// Runtime limit per session; zero disables it.
    pub max_runtime_secs: u64,
    /// Memory headroom floor in MiB. Ignored while `memory_limit_mb` is zero.
    pub min_memory_left_mb: u64,
    /// Memory ceiling in MiB. Zero, the default, disables the headroom check.
    pub memory_limit_mb: u64,
    /// Calls allowed per session; zero disables the budget.
    pub max_calls: u32,
    /// Fragments at least this large are spilled.
    pub chunk_threshold_bytes: usize,
    /// Spill directory; defaults to a folder under the system temp dir.
    pub chunk_dir: Option<PathBuf>,
    /// Directory for diagnostics logs; none disables them.
    pub log_dir: Option<PathBuf>,
    /// Budget model.
    pub host_model: HostModel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analyse_protected: true,
            analyse_private: true,
            analyse_getters: false,
            analyse_constants: true,
            analyse_methods: true,
            analyse_debug_members: true,
            max_depth: 7,
            max_runtime_secs: 60,
            min_memory_left_mb: 16,
            memory_limit_mb: 0,
            max_calls: 100,
            chunk_threshold_bytes: 256 * 1024,
            chunk_dir: None,
            log_dir: None,
            host_model: HostModel::Request,
        }
    }
}

impl Settings {
    /// Everything visible, deep traversal.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            analyse_getters: true,
            max_depth: 16,
            ..Self::default()
        }
    }

    /// Public members only, shallow traversal.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            analyse_protected: false,
            analyse_private: false,
            analyse_getters: false,
            analyse_constants: false,
            analyse_methods: false,
            analyse_debug_members: false,
            max_depth: 3,
            ..Self::default()
        }
    }

    /// Builds settings from a source, reporting unparsable values.
    pub fn from_source(source: &dyn SettingSource, diag: &mut dyn Diagnostics) -> Self {
        let mut settings = Self::default();
        let mut read = |name: &str, apply: &mut dyn FnMut(&str) -> Result<()>| {
            if let Some(raw) = source.get_setting(name) {
                if apply(raw.trim()).is_err() {
                    diag.add_message(MessageKey::InvalidSetting, vec![name.to_string(), raw]);
                }
            }
        };

        read("analyse-protected", &mut |raw| {
            settings.analyse_protected = parse_flag("analyse-protected", raw)?;
            Ok(())
        });
        read("analyse-private", &mut |raw| {
            settings.analyse_private = parse_flag("analyse-private", raw)?;
            Ok(())
        });
        read("analyse-getters", &mut |raw| {
            settings.analyse_getters = parse_flag("analyse-getters", raw)?;
            Ok(())
        });
        read("analyse-constants", &mut |raw| {
            settings.analyse_constants = parse_flag("analyse-constants", raw)?;
            Ok(())
        });
        read("analyse-methods", &mut |raw| {
            settings.analyse_methods = parse_flag("analyse-methods", raw)?;
            Ok(())
        });
        read("analyse-debug-members", &mut |raw| {
            settings.analyse_debug_members = parse_flag("analyse-debug-members", raw)?;
            Ok(())
        });
        read("max-nesting-level", &mut |raw| {
            settings.max_depth = parse_number("max-nesting-level", raw)?;
            Ok(())
        });
        read("max-runtime-seconds", &mut |raw| {
            settings.max_runtime_secs = parse_number("max-runtime-seconds", raw)?;
            Ok(())
        });
        read("min-memory-left-mb", &mut |raw| {
            settings.min_memory_left_mb = parse_number("min-memory-left-mb", raw)?;
            Ok(())
        });
        read("memory-limit-mb", &mut |raw| {
            settings.memory_limit_mb = parse_number("memory-limit-mb", raw)?;
            Ok(())
        });
        read("max-call-count", &mut |raw| {
            settings.max_calls = parse_number("max-call-count", raw)?;
            Ok(())
        });
        read("chunk-threshold-bytes", &mut |raw| {
            settings.chunk_threshold_bytes = parse_number("chunk-threshold-bytes", raw)?;
            Ok(())
        });
        read("chunk-dir", &mut |raw| {
            settings.chunk_dir = non_empty_path("chunk-dir", raw)?;
            Ok(())
        });
        read("log-dir", &mut |raw| {
            settings.log_dir = non_empty_path("log-dir", raw)?;
            Ok(())
        });
        read("host-model", &mut |raw| {
            settings.host_model = match raw.to_ascii_lowercase().as_str() {
                "request" => HostModel::Request,
                "cli" => HostModel::Cli,
                _ => return Err(Error::invalid_setting("host-model", raw)),
            };
            Ok(())
        });

        settings
    }

    /// Runtime limit, if any.
    #[must_use]
    pub fn max_runtime(&self) -> Option<Duration> {
        (self.max_runtime_secs > 0).then(|| Duration::from_secs(self.max_runtime_secs))
    }

    /// Builder method to set the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder method to set the runtime limit.
    #[must_use]
    pub fn with_max_runtime_secs(mut self, secs: u64) -> Self {
        self.max_runtime_secs = secs;
        self
    }

    /// Builder method to set the memory ceiling and floor.
    ///
    /// A nonzero ceiling turns the headroom check on.
    #[must_use]
    pub fn with_memory(mut self, limit_mb: u64, min_left_mb: u64) -> Self {
        self.memory_limit_mb = limit_mb;
        self.min_memory_left_mb = min_left_mb;
        self
    }

    /// Builder method to set the call budget.
    #[must_use]
    pub fn with_max_calls(mut self, calls: u32) -> Self {
        self.max_calls = calls;
        self
    }

    /// Builder method to toggle protected members.
    #[must_use]
    pub fn with_protected(mut self, enabled: bool) -> Self {
        self.analyse_protected = enabled;
        self
    }

    /// Builder method to toggle private members.
    #[must_use]
    pub fn with_private(mut self, enabled: bool) -> Self {
        self.analyse_private = enabled;
        self
    }

    /// Builder method to toggle getter derivation.
    #[must_use]
    pub fn with_getters(mut self, enabled: bool) -> Self {
        self.analyse_getters = enabled;
        self
    }

    /// Builder method to toggle constants.
    #[must_use]
    pub fn with_constants(mut self, enabled: bool) -> Self {
        self.analyse_constants = enabled;
        self
    }

    /// Builder method to toggle methods.
    #[must_use]
    pub fn with_methods(mut self, enabled: bool) -> Self {
        self.analyse_methods = enabled;
        self
    }

    /// Builder method to toggle debug members.
    #[must_use]
    pub fn with_debug_members(mut self, enabled: bool) -> Self {
        self.analyse_debug_members = enabled;
        self
    }

    /// Builder method to set the spill threshold.
    #[must_use]
    pub fn with_chunk_threshold(mut self, bytes: usize) -> Self {
        self.chunk_threshold_bytes = bytes;
        self
    }

    /// Builder method to set the spill directory.
    #[must_use]
    pub fn with_chunk_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chunk_dir = Some(dir.into());
        self
    }

    /// Builder method to set the diagnostics log directory.
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Builder method to set the budget model.
    #[must_use]
    pub fn with_host_model(mut self, model: HostModel) -> Self {
        self.host_model = model;
        self
    }
}

/// Parses a boolean flag.
///
/// # Errors
/// Returns `InvalidSetting` for anything but the usual on/off spellings.
pub fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::invalid_setting(name, raw)),
    }
}

/// Parses a number.
///
/// # Errors
/// Returns `InvalidSetting` if the value does not parse.
pub fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| Error::invalid_setting(name, raw))
}

fn non_empty_path(name: &str, raw: &str) -> Result<Option<PathBuf>> {
    if raw.is_empty() {
        Err(Error::invalid_setting(name, raw))
    } else {
        Ok(Some(PathBuf::from(raw)))
    }
}
