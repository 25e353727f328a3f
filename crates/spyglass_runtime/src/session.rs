//! Inspection sessions.
//!
//! A session covers one request (or one CLI invocation). It owns the call
//! budget, the deadline, the diagnostics log, and the output accumulator.
//! Nesting depth and identity tracking are scoped to a single traversal.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use spyglass_debug::{DiagnosticLog, DocumentFormat, JsonRenderer, OutputAccumulator, TextRenderer};
use spyglass_engine::{
    CallerScope, Diagnostics, HostModel, Introspector, Limits, MemoryProbe, MessageKey, Presenter,
    ResourceGovernor, Settings, TypeRouter,
};
use spyglass_foundation::{Error, Result, Value};

/// Output format of a session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented plain text.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

impl OutputFormat {
    fn document_format(self) -> Box<dyn DocumentFormat> {
        match self {
            Self::Text => Box::new(TextRenderer::new()),
            Self::Json => Box::new(JsonRenderer::new()),
        }
    }
}

/// Summary of a finished session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Bytes written to the sink.
    pub bytes: u64,
    /// Inspections that produced output.
    pub rendered: usize,
    /// Inspections skipped (disabled, budget spent, or fuse tripped).
    pub skipped: usize,
    /// Diagnostics recorded.
    pub diagnostics: usize,
    /// Fragments spilled to disk.
    pub spilled: usize,
    /// Diagnostics log written, if any.
    pub log_file: Option<PathBuf>,
}

/// One request's worth of inspection state.
pub struct Session {
    settings: Settings,
    limits: Limits,
    probe: Arc<dyn MemoryProbe>,
    governor: ResourceGovernor,
    log: DiagnosticLog,
    output: OutputAccumulator,
    format: Box<dyn DocumentFormat>,
    scope: CallerScope,
    roots: Vec<String>,
    started: usize,
    rendered: usize,
    skipped: usize,
    reported_disabled: bool,
}

impl Session {
    pub(crate) fn new(
        settings: Settings,
        governor: ResourceGovernor,
        probe: Arc<dyn MemoryProbe>,
        output: OutputAccumulator,
        format: OutputFormat,
    ) -> Self {
        Self {
            limits: *governor.limits(),
            settings,
            probe,
            governor,
            log: DiagnosticLog::default(),
            output,
            format: format.document_format(),
            scope: CallerScope::Outside,
            roots: Vec::new(),
            started: 0,
            rendered: 0,
            skipped: 0,
            reported_disabled: false,
        }
    }

    /// Builder method to set the caller scope used for member visibility.
    #[must_use]
    pub fn with_scope(mut self, scope: CallerScope) -> Self {
        self.scope = scope;
        self
    }

    /// The settings in effect.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The session's governor.
    #[must_use]
    pub fn governor(&self) -> &ResourceGovernor {
        &self.governor
    }

    /// The diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.log
    }

    /// Mutable access to the diagnostics log.
    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticLog {
        &mut self.log
    }

    /// Returns true if the shared fuse has disabled inspection.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        let fuse = self.governor.fuse();
        fuse.is_tripped() || fuse.disable_requested()
    }

    /// Inspects `value` under `name`, adding its rendering to the document.
    ///
    /// Returns true if anything was rendered. Every inspection is its own
    /// traversal, starting at depth zero with a fresh identity tracker, and
    /// draws on the session's call budget and deadline.
    pub fn inspect(&mut self, host: &dyn Introspector, name: &str, value: &Value) -> bool {
        if self.is_disabled() {
            if !self.reported_disabled {
                self.reported_disabled = true;
                self.log.add_message(MessageKey::InspectorDisabled, Vec::new());
            }
            self.skipped += 1;
            return false;
        }

        if self.started > 0 && self.settings.host_model == HostModel::Cli {
            self.governor = ResourceGovernor::with_probe(
                self.limits,
                Arc::clone(self.governor.fuse()),
                Arc::clone(&self.probe),
            );
        }
        self.started += 1;

        if self.governor.check_call_budget(&mut self.log) {
            self.skipped += 1;
            return false;
        }

        let node = {
            let mut router = TypeRouter::new(host, &self.settings, &mut self.governor, &mut self.log)
                .with_scope(self.scope);
            router.dispatch(name, value)
        };

        let fragment = Presenter::new(self.format.renderer()).present(&node, &mut self.output);
        self.output.report(&mut self.log);
        if fragment.is_empty() {
            self.skipped += 1;
            return false;
        }

        tracing::info!(name, nodes = node.count(), deepest = self.governor.deepest(), "inspected value");
        self.roots.push(fragment);
        self.rendered += 1;
        true
    }

    /// Writes the document followed by diagnostics to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` or reading spilled output fails.
    /// A failing diagnostics log file is reported through `tracing` only.
    pub fn finish(mut self, out: &mut dyn Write) -> Result<SessionReport> {
        self.output.report(&mut self.log);

        let roots = std::mem::take(&mut self.roots);
        let records: Vec<_> = self.log.iter().collect();
        for part in self.format.document(roots, &records) {
            self.output.append(part);
        }
        let spilled = self.output.spilled_count();
        let bytes = self.output.emit(out)?;

        let log_file = match self.settings.log_dir.clone() {
            Some(dir) => match self.write_log(&dir) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "could not write diagnostics log");
                    None
                }
            },
            None => None,
        };

        tracing::info!(bytes, rendered = self.rendered, skipped = self.skipped, "session finished");
        Ok(SessionReport {
            bytes,
            rendered: self.rendered,
            skipped: self.skipped,
            diagnostics: self.log.len(),
            spilled,
            log_file,
        })
    }

    fn write_log(&self, dir: &std::path::Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::io(format!("creating {}", dir.display()), &e))?;
        let path = dir.join(format!("spyglass-{}.log", self.output.session_key()));
        let mut text = String::new();
        for record in self.log.iter() {
            let _ = writeln!(text, "{}\t{}\t{}", record.severity, record.key, record.message());
        }
        std::fs::write(&path, text)
            .map_err(|e| Error::io(format!("writing {}", path.display()), &e))?;
        Ok(path)
    }
}
