//! The process-level inspector.
//!
//! An [`Inspector`] owns what outlives a single request: the settings, the
//! sticky fuse, and the janitor that sweeps stale spill files once.

use std::io::Write;
use std::sync::Arc;

use spyglass_debug::output::{ChunkJanitor, OutputAccumulator, OutputConfig};
use spyglass_engine::{
    Diagnostics, Fuse, Limits, MemoryProbe, MessageKey, ProcMemoryProbe, ResourceGovernor,
    SettingSource, Settings,
};
use spyglass_foundation::{Result, Value};

use crate::session::{OutputFormat, Session, SessionReport};

/// Entry point for inspections.
pub struct Inspector {
    settings: Settings,
    fuse: Arc<Fuse>,
    janitor: Arc<ChunkJanitor>,
    probe: Arc<dyn MemoryProbe>,
    format: OutputFormat,
    startup: Vec<(MessageKey, Vec<String>)>,
}

impl Inspector {
    /// Creates an inspector with its own fuse and janitor.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            fuse: Arc::new(Fuse::new()),
            janitor: Arc::new(ChunkJanitor::new()),
            probe: Arc::new(ProcMemoryProbe),
            format: OutputFormat::default(),
            startup: Vec::new(),
        }
    }

    /// Creates an inspector from raw settings.
    ///
    /// Settings that fail to parse are reported in every session.
    #[must_use]
    pub fn from_source(source: &dyn SettingSource) -> Self {
        let mut startup: Vec<(MessageKey, Vec<String>)> = Vec::new();
        let settings = Settings::from_source(source, &mut startup);
        Self {
            startup,
            ..Self::new(settings)
        }
    }

    /// Builder method to adjust the settings.
    #[must_use]
    pub fn configure(mut self, adjust: impl FnOnce(Settings) -> Settings) -> Self {
        self.settings = adjust(self.settings);
        self
    }

    /// Builder method to share an existing fuse.
    #[must_use]
    pub fn with_fuse(mut self, fuse: Arc<Fuse>) -> Self {
        self.fuse = fuse;
        self
    }

    /// Builder method to share an existing janitor.
    #[must_use]
    pub fn with_janitor(mut self, janitor: Arc<ChunkJanitor>) -> Self {
        self.janitor = janitor;
        self
    }

    /// Builder method to set the memory probe.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Builder method to set the output format.
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// The settings in effect.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The shared fuse.
    #[must_use]
    pub fn fuse(&self) -> &Arc<Fuse> {
        &self.fuse
    }

    /// Returns true once a resource limit has disabled inspection.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.fuse.disable_requested()
    }

    /// Re-enables inspection after the fuse tripped.
    pub fn reset(&self) {
        self.fuse.reset();
    }

    /// Opens a session.
    ///
    /// The first session sweeps stale spill files from the chunk directory.
    #[must_use]
    pub fn session(&self) -> Session {
        let output_config = OutputConfig::from_settings(&self.settings);
        if output_config.spill {
            if let Some(Err(e)) = self.janitor.sweep_once(&output_config.chunk_dir, output_config.ttl) {
                tracing::debug!(error = %e, "stale spill sweep failed");
            }
        }

        let governor = ResourceGovernor::with_probe(
            Limits::from_settings(&self.settings),
            Arc::clone(&self.fuse),
            Arc::clone(&self.probe),
        );
        let mut session = Session::new(
            self.settings.clone(),
            governor,
            Arc::clone(&self.probe),
            OutputAccumulator::new(output_config),
            self.format,
        );
        for (key, args) in &self.startup {
            session.diagnostics_mut().add_message(*key, args.clone());
        }
        tracing::info!(model = ?self.settings.host_model, "session opened");
        session
    }

    /// Inspects one value in a fresh session and writes the result to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn inspect(
        &self,
        host: &dyn spyglass_engine::Introspector,
        name: &str,
        value: &Value,
        out: &mut dyn Write,
    ) -> Result<SessionReport> {
        let mut session = self.session();
        session.inspect(host, name, value);
        session.finish(out)
    }
}
