//! Routing of soft findings through the configured diagnostic policy.

use archfpga_common::{ArchError, ArchResult};
use archfpga_config::ArchConfig;
use archfpga_diagnostics::{Diagnostic, DiagnosticSink};

/// Applies `[diagnostics] deny`/`allow` before a finding reaches the sink.
pub struct Reporter<'a> {
    config: &'a ArchConfig,
    sink: &'a DiagnosticSink,
}

impl<'a> Reporter<'a> {
    /// Creates a reporter over the given policy and sink.
    pub fn new(config: &'a ArchConfig, sink: &'a DiagnosticSink) -> Self {
        Self { config, sink }
    }

    /// Whether leaf timing checks are enabled.
    pub fn timing_enabled(&self) -> bool {
        self.config.build.timing_enabled
    }

    /// Emits `diag`, drops it if allowed, or fails if its code is denied.
    pub fn emit(&self, diag: Diagnostic) -> ArchResult<()> {
        if self.config.is_allowed(diag.code) {
            return Ok(());
        }
        if self.config.is_denied(diag.code) {
            return Err(ArchError::Denied {
                code: diag.code.to_string(),
                message: diag.message,
                loc: diag.loc,
            });
        }
        self.sink.emit(diag);
        Ok(())
    }
}
