//! Collects the findings raised while an architecture is built.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use std::sync::{Mutex, MutexGuard};

/// Accumulates diagnostics in emission order.
///
/// Builders only hold `&DiagnosticSink`, so one sink can be shared by
/// several architectures loaded side by side, including from other threads.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // A poisoned lock still holds a valid Vec.
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `diag`.
    pub fn emit(&self, diag: Diagnostic) {
        self.lock().push(diag);
    }

    /// How many held diagnostics carry `code`.
    pub fn count_code(&self, code: DiagnosticCode) -> usize {
        self.lock().iter().filter(|d| d.code == code).count()
    }

    /// Drains every diagnostic, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// A copy of the held diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }
}
