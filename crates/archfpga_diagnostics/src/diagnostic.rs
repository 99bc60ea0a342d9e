//! Structured diagnostic messages with severity, code and provenance.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use crate::code::Category;
use archfpga_common::{ArchError, SourceLoc};
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Each diagnostic includes:
/// - A severity level and unique code
/// - A primary message and the location it refers to
/// - Optional notes and help text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of finding.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Where in the architecture description the finding applies.
    pub loc: SourceLoc,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        loc: &SourceLoc,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            loc: loc.clone(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, loc: &SourceLoc) -> Self {
        Self::with_severity(Severity::Error, code, message, loc)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, loc: &SourceLoc) -> Self {
        Self::with_severity(Severity::Warning, code, message, loc)
    }

    /// Creates a new informational note.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, loc: &SourceLoc) -> Self {
        Self::with_severity(Severity::Note, code, message, loc)
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Renders a construction failure as an error diagnostic.
    ///
    /// Each failure kind has its own `E` code. A denied warning keeps its
    /// original code, so `deny = ["T300"]` shows up as `error[T300]`.
    pub fn from_arch_error(err: &ArchError) -> Self {
        let number = match err {
            ArchError::Duplicate { .. } => 1,
            ArchError::UnknownReference { .. } => 2,
            ArchError::Shape { .. } => 3,
            ArchError::Inconsistent { .. } => 4,
            ArchError::Malformed { .. } => 5,
            ArchError::Denied { code, .. } => {
                let denied = code
                    .parse()
                    .unwrap_or(DiagnosticCode::new(Category::Error, 6));
                return Self::error(denied, err.message(), err.loc())
                    .with_note(format!("{code} is denied by configuration"));
            }
        };
        Self::error(DiagnosticCode::new(Category::Error, number), err.message(), err.loc())
    }
}
