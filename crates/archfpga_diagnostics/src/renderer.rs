//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;

    /// Renders a batch of diagnostics, one after another.
    fn render_all(&self, diags: &[Diagnostic]) -> String {
        diags.iter().map(|d| self.render(d)).collect()
    }
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[T300]: pb_type 'ff' is missing timing for port 'D' (T_setup or T_hold)
///   --> k4_n4.xml:58
///    = note: ...
///    = help: ...
/// ```
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!("{}[{}]: {}\n", diag.severity, diag.code, diag.message);

        if !diag.loc.is_unknown() {
            out.push_str(&format!("  --> {}\n", diag.loc));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

/// Renders each diagnostic as one line of JSON.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    /// Creates a new JSON renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let value = serde_json::json!({
            "severity": diag.severity.to_string(),
            "code": diag.code.to_string(),
            "message": diag.message,
            "file": diag.loc.file,
            "line": diag.loc.line,
            "notes": diag.notes,
            "help": diag.help,
        });
        format!("{value}\n")
    }
}
