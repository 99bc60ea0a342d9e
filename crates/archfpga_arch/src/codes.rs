//! Diagnostic codes and constructors for soft findings.
//!
//! `T300`–`T301` cover missing timing information, `W302` overlapping Fc
//! overrides, and `I303` modes hidden from the packer. Hard failures are
//! [`ArchError`](archfpga_common::ArchError) values and carry no code.

use archfpga_common::SourceLoc;
use archfpga_diagnostics::{Category, Diagnostic, DiagnosticCode};

/// A leaf bound to a built-in model lacks a timing annotation it needs.
pub const T300: DiagnosticCode = DiagnosticCode {
    category: Category::Timing,
    number: 300,
};

/// A model port has no timing specification at all.
pub const T301: DiagnosticCode = DiagnosticCode {
    category: Category::Timing,
    number: 301,
};

/// More than one `<fc_override>` matched the same port and segment.
pub const W302: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 302,
};

/// A mode is disabled for packing.
pub const I303: DiagnosticCode = DiagnosticCode {
    category: Category::Info,
    number: 303,
};

/// Creates a T300 warning.
pub fn missing_library_timing(message: String, loc: &SourceLoc) -> Diagnostic {
    Diagnostic::warning(T300, message, loc)
        .with_note("built-in primitives without timing are treated as zero delay")
}

/// Creates a T301 warning for a model input with no timing relation.
pub fn untimed_model_input(model: &str, port: &str, loc: &SourceLoc) -> Diagnostic {
    Diagnostic::warning(
        T301,
        format!(
            "Model '{model}' input port '{port}' has no timing specification (no clock specified to create a sequential input port, not combinationally connected to any outputs, not a clock input)"
        ),
        loc,
    )
}

/// Creates a T301 warning for a model output with no timing relation.
pub fn untimed_model_output(model: &str, port: &str, loc: &SourceLoc) -> Diagnostic {
    Diagnostic::warning(
        T301,
        format!(
            "Model '{model}' output port '{port}' has no timing specification (no clock specified to create a sequential output port, not combinationally connected to any inputs, not a clock output)"
        ),
        loc,
    )
}

/// Creates a W302 warning.
pub fn multiple_fc_overrides(
    port: &str,
    segment: &str,
    count: usize,
    loc: &SourceLoc,
) -> Diagnostic {
    Diagnostic::warning(
        W302,
        "Multiple matching Fc overrides found; the last will be applied",
        loc,
    )
    .with_note(format!(
        "port '{port}' and segment '{segment}' matched {count} overrides"
    ))
}

/// Creates an I303 note.
pub fn packing_disabled(pb_type: &str, mode: &str, loc: &SourceLoc) -> Diagnostic {
    Diagnostic::note(
        I303,
        format!("mode '{pb_type}[{mode}]' is defined by user to be disabled in packing"),
        loc,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use archfpga_diagnostics::Severity;

    #[test]
    fn code_strings() {
        assert_eq!(T300.to_string(), "T300");
        assert_eq!(T301.to_string(), "T301");
        assert_eq!(W302.to_string(), "W302");
        assert_eq!(I303.to_string(), "I303");
    }

    #[test]
    fn constructors_set_severity() {
        let loc = SourceLoc::at_line(1);
        assert_eq!(
            missing_library_timing("x".into(), &loc).severity,
            Severity::Warning
        );
        assert_eq!(packing_disabled("clb", "m", &loc).severity, Severity::Note);
        let w = multiple_fc_overrides("I", "L4", 2, &loc);
        assert_eq!(w.code, W302);
        assert!(w.notes[0].contains("matched 2"));
        assert!(untimed_model_input("m", "a", &loc).message.contains("input port 'a'"));
        assert!(untimed_model_output("m", "z", &loc).message.contains("output port 'z'"));
    }
}
