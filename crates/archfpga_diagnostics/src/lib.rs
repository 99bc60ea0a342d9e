//! Soft findings raised while building the architecture model.
//!
//! Hard failures are returned as [`ArchError`](archfpga_common::ArchError)
//! values. Everything that lets construction continue (missing timing on a
//! library primitive, overlapping Fc overrides, informational notes) becomes
//! a [`Diagnostic`] emitted into a thread-safe [`DiagnosticSink`], and the
//! [`DiagnosticRenderer`] implementations format them for a terminal or as
//! JSON lines.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
