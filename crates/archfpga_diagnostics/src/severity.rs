//! How serious a finding about the architecture description is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The weight of a [`Diagnostic`](crate::Diagnostic).
///
/// Notes record facts a reader may want to know, such as a mode being
/// excluded from packing. Warnings flag gaps that leave the model usable,
/// such as an untimed model port. Errors are hard failures or denied
/// warnings rendered through the same channel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Informational.
    Note,
    /// Construction continues but the result may be incomplete.
    Warning,
    /// The architecture could not be built.
    Error,
}

impl Severity {
    /// Whether this is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}
