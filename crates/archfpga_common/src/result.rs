//! The construction error shared by every stage of the architecture build.

use crate::loc::SourceLoc;

/// The result type for every fallible architecture construction step.
///
/// Construction is all-or-nothing: an `Err` means the architecture failed to
/// load and any partially built state must be discarded by the caller.
pub type ArchResult<T> = Result<T, ArchError>;

/// A failure while building or validating the architecture model.
///
/// Each variant carries a human-readable message and the provenance of the
/// input node that triggered it.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ArchError {
    /// Two definitions share a name in the same scope.
    #[error("{loc}: duplicate {what} '{name}'")]
    Duplicate {
        /// What kind of entity collided (e.g. "model", "mode").
        what: &'static str,
        /// The colliding name.
        name: String,
        /// Where the second definition was found.
        loc: SourceLoc,
    },

    /// A name (port, model, segment, switch, clock, block) did not resolve.
    #[error("{loc}: {message}")]
    UnknownReference {
        /// Description of the failed lookup.
        message: String,
        /// Where the reference was made.
        loc: SourceLoc,
    },

    /// Port counts, pin counts or range widths do not fit together.
    #[error("{loc}: {message}")]
    Shape {
        /// Description of the mismatch.
        message: String,
        /// Where the mismatch was detected.
        loc: SourceLoc,
    },

    /// Facts that must agree across the model disagree.
    #[error("{loc}: {message}")]
    Inconsistent {
        /// Description of the disagreement.
        message: String,
        /// Where the disagreement was detected.
        loc: SourceLoc,
    },

    /// The input tree has an unexpected node, attribute or value.
    #[error("{loc}: {message}")]
    Malformed {
        /// Description of the problem.
        message: String,
        /// The offending node.
        loc: SourceLoc,
    },

    /// A warning that configuration promoted to a hard failure.
    #[error("{loc}: {message} [{code} is denied]")]
    Denied {
        /// The diagnostic code, e.g. `T300`.
        code: String,
        /// The warning text.
        message: String,
        /// Where the warning was raised.
        loc: SourceLoc,
    },
}

impl ArchError {
    /// Creates a [`Duplicate`](ArchError::Duplicate) error.
    pub fn duplicate(what: &'static str, name: impl Into<String>, loc: &SourceLoc) -> Self {
        ArchError::Duplicate {
            what,
            name: name.into(),
            loc: loc.clone(),
        }
    }

    /// Creates an [`UnknownReference`](ArchError::UnknownReference) error.
    pub fn unknown(message: impl Into<String>, loc: &SourceLoc) -> Self {
        ArchError::UnknownReference {
            message: message.into(),
            loc: loc.clone(),
        }
    }

    /// Creates a [`Shape`](ArchError::Shape) error.
    pub fn shape(message: impl Into<String>, loc: &SourceLoc) -> Self {
        ArchError::Shape {
            message: message.into(),
            loc: loc.clone(),
        }
    }

    /// Creates an [`Inconsistent`](ArchError::Inconsistent) error.
    pub fn inconsistent(message: impl Into<String>, loc: &SourceLoc) -> Self {
        ArchError::Inconsistent {
            message: message.into(),
            loc: loc.clone(),
        }
    }

    /// Creates a [`Malformed`](ArchError::Malformed) error.
    pub fn malformed(message: impl Into<String>, loc: &SourceLoc) -> Self {
        ArchError::Malformed {
            message: message.into(),
            loc: loc.clone(),
        }
    }

    /// Returns the provenance attached to this error.
    pub fn loc(&self) -> &SourceLoc {
        match self {
            ArchError::Duplicate { loc, .. }
            | ArchError::UnknownReference { loc, .. }
            | ArchError::Shape { loc, .. }
            | ArchError::Inconsistent { loc, .. }
            | ArchError::Malformed { loc, .. }
            | ArchError::Denied { loc, .. } => loc,
        }
    }

    /// Returns the message without the location prefix.
    pub fn message(&self) -> String {
        match self {
            ArchError::Duplicate { what, name, .. } => format!("duplicate {what} '{name}'"),
            ArchError::UnknownReference { message, .. }
            | ArchError::Shape { message, .. }
            | ArchError::Inconsistent { message, .. }
            | ArchError::Malformed { message, .. }
            | ArchError::Denied { message, .. } => message.clone(),
        }
    }
}
