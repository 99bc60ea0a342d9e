//! File and line provenance attached to input nodes and errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a piece of the architecture description came from.
///
/// The reader that produces the input tree fills this in per node. Values
/// built programmatically carry [`SourceLoc::UNKNOWN`].
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct SourceLoc {
    /// The description file name, if known.
    pub file: Option<String>,
    /// 1-based line number, or 0 when unknown.
    pub line: u32,
}

impl SourceLoc {
    /// A location with neither file nor line.
    pub const UNKNOWN: SourceLoc = SourceLoc {
        file: None,
        line: 0,
    };

    /// Creates a location in the given file at the given line.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: Some(file.into()),
            line,
        }
    }

    /// Creates a location with a line number but no file.
    pub fn at_line(line: u32) -> Self {
        Self { file: None, line }
    }

    /// Returns `true` if neither the file nor the line is known.
    pub fn is_unknown(&self) -> bool {
        self.file.is_none() && self.line == 0
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_deref().unwrap_or("<architecture>");
        if self.line == 0 {
            write!(f, "{file}")
        } else {
            write!(f, "{file}:{}", self.line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_file_and_line() {
        let loc = SourceLoc::new("k6_frac_N10.xml", 42);
        assert_eq!(format!("{loc}"), "k6_frac_N10.xml:42");
    }

    #[test]
    fn display_without_file() {
        assert_eq!(format!("{}", SourceLoc::at_line(7)), "<architecture>:7");
        assert_eq!(format!("{}", SourceLoc::UNKNOWN), "<architecture>");
    }

    #[test]
    fn unknown_detection() {
        assert!(SourceLoc::UNKNOWN.is_unknown());
        assert!(SourceLoc::default().is_unknown());
        assert!(!SourceLoc::at_line(1).is_unknown());
    }

    #[test]
    fn serde_roundtrip() {
        let loc = SourceLoc::new("arch.xml", 3);
        let json = serde_json::to_string(&loc).unwrap();
        let back: SourceLoc = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, back);
    }
}
