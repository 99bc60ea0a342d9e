//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// General warnings, prefixed with `W`.
    Warning,
    /// Timing-annotation findings, prefixed with `T`.
    Timing,
    /// Informational notes, prefixed with `I`.
    Info,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Timing => 'T',
            Category::Info => 'I',
        }
    }

    /// Maps a prefix character back to its category.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'E' => Some(Category::Error),
            'W' => Some(Category::Warning),
            'T' => Some(Category::Timing),
            'I' => Some(Category::Info),
            _ => None,
        }
    }
}

/// A structured diagnostic code combining a category prefix and a number.
///
/// Displayed as the prefix followed by a zero-padded 3-digit number, e.g.
/// `T300` or `W302`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// Error returned when a string is not a valid diagnostic code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseCodeError(pub String);

impl fmt::Display for ParseCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid diagnostic code '{}'", self.0)
    }
}

impl std::error::Error for ParseCodeError {}

impl FromStr for DiagnosticCode {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let category = chars
            .next()
            .and_then(Category::from_prefix)
            .ok_or_else(|| ParseCodeError(s.to_string()))?;
        let digits = chars.as_str();
        if digits.len() != 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseCodeError(s.to_string()));
        }
        let number = digits
            .parse::<u16>()
            .map_err(|_| ParseCodeError(s.to_string()))?;
        Ok(DiagnosticCode::new(category, number))
    }
}
