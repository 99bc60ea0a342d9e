//! Small shared enums used across the model, pb_type and tile registries.

use archfpga_common::{ArchError, ArchResult, SourceLoc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a port.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input (clock ports are inputs too).
    Input,
    /// Output.
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// Whether the pins of a port are logically interchangeable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum PortEquivalence {
    /// Every pin is distinct.
    #[default]
    None,
    /// Any pin may be swapped with any other pin of the port.
    Full,
    /// Pins are interchangeable between instances only. Outputs only.
    Instance,
}

impl PortEquivalence {
    /// Parses an `equivalent` attribute value for a port of the given
    /// element kind (`input`, `output` or `clock`).
    pub fn parse(value: &str, element: &str, loc: &SourceLoc) -> ArchResult<Self> {
        match value {
            "none" => Ok(PortEquivalence::None),
            "full" => Ok(PortEquivalence::Full),
            "instance" if element == "output" => Ok(PortEquivalence::Instance),
            "instance" => Err(ArchError::malformed(
                format!("Invalid pin equivalence '{value}' for {element} port."),
                loc,
            )),
            _ => Err(ArchError::malformed(
                format!("Invalid pin equivalence '{value}'."),
                loc,
            )),
        }
    }
}

/// Whether a pin class drives or receives signals.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PinClassType {
    /// Output pins.
    Driver,
    /// Input and clock pins.
    Receiver,
}

impl PinClassType {
    /// The class type a port direction produces.
    pub fn for_direction(direction: PortDirection) -> Self {
        match direction {
            PortDirection::Input => PinClassType::Receiver,
            PortDirection::Output => PinClassType::Driver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_values() {
        let loc = SourceLoc::UNKNOWN;
        assert_eq!(
            PortEquivalence::parse("full", "input", &loc).unwrap(),
            PortEquivalence::Full
        );
        assert_eq!(
            PortEquivalence::parse("instance", "output", &loc).unwrap(),
            PortEquivalence::Instance
        );
        assert_eq!(PortEquivalence::default(), PortEquivalence::None);
    }

    #[test]
    fn instance_equivalence_rejected_on_inputs() {
        let err = PortEquivalence::parse("instance", "input", &SourceLoc::at_line(3)).unwrap_err();
        assert!(err.message().contains("for input port"));
        assert!(PortEquivalence::parse("partial", "output", &SourceLoc::UNKNOWN).is_err());
    }

    #[test]
    fn class_type_from_direction() {
        assert_eq!(
            PinClassType::for_direction(PortDirection::Output),
            PinClassType::Driver
        );
        assert_eq!(
            PinClassType::for_direction(PortDirection::Input),
            PinClassType::Receiver
        );
    }
}
