//! Pin-to-pin annotations attached to leaf pb_types and interconnects.

use crate::port_spec::InstPort;
use archfpga_common::{ArchError, ArchResult, SourceLoc};
use archfpga_tree::ArchNode;
use serde::{Deserialize, Serialize};

/// Which corner a delay matrix describes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DelayBound {
    /// Worst-case delays.
    Max,
    /// Best-case delays.
    Min,
}

/// The payload of one annotation. Values are kept as written; converting
/// them to numbers belongs to the timing consumers.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// `<delay_constant max min>`.
    DelayConstant {
        /// Maximum delay.
        max: Option<String>,
        /// Minimum delay.
        min: Option<String>,
    },
    /// `<delay_matrix type>` with the matrix as text.
    DelayMatrix {
        /// Corner of the matrix.
        bound: DelayBound,
        /// Whitespace-separated matrix values.
        values: String,
    },
    /// `<C_constant C>`.
    CapConstant {
        /// Capacitance.
        c: String,
    },
    /// `<C_matrix>` with the matrix as text.
    CapMatrix {
        /// Whitespace-separated matrix values.
        values: String,
    },
    /// `<T_setup value>`.
    Setup {
        /// Setup time.
        value: String,
    },
    /// `<T_hold value>`.
    Hold {
        /// Hold time.
        value: String,
    },
    /// `<T_clock_to_Q max min>`, at least one present.
    ClockToQ {
        /// Maximum clock-to-output delay.
        max: Option<String>,
        /// Minimum clock-to-output delay.
        min: Option<String>,
    },
    /// `<pack_pattern name>`.
    PackPattern {
        /// Pattern name.
        name: String,
    },
}

/// One annotation with the port strings it applies to.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Annotation {
    /// What is annotated.
    pub kind: AnnotationKind,
    /// Input (or, for sequential annotations, the timed) port references.
    pub input_pins: Option<String>,
    /// Output port references.
    pub output_pins: Option<String>,
    /// Clock port name for sequential annotations.
    pub clock: Option<String>,
    /// Where the annotation was declared.
    pub loc: SourceLoc,
}

impl Annotation {
    /// Element names accepted on leaf pb_types, in processing order.
    pub const LEAF_ELEMENTS: [&'static str; 7] = [
        "delay_constant",
        "delay_matrix",
        "C_constant",
        "C_matrix",
        "T_setup",
        "T_clock_to_Q",
        "T_hold",
    ];

    /// Element names accepted on interconnects, in processing order.
    pub const INTERCONNECT_ELEMENTS: [&'static str; 5] = [
        "delay_constant",
        "delay_matrix",
        "C_constant",
        "C_matrix",
        "pack_pattern",
    ];

    /// Parses an annotation element.
    ///
    /// Sequential annotations must name one of `clock_ports`, the clock
    /// ports of the pb_type `owner`.
    pub fn parse(node: &ArchNode, owner: &str, clock_ports: &[&str]) -> ArchResult<Self> {
        let owned = |v: Option<&str>| v.map(str::to_string);
        let mut annotation = Self {
            kind: AnnotationKind::PackPattern {
                name: String::new(),
            },
            input_pins: None,
            output_pins: None,
            clock: None,
            loc: node.loc.clone(),
        };
        match node.name.as_str() {
            "delay_constant" => {
                node.expect_only_attributes(&["max", "min", "in_port", "out_port"])?;
                annotation.kind = AnnotationKind::DelayConstant {
                    max: owned(node.attribute("max")),
                    min: owned(node.attribute("min")),
                };
                annotation.set_pin_pair(node)?;
            }
            "delay_matrix" => {
                node.expect_only_attributes(&["type", "in_port", "out_port"])?;
                let bound = match node.required_attr("type")? {
                    "max" => DelayBound::Max,
                    "min" => DelayBound::Min,
                    other => {
                        return Err(ArchError::malformed(
                            format!("Invalid delay_matrix type '{other}'. Must be 'max' or 'min'."),
                            &node.loc,
                        ))
                    }
                };
                annotation.kind = AnnotationKind::DelayMatrix {
                    bound,
                    values: node.text_or_empty().to_string(),
                };
                annotation.set_pin_pair(node)?;
            }
            "C_constant" => {
                node.expect_only_attributes(&["C", "in_port", "out_port"])?;
                annotation.kind = AnnotationKind::CapConstant {
                    c: node.required_attr("C")?.to_string(),
                };
                annotation.set_optional_pins(node)?;
            }
            "C_matrix" => {
                node.expect_only_attributes(&["in_port", "out_port"])?;
                annotation.kind = AnnotationKind::CapMatrix {
                    values: node.text_or_empty().to_string(),
                };
                annotation.set_optional_pins(node)?;
            }
            "T_setup" | "T_hold" => {
                node.expect_only_attributes(&["value", "port", "clock"])?;
                let value = node.required_attr("value")?.to_string();
                annotation.kind = if node.name == "T_setup" {
                    AnnotationKind::Setup { value }
                } else {
                    AnnotationKind::Hold { value }
                };
                annotation.set_clocked(node, owner, clock_ports)?;
            }
            "T_clock_to_Q" => {
                node.expect_only_attributes(&["max", "min", "port", "clock"])?;
                let (max, min) = (owned(node.attribute("max")), owned(node.attribute("min")));
                if max.is_none() && min.is_none() {
                    return Err(ArchError::malformed(
                        format!(
                            "Failed to find either 'max' or 'min' attribute required for <{}> in <{owner}>",
                            node.name
                        ),
                        &node.loc,
                    ));
                }
                annotation.kind = AnnotationKind::ClockToQ { max, min };
                annotation.set_clocked(node, owner, clock_ports)?;
            }
            "pack_pattern" => {
                node.expect_only_attributes(&["name", "in_port", "out_port"])?;
                annotation.kind = AnnotationKind::PackPattern {
                    name: node.required_attr("name")?.to_string(),
                };
                annotation.set_pin_pair(node)?;
            }
            other => {
                return Err(ArchError::malformed(
                    format!("Unknown annotation <{other}> in '{owner}'"),
                    &node.loc,
                ))
            }
        }
        Ok(annotation)
    }

    fn set_pin_pair(&mut self, node: &ArchNode) -> ArchResult<()> {
        self.input_pins = Some(node.required_attr("in_port")?.to_string());
        self.output_pins = Some(node.required_attr("out_port")?.to_string());
        Ok(())
    }

    fn set_optional_pins(&mut self, node: &ArchNode) -> ArchResult<()> {
        self.input_pins = node.attribute("in_port").map(str::to_string);
        self.output_pins = node.attribute("out_port").map(str::to_string);
        if self.input_pins.is_none() && self.output_pins.is_none() {
            return Err(ArchError::malformed(
                format!("<{}> requires at least one of 'in_port' or 'out_port'", node.name),
                &node.loc,
            ));
        }
        Ok(())
    }

    fn set_clocked(
        &mut self,
        node: &ArchNode,
        owner: &str,
        clock_ports: &[&str],
    ) -> ArchResult<()> {
        self.input_pins = Some(node.required_attr("port")?.to_string());
        let clock = node.required_attr("clock")?;
        if !clock_ports.contains(&clock) {
            return Err(ArchError::unknown(
                format!("Clock '{clock}' does not match any clock defined in pb_type '{owner}'."),
                &node.loc,
            ));
        }
        self.clock = Some(clock.to_string());
        Ok(())
    }

    /// `T_setup`, `T_hold` or `T_clock_to_Q`.
    pub fn is_sequential(&self) -> bool {
        matches!(
            self.kind,
            AnnotationKind::Setup { .. }
                | AnnotationKind::Hold { .. }
                | AnnotationKind::ClockToQ { .. }
        )
    }

    /// `T_setup` or `T_hold`.
    pub fn is_setup_or_hold(&self) -> bool {
        matches!(self.kind, AnnotationKind::Setup { .. } | AnnotationKind::Hold { .. })
    }

    /// `T_clock_to_Q`.
    pub fn is_clock_to_q(&self) -> bool {
        matches!(self.kind, AnnotationKind::ClockToQ { .. })
    }

    /// `delay_constant` or `delay_matrix`.
    pub fn is_combinational_delay(&self) -> bool {
        matches!(
            self.kind,
            AnnotationKind::DelayConstant { .. } | AnnotationKind::DelayMatrix { .. }
        )
    }

    /// Port names referenced by `input_pins`.
    pub fn input_ports(&self) -> ArchResult<Vec<String>> {
        port_names(self.input_pins.as_deref(), &self.loc)
    }

    /// Port names referenced by `output_pins`.
    pub fn output_ports(&self) -> ArchResult<Vec<String>> {
        port_names(self.output_pins.as_deref(), &self.loc)
    }

    /// Returns a copy whose port references name `instance` instead of the
    /// pb_type they were written against.
    pub fn rewritten_for(&self, instance: &str) -> Self {
        let rewrite = |pins: &Option<String>| {
            pins.as_ref().map(|list| {
                list.split_whitespace()
                    .map(|token| match token.find('.') {
                        Some(dot) => format!("{instance}{}", &token[dot..]),
                        None => token.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
        };
        Self {
            input_pins: rewrite(&self.input_pins),
            output_pins: rewrite(&self.output_pins),
            ..self.clone()
        }
    }
}

fn port_names(pins: Option<&str>, loc: &SourceLoc) -> ArchResult<Vec<String>> {
    match pins {
        None => Ok(Vec::new()),
        Some(list) => Ok(InstPort::parse_list(list, loc)?
            .into_iter()
            .map(|p| p.port)
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_constant_requires_both_ports() {
        let node = ArchNode::new("delay_constant")
            .attr("max", "1e-10")
            .attr("in_port", "lut.in")
            .attr("out_port", "lut.out");
        let a = Annotation::parse(&node, "lut", &[]).unwrap();
        assert!(a.is_combinational_delay());
        assert_eq!(a.input_ports().unwrap(), vec!["in"]);
        let missing = ArchNode::new("delay_constant").attr("in_port", "lut.in");
        assert!(Annotation::parse(&missing, "lut", &[]).is_err());
    }

    #[test]
    fn delay_matrix_type() {
        let node = ArchNode::new("delay_matrix")
            .attr("type", "min")
            .attr("in_port", "a.in")
            .attr("out_port", "a.out")
            .text(" 1 2 3 ");
        let a = Annotation::parse(&node, "a", &[]).unwrap();
        assert_eq!(
            a.kind,
            AnnotationKind::DelayMatrix {
                bound: DelayBound::Min,
                values: "1 2 3".into()
            }
        );
        let bad = ArchNode::new("delay_matrix")
            .attr("type", "typ")
            .attr("in_port", "a.in")
            .attr("out_port", "a.out");
        assert!(Annotation::parse(&bad, "a", &[]).is_err());
    }

    #[test]
    fn capacitance_needs_a_port() {
        let node = ArchNode::new("C_constant").attr("C", "1e-15");
        assert!(Annotation::parse(&node, "a", &[]).is_err());
        let ok = ArchNode::new("C_matrix").attr("out_port", "a.out").text("1");
        assert!(Annotation::parse(&ok, "a", &[]).is_ok());
    }

    #[test]
    fn sequential_clock_must_exist() {
        let node = ArchNode::new("T_setup")
            .attr("value", "66e-12")
            .attr("port", "ff.D")
            .attr("clock", "clk");
        let a = Annotation::parse(&node, "ff", &["clk"]).unwrap();
        assert!(a.is_sequential() && a.is_setup_or_hold());
        assert_eq!(a.clock.as_deref(), Some("clk"));
        let err = Annotation::parse(&node, "ff", &["C"]).unwrap_err();
        assert!(err.message().contains("Clock 'clk' does not match"));
    }

    #[test]
    fn clock_to_q_requires_bound() {
        let node = ArchNode::new("T_clock_to_Q")
            .attr("port", "ff.Q")
            .attr("clock", "clk");
        let err = Annotation::parse(&node, "ff", &["clk"]).unwrap_err();
        assert!(err.message().contains("'max' or 'min'"));
        let ok = node.clone().attr("max", "1e-10");
        assert!(Annotation::parse(&ok, "ff", &["clk"]).unwrap().is_clock_to_q());
    }

    #[test]
    fn unknown_element_rejected() {
        let node = ArchNode::new("T_magic");
        assert!(Annotation::parse(&node, "ff", &[]).is_err());
    }

    #[test]
    fn rewrite_replaces_instance_per_token() {
        let node = ArchNode::new("delay_matrix")
            .attr("type", "max")
            .attr("in_port", "lut5.in[2:0] lut5.in[4]")
            .attr("out_port", "lut5.out");
        let a = Annotation::parse(&node, "lut5", &[]).unwrap();
        let r = a.rewritten_for("lut");
        assert_eq!(r.input_pins.as_deref(), Some("lut.in[2:0] lut.in[4]"));
        assert_eq!(r.output_pins.as_deref(), Some("lut.out"));
        assert_eq!(r.kind, a.kind);
    }
}
