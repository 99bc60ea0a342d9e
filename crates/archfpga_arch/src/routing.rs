//! The switch and segment catalogs referenced by tiles.
//!
//! Only names and kinds are kept. Electrical parameters are read by the
//! routing-graph builder, which is not part of this crate.

use archfpga_common::{ArchError, ArchResult};
use archfpga_tree::ArchNode;
use serde::{Deserialize, Serialize};

/// Name reserved for the router's internal zero-delay switch.
pub const DELAYLESS_SWITCH_NAME: &str = "__vpr_delayless_switch__";

/// Kind of a routing switch.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SwitchKind {
    /// Buffered multiplexer.
    Mux,
    /// Tristate buffer.
    Tristate,
    /// Unbuffered pass transistor.
    PassGate,
    /// Electrical short.
    Short,
    /// Plain buffer.
    Buffer,
}

/// A routing switch.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Switch {
    /// Unique name.
    pub name: String,
    /// Kind.
    pub kind: SwitchKind,
}

/// Length of a wire segment in tiles.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SegmentLength {
    /// Spans this many tiles.
    Tiles(u32),
    /// Spans the whole device.
    Longline,
}

/// A wire segment type.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Segment {
    /// Name; generated when omitted.
    pub name: String,
    /// Length.
    pub length: SegmentLength,
}

/// Reads `<switchlist>`.
pub fn process_switches(list: &ArchNode) -> ArchResult<Vec<Switch>> {
    list.expect_only_children(&["switch"])?;
    let mut switches: Vec<Switch> = Vec::new();
    for node in &list.children {
        let name = node.required_attr("name")?;
        if name == DELAYLESS_SWITCH_NAME {
            return Err(ArchError::malformed(
                format!("Switch name '{name}' is a reserved name for internal usage"),
                &node.loc,
            ));
        }
        if switches.iter().any(|s| s.name == name) {
            return Err(ArchError::duplicate("switch", name, &node.loc));
        }
        let kind = match node.required_attr("type")? {
            "mux" => SwitchKind::Mux,
            "tristate" => SwitchKind::Tristate,
            "pass_gate" => SwitchKind::PassGate,
            "short" => SwitchKind::Short,
            "buffer" => SwitchKind::Buffer,
            other => {
                return Err(ArchError::malformed(
                    format!("Invalid switch type '{other}'."),
                    &node.loc,
                ))
            }
        };
        switches.push(Switch {
            name: name.to_string(),
            kind,
        });
    }
    Ok(switches)
}

/// Reads `<segmentlist>`.
pub fn process_segments(list: &ArchNode) -> ArchResult<Vec<Segment>> {
    list.expect_only_children(&["segment"])?;
    let mut segments: Vec<Segment> = Vec::new();
    for (i, node) in list.children.iter().enumerate() {
        let name = match node.attribute("name") {
            Some(name) => name.to_string(),
            None => format!("unnamed_segment_{i}"),
        };
        if segments.iter().any(|s| s.name == name) {
            return Err(ArchError::duplicate("segment", name, &node.loc));
        }
        let length = match node.attribute("length") {
            None => SegmentLength::Tiles(1),
            Some("longline") => SegmentLength::Longline,
            Some(_) => SegmentLength::Tiles(node.required_parse("length")?),
        };
        segments.push(Segment { name, length });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switch(name: &str, kind: &str) -> ArchNode {
        ArchNode::new("switch")
            .attr("type", kind)
            .attr("name", name)
            .attr("R", "551")
    }

    #[test]
    fn switches() {
        let list = ArchNode::new("switchlist")
            .child(switch("0", "mux"))
            .child(switch("ipin_cblock", "buffer"));
        let switches = process_switches(&list).unwrap();
        assert_eq!(switches[1].kind, SwitchKind::Buffer);

        let dup = ArchNode::new("switchlist")
            .child(switch("0", "mux"))
            .child(switch("0", "short"));
        assert!(matches!(process_switches(&dup), Err(ArchError::Duplicate { .. })));

        let reserved = ArchNode::new("switchlist").child(switch(DELAYLESS_SWITCH_NAME, "mux"));
        assert!(process_switches(&reserved).is_err());

        let bad = ArchNode::new("switchlist").child(switch("s", "antifuse"));
        assert_eq!(
            process_switches(&bad).unwrap_err().message(),
            "Invalid switch type 'antifuse'."
        );
    }

    #[test]
    fn segments() {
        let list = ArchNode::new("segmentlist")
            .child(ArchNode::new("segment").attr("name", "L4").attr("length", 4))
            .child(ArchNode::new("segment").attr("length", "longline"))
            .child(ArchNode::new("segment"));
        let segments = process_segments(&list).unwrap();
        assert_eq!(segments[0].length, SegmentLength::Tiles(4));
        assert_eq!(segments[1].name, "unnamed_segment_1");
        assert_eq!(segments[1].length, SegmentLength::Longline);
        assert_eq!(segments[2].length, SegmentLength::Tiles(1));

        let bad = ArchNode::new("segmentlist").child(ArchNode::new("segment").attr("length", "x"));
        assert!(process_segments(&bad).is_err());
    }
}
