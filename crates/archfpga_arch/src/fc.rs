//! Connection-block flexibility (Fc) per tile port and segment.
//!
//! A sub-tile either carries its own `<fc>` or falls back to the device's
//! `<default_fc>`. The result is one [`FcSpec`] per segment, capacity
//! instance and port, in that nesting order.

use crate::codes;
use crate::report::Reporter;
use crate::routing::Segment;
use crate::tile::SubTile;
use crate::types::PortDirection;
use archfpga_common::{ArchError, ArchResult, SourceLoc};
use archfpga_tree::ArchNode;
use serde::{Deserialize, Serialize};

/// How an Fc value is interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum FcValueType {
    /// A fraction of the channel width.
    Fractional,
    /// An absolute track count.
    Absolute,
}

impl FcValueType {
    fn parse(value: &str, loc: &SourceLoc) -> ArchResult<Self> {
        match value {
            "frac" => Ok(FcValueType::Fractional),
            "abs" => Ok(FcValueType::Absolute),
            _ => Err(ArchError::malformed(
                format!("Invalid fc_type '{value}'. Must be 'abs' or 'frac'."),
                loc,
            )),
        }
    }
}

/// Default Fc for inputs and outputs.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct FcValues {
    /// Input value type.
    pub in_type: FcValueType,
    /// Input value.
    pub in_value: f64,
    /// Output value type.
    pub out_type: FcValueType,
    /// Output value.
    pub out_value: f64,
}

impl FcValues {
    fn for_direction(&self, direction: PortDirection) -> (FcValueType, f64) {
        match direction {
            PortDirection::Input => (self.in_type, self.in_value),
            PortDirection::Output => (self.out_type, self.out_value),
        }
    }
}

/// Reads the `in_type`/`in_val`/`out_type`/`out_val` attributes of an
/// `<fc>` or `<default_fc>` node.
pub fn process_fc_values(node: &ArchNode) -> ArchResult<FcValues> {
    node.expect_only_attributes(&["in_type", "in_val", "out_type", "out_val"])?;
    Ok(FcValues {
        in_type: FcValueType::parse(node.required_attr("in_type")?, &node.loc)?,
        in_value: node.required_parse("in_val")?,
        out_type: FcValueType::parse(node.required_attr("out_type")?, &node.loc)?,
        out_value: node.required_parse("out_val")?,
    })
}

/// An `<fc_override>`. At least one of the names is set.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FcOverride {
    /// Tile port the override applies to.
    pub port_name: Option<String>,
    /// Segment the override applies to.
    pub segment_name: Option<String>,
    /// Value type.
    pub value_type: FcValueType,
    /// Value.
    pub value: f64,
    /// Where the override was declared.
    pub loc: SourceLoc,
}

impl FcOverride {
    fn matches(&self, port: &str, segment: &str) -> bool {
        match (&self.port_name, &self.segment_name) {
            (Some(p), Some(s)) => p == port && s == segment,
            (Some(p), None) => p == port,
            (None, Some(s)) => s == segment,
            (None, None) => false,
        }
    }
}

/// Reads one `<fc_override>`.
pub fn process_fc_override(node: &ArchNode) -> ArchResult<FcOverride> {
    if node.name != "fc_override" {
        return Err(ArchError::malformed(
            format!(
                "Unexpeted node of type '{}' (expected optional 'fc_override')",
                node.name
            ),
            &node.loc,
        ));
    }
    node.expect_no_children()?;
    for (key, _) in &node.attributes {
        if !["port_name", "segment_name", "fc_type", "fc_val"].contains(&key.as_str()) {
            return Err(ArchError::malformed(
                format!("Unexpected attribute '{key}'"),
                &node.loc,
            ));
        }
    }
    let value_type = match node.attribute("fc_type") {
        Some(value) => FcValueType::parse(value, &node.loc)?,
        None => {
            return Err(ArchError::malformed(
                "Missing expected attribute 'fc_type'",
                &node.loc,
            ))
        }
    };
    let value = node.parse_attr::<f64>("fc_val")?.ok_or_else(|| {
        ArchError::malformed("Missing expected attribute 'fc_value'", &node.loc)
    })?;
    let port_name = node.attribute("port_name").map(str::to_string);
    let segment_name = node.attribute("segment_name").map(str::to_string);
    if port_name.is_none() && segment_name.is_none() {
        return Err(ArchError::malformed(
            "Missing expected attribute(s) 'port_name' and/or 'segment_name'",
            &node.loc,
        ));
    }
    Ok(FcOverride {
        port_name,
        segment_name,
        value_type,
        value,
        loc: node.loc.clone(),
    })
}

/// The Fc of one port instance towards one segment type.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FcSpec {
    /// Segment index.
    pub segment: usize,
    /// Whether the pins receive from or drive the channel.
    pub direction: PortDirection,
    /// Value type.
    pub value_type: FcValueType,
    /// Value.
    pub value: f64,
    /// Tile pins covered.
    pub pins: Vec<u32>,
}

/// Builds the Fc specs of one sub-tile.
///
/// `node` is the sub-tile's `<fc>`, if any; `default_fc` the device default.
pub fn process_fc(
    node: Option<&ArchNode>,
    sub_tile: &SubTile,
    segments: &[Segment],
    default_fc: Option<&FcValues>,
    reporter: &Reporter,
) -> ArchResult<Vec<FcSpec>> {
    let (values, overrides) = match node {
        Some(fc) => {
            let values = process_fc_values(fc)?;
            let overrides = fc
                .children
                .iter()
                .map(process_fc_override)
                .collect::<ArchResult<Vec<_>>>()?;
            (values, overrides)
        }
        None => match default_fc {
            Some(values) => (*values, Vec::new()),
            None => {
                return Err(ArchError::malformed(
                    "<sub_tile> is missing child <fc>, and no <default_fc> specified in architecture",
                    &sub_tile.loc,
                ))
            }
        },
    };

    let per_instance = sub_tile.pins_per_instance();
    let mut specs = Vec::new();
    for (iseg, segment) in segments.iter().enumerate() {
        for instance in 0..sub_tile.capacity.total() {
            for port in &sub_tile.ports {
                let (mut value_type, mut value) = values.for_direction(port.direction);
                let mut matched = 0;
                for fc_override in &overrides {
                    if fc_override.matches(&port.name, &segment.name) {
                        value_type = fc_override.value_type;
                        value = fc_override.value;
                        matched += 1;
                    }
                }
                if matched > 1 && instance == 0 {
                    let loc = node.map_or(&sub_tile.loc, |fc| &fc.loc);
                    reporter.emit(codes::multiple_fc_overrides(
                        &port.name,
                        &segment.name,
                        matched,
                        loc,
                    ))?;
                }
                let first = instance * per_instance + port.absolute_first_pin_index;
                let pins = (first..first + port.num_pins)
                    .map(|pin| sub_tile.sub_tile_to_tile_pin_indices[pin as usize])
                    .collect();
                specs.push(FcSpec {
                    segment: iseg,
                    direction: port.direction,
                    value_type,
                    value,
                    pins,
                });
            }
        }
    }
    Ok(specs)
}
