//! Switchblock placement within a tile's footprint.

use crate::routing::Switch;
use archfpga_common::{ArchError, ArchResult};
use archfpga_tree::ArchNode;
use serde::{Deserialize, Serialize};

/// Which connections a switchblock at one grid offset makes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SbType {
    /// No switchblock.
    None,
    /// Horizontal wires only.
    Horizontal,
    /// Vertical wires only.
    Vertical,
    /// Turns only.
    Turns,
    /// Straight-through only.
    Straight,
    /// Every connection.
    Full,
}

impl SbType {
    fn parse(value: &str, node: &ArchNode) -> ArchResult<Self> {
        match value {
            "none" => Ok(SbType::None),
            "horizontal" => Ok(SbType::Horizontal),
            "vertical" => Ok(SbType::Vertical),
            "turns" => Ok(SbType::Turns),
            "straight" => Ok(SbType::Straight),
            "full" => Ok(SbType::Full),
            _ => Err(ArchError::malformed(
                format!("Invalid <sb_loc> 'type' attribute '{value}'"),
                &node.loc,
            )),
        }
    }
}

/// Per-offset switchblock types and switch overrides, `width × height`.
///
/// A switch override of `None` means the default switch of the channel.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SwitchblockLocations {
    width: usize,
    height: usize,
    types: Vec<SbType>,
    switch_overrides: Vec<Option<usize>>,
}

impl SwitchblockLocations {
    fn filled(width: usize, height: usize, sb: SbType, switch: Option<usize>) -> Self {
        Self {
            width,
            height,
            types: vec![sb; width * height],
            switch_overrides: vec![switch; width * height],
        }
    }

    fn slot(&self, x: usize, y: usize) -> usize {
        x * self.height + y
    }

    fn set(&mut self, x: usize, y: usize, sb: SbType, switch: Option<usize>) {
        let slot = self.slot(x, y);
        self.types[slot] = sb;
        self.switch_overrides[slot] = switch;
    }

    /// Footprint width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Footprint height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Switchblock type at `(x, y)`.
    pub fn sb_type(&self, x: usize, y: usize) -> SbType {
        self.types[self.slot(x, y)]
    }

    /// Switch override at `(x, y)`, as an index into the switch list.
    pub fn switch_override(&self, x: usize, y: usize) -> Option<usize> {
        self.switch_overrides[self.slot(x, y)]
    }

    /// Reads `<switchblock_locations>` for a `width × height` tile. A missing
    /// node behaves like the default pattern.
    pub fn process(
        node: Option<&ArchNode>,
        width: usize,
        height: usize,
        switches: &[Switch],
    ) -> ArchResult<Self> {
        let Some(node) = node else {
            return Ok(Self::with_pattern(width, height, SbType::Straight, SbType::Full, None));
        };
        node.expect_only_attributes(&["pattern", "internal_switch"])?;
        let find_switch = |name: &str, what: &str| {
            switches.iter().position(|s| s.name == name).ok_or_else(|| {
                ArchError::unknown(
                    format!("Invalid {what} '{name}' (no matching switch named '{name}' found)"),
                    &node.loc,
                )
            })
        };

        let pattern = node.attr_or("pattern", "external_full_internal_straight");
        if pattern == "custom" {
            node.expect_only_attributes(&["pattern"])?;
            node.expect_only_children(&["sb_loc"])?;
            let mut locations = Self::filled(width, height, SbType::None, None);
            let mut assigned = vec![false; width * height];
            for sb_loc in &node.children {
                sb_loc.expect_only_attributes(&["type", "xoffset", "yoffset", "switch_override"])?;
                let sb = SbType::parse(sb_loc.attr_or("type", "full"), sb_loc)?;
                let switch = match sb_loc.attribute("switch_override") {
                    None => None,
                    Some(name) => Some(find_switch(name, "<sb_loc> 'switch_override' attribute")?),
                };
                let x: usize = sb_loc.parse_attr("xoffset")?.unwrap_or(0);
                let y: usize = sb_loc.parse_attr("yoffset")?.unwrap_or(0);
                if x >= width {
                    return Err(ArchError::shape(
                        format!(
                            "Invalid <sb_loc> 'xoffset' attribute '{x}' (must be in range [0,{}])",
                            width - 1
                        ),
                        &sb_loc.loc,
                    ));
                }
                if y >= height {
                    return Err(ArchError::shape(
                        format!(
                            "Invalid <sb_loc> 'yoffset' attribute '{y}' (must be in range [0,{}])",
                            height - 1
                        ),
                        &sb_loc.loc,
                    ));
                }
                let slot = locations.slot(x, y);
                if assigned[slot] {
                    return Err(ArchError::malformed(
                        format!("Duplicate <sb_loc> specifications at xoffset={x} yoffset={y}"),
                        &sb_loc.loc,
                    ));
                }
                assigned[slot] = true;
                locations.set(x, y, sb, switch);
            }
            return Ok(locations);
        }

        let internal_switch = match node.attribute("internal_switch") {
            None => None,
            Some(name) => Some(find_switch(
                name,
                "<switchblock_locations> 'internal_switch' attribute",
            )?),
        };
        let (internal, external) = match pattern {
            "all" => (SbType::Full, SbType::Full),
            "external" => (SbType::None, SbType::Full),
            "internal" => (SbType::Full, SbType::None),
            "external_full_internal_straight" => (SbType::Straight, SbType::Full),
            "none" => (SbType::None, SbType::None),
            _ => {
                return Err(ArchError::malformed(
                    format!("Invalid <switchblock_locations> 'pattern' attribute '{pattern}'"),
                    &node.loc,
                ))
            }
        };
        Ok(Self::with_pattern(width, height, internal, external, internal_switch))
    }

    fn with_pattern(
        width: usize,
        height: usize,
        internal: SbType,
        external: SbType,
        internal_switch: Option<usize>,
    ) -> Self {
        let mut locations = Self::filled(width, height, internal, internal_switch);
        for x in 0..width {
            locations.set(x, height - 1, external, None);
        }
        for y in 0..height {
            locations.set(width - 1, y, external, None);
        }
        locations
    }
}
