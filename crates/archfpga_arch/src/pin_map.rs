//! Logical block pin ↔ physical sub-tile pin bijections.
//!
//! Physical pins are relative to one instance of a sub-tile; the tile pin
//! of instance `i` is found through
//! [`SubTile::tile_pin`](crate::tile::SubTile::tile_pin).

use crate::ids::{LogicalPin, PhysicalPin};
use crate::pb_type::PbType;
use crate::port_spec::resolve_pin_range;
use crate::tile::SubTile;
use archfpga_common::{ArchError, ArchResult, SourceLoc};
use archfpga_tree::ArchNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A one-to-one map between logical and physical pins.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct PinDirectMap {
    to_physical: BTreeMap<LogicalPin, PhysicalPin>,
    to_logical: BTreeMap<PhysicalPin, LogicalPin>,
}

impl PinDirectMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps pin `i` to pin `i` for `0..num_pins`.
    pub fn identity(num_pins: u32) -> Self {
        let mut map = Self::new();
        for pin in 0..num_pins {
            map.insert(LogicalPin::from_raw(pin), PhysicalPin::from_raw(pin));
        }
        map
    }

    /// Adds a pair. Returns `false`, leaving the map unchanged, if either
    /// side is already mapped.
    pub fn insert(&mut self, logical: LogicalPin, physical: PhysicalPin) -> bool {
        if self.to_physical.contains_key(&logical) || self.to_logical.contains_key(&physical) {
            return false;
        }
        self.to_physical.insert(logical, physical);
        self.to_logical.insert(physical, logical);
        true
    }

    /// The physical pin of `logical`.
    pub fn physical(&self, logical: LogicalPin) -> Option<PhysicalPin> {
        self.to_physical.get(&logical).copied()
    }

    /// The logical pin of `physical`.
    pub fn logical(&self, physical: PhysicalPin) -> Option<LogicalPin> {
        self.to_logical.get(&physical).copied()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.to_physical.len()
    }

    /// Whether the map has no pairs.
    pub fn is_empty(&self) -> bool {
        self.to_physical.is_empty()
    }

    /// Pairs in logical pin order.
    pub fn iter(&self) -> impl Iterator<Item = (LogicalPin, PhysicalPin)> + '_ {
        self.to_physical.iter().map(|(l, p)| (*l, *p))
    }
}

/// Builds the implicit identity map of a `pin_mapping="direct"` site.
pub fn direct_pin_map(
    site: &ArchNode,
    sub_tile: &SubTile,
    root: &PbType,
) -> ArchResult<PinDirectMap> {
    let num_pins = sub_tile.pins_per_instance();
    if num_pins != root.num_pins() {
        return Err(ArchError::shape(
            format!(
                "Pin definition differ between site {} and tile {}. User-defined pin mapping is required.",
                root.name, sub_tile.name
            ),
            &site.loc,
        ));
    }
    Ok(PinDirectMap::identity(num_pins))
}

/// Builds the map of a `pin_mapping="custom"` site from its `<direct>`s.
///
/// `from` names sub-tile pins and `to` names pins of the block's root
/// pb_type. Each pin may be mapped once on either side.
pub fn custom_pin_map(
    site: &ArchNode,
    sub_tile: &SubTile,
    root: &PbType,
) -> ArchResult<PinDirectMap> {
    site.expect_only_children(&["direct"])?;
    if site.children.is_empty() {
        return Err(ArchError::malformed(
            format!(
                "There are no direct pin mappings between site {} and tile {}.",
                root.name, sub_tile.name
            ),
            &site.loc,
        ));
    }

    let mut map = PinDirectMap::new();
    for direct in &site.children {
        direct.expect_only_attributes(&["from", "to"])?;
        let from = resolve_pin_range(
            direct.required_attr("from")?,
            &sub_tile.name,
            |port| {
                sub_tile
                    .find_port(port)
                    .map(|p| (p.absolute_first_pin_index, p.num_pins))
            },
            &direct.loc,
        )?;
        let to = resolve_pin_range(
            direct.required_attr("to")?,
            &root.name,
            |port| root.find_port(port).map(|p| (p.absolute_first_pin_index, p.num_pins)),
            &direct.loc,
        )?;
        if from.len() != to.len() {
            return Err(ArchError::shape(
                format!(
                    "The number of pins specified in the direct pin mapping is not equivalent for Physical Tile {} and Logical Block {}.",
                    sub_tile.name, root.name
                ),
                &direct.loc,
            ));
        }
        for (physical, logical) in from.zip(to) {
            if !map.insert(LogicalPin::from_raw(logical), PhysicalPin::from_raw(physical)) {
                return Err(duplicate_pin_mapping(logical, physical, sub_tile, root, &direct.loc));
            }
        }
    }
    Ok(map)
}

fn duplicate_pin_mapping(
    logical: u32,
    physical: u32,
    sub_tile: &SubTile,
    root: &PbType,
    loc: &SourceLoc,
) -> ArchError {
    ArchError::inconsistent(
        format!(
            "Duplicate logical pin ({logical}) to physical pin ({physical}) mappings found for Physical Tile {} and Logical Block {}.",
            sub_tile.name, root.name
        ),
        loc,
    )
}

/// Checks a finished map against the block and sub-tile it connects.
///
/// The block must fit in one sub-tile instance, every block pin must be
/// mapped, and both ends of each pair must have the same direction.
pub fn check_port_direct_mappings(
    tile_name: &str,
    sub_tile: &SubTile,
    root: &PbType,
    map: &PinDirectMap,
    loc: &SourceLoc,
) -> ArchResult<()> {
    if root.num_pins() > sub_tile.pins_per_instance() {
        return Err(ArchError::shape(
            format!(
                "Logical Block ({}) has more pins than the Sub Tile ({}).",
                root.name, sub_tile.name
            ),
            loc,
        ));
    }
    if map.len() != root.num_pins() as usize {
        return Err(ArchError::shape(
            format!(
                "Physical Tile {tile_name} has a different value for the ports defined in the pin mapping ({}) and the number of pins of the logical block ({}).",
                map.len(),
                root.num_pins()
            ),
            loc,
        ));
    }
    for (logical, physical) in map.iter() {
        let block_port = root.ports.iter().find(|p| p.pin_range().contains(&logical.as_raw()));
        let tile_port = sub_tile.port_of_pin(physical.as_raw());
        let (Some(block_port), Some(tile_port)) = (block_port, tile_port) else {
            return Err(ArchError::shape(
                format!(
                    "Pin mapping ({logical}, {physical}) of Physical Tile {tile_name} does not resolve to a port"
                ),
                loc,
            ));
        };
        if block_port.direction != tile_port.direction {
            return Err(ArchError::inconsistent(
                format!(
                    "Logical block ({}) port '{}' and Physical tile ({tile_name}) port '{}' have different directions.",
                    root.name, block_port.name, tile_port.name
                ),
                loc,
            ));
        }
    }
    Ok(())
}
