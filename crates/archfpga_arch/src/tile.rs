//! Physical tile types, sub-tiles and logical block types.

use crate::fc::FcSpec;
use crate::ids::{LogicalBlockId, PbTypeId, PhysicalTileId};
use crate::pin_map::PinDirectMap;
use crate::switchblock::SwitchblockLocations;
use crate::types::{PinClassType, PortDirection, PortEquivalence};
use archfpga_common::SourceLoc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// A port of a sub-tile.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TilePort {
    /// Port name, unique within the sub-tile.
    pub name: String,
    /// Input or output; clock ports are inputs.
    pub direction: PortDirection,
    /// Declared as `<clock>`.
    pub is_clock: bool,
    /// Declared `is_non_clock_global`.
    pub is_non_clock_global: bool,
    /// Number of pins.
    pub num_pins: u32,
    /// Pin interchangeability.
    pub equivalence: PortEquivalence,
    /// First pin of this port within one sub-tile instance.
    pub absolute_first_pin_index: u32,
    /// Position among the sub-tile's ports.
    pub index: usize,
    /// Position among ports of the same kind.
    pub port_index_by_type: usize,
    /// Where the port was declared.
    pub loc: SourceLoc,
}

impl TilePort {
    /// Whether the port's pins bypass general routing.
    pub fn is_global(&self) -> bool {
        self.is_clock || self.is_non_clock_global
    }

    /// Instance-relative pins of this port.
    pub fn pin_range(&self) -> Range<u32> {
        self.absolute_first_pin_index..self.absolute_first_pin_index + self.num_pins
    }
}

/// The inclusive range of capacity slots a sub-tile occupies in its tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CapacityRange {
    /// First slot.
    pub low: u32,
    /// Last slot.
    pub high: u32,
}

impl CapacityRange {
    /// Number of instances.
    pub fn total(self) -> u32 {
        self.high - self.low + 1
    }

    /// Whether `slot` belongs to this sub-tile.
    pub fn contains(self, slot: u32) -> bool {
        (self.low..=self.high).contains(&slot)
    }
}

/// A slot type within a tile.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SubTile {
    /// Name, unique within the tile.
    pub name: String,
    /// Position within the tile.
    pub index: usize,
    /// Capacity slots taken by this sub-tile.
    pub capacity: CapacityRange,
    /// Ports of one instance: inputs, then outputs, then clocks.
    pub ports: Vec<TilePort>,
    /// Logical blocks placeable here, closest pin count first.
    pub equivalent_sites: Vec<LogicalBlockId>,
    /// Tile pin index of each sub-tile pin, over all instances.
    pub sub_tile_to_tile_pin_indices: Vec<u32>,
    /// Pin classes produced for this sub-tile.
    pub class_range: Range<usize>,
    /// Pins over all instances.
    pub num_phy_pins: u32,
    /// Where the sub-tile was declared.
    pub loc: SourceLoc,
}

impl SubTile {
    /// Pins of one instance.
    pub fn pins_per_instance(&self) -> u32 {
        self.ports.iter().map(|p| p.num_pins).sum()
    }

    /// Finds a port by name.
    pub fn find_port(&self, name: &str) -> Option<&TilePort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// The port owning instance-relative pin `pin`.
    pub fn port_of_pin(&self, pin: u32) -> Option<&TilePort> {
        self.ports.iter().find(|p| p.pin_range().contains(&pin))
    }

    /// Tile pin for instance-relative `pin` of instance `instance`.
    pub fn tile_pin(&self, instance: u32, pin: u32) -> u32 {
        let slot = (instance * self.pins_per_instance() + pin) as usize;
        self.sub_tile_to_tile_pin_indices[slot]
    }
}

/// A group of interchangeable pins.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PinClass {
    /// Driver or receiver.
    pub class_type: PinClassType,
    /// Equivalence of the port the class came from.
    pub equivalence: PortEquivalence,
    /// Tile pins in the class, ascending.
    pub pins: Vec<u32>,
}

/// A placeable tile type.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PhysicalTileType {
    /// This tile's ID. ID 0 is the empty tile.
    pub id: PhysicalTileId,
    /// Unique name.
    pub name: String,
    /// Footprint width in grid units.
    pub width: u32,
    /// Footprint height in grid units.
    pub height: u32,
    /// Declared area, if any.
    pub area: Option<f64>,
    /// Total capacity over all sub-tiles.
    pub capacity: u32,
    /// Sub-tiles in declaration order.
    pub sub_tiles: Vec<SubTile>,
    /// Blocks accepted by any sub-tile, tightest fit first once linked.
    pub equivalent_sites: Vec<LogicalBlockId>,
    /// Pins over all sub-tiles and instances.
    pub num_pins: u32,
    /// Input pins (clocks excluded).
    pub num_input_pins: u32,
    /// Output pins.
    pub num_output_pins: u32,
    /// Clock pins.
    pub num_clock_pins: u32,
    /// Pins of one instance of every sub-tile.
    pub num_inst_pins: u32,
    /// Non-clock input pins.
    pub num_receivers: u32,
    /// Output pins.
    pub num_drivers: u32,
    /// Pin classes.
    pub class_inf: Vec<PinClass>,
    /// Class of every tile pin.
    pub pin_class: Vec<usize>,
    /// Pins excluded from general routing.
    pub is_ignored_pin: Vec<bool>,
    /// Pins carrying device-wide signals.
    pub is_pin_global: Vec<bool>,
    /// Pins of clock ports.
    pub clock_pin_indices: Vec<u32>,
    /// Connection-block flexibility per segment, instance and port.
    pub fc_specs: Vec<FcSpec>,
    /// Switchblock pattern over the footprint; absent on the empty tile.
    pub switchblock_locations: Option<SwitchblockLocations>,
    /// Pin maps keyed by logical block, then sub-tile index.
    pub tile_block_pin_directs_map: BTreeMap<LogicalBlockId, BTreeMap<usize, PinDirectMap>>,
    /// Holds an input pad.
    pub is_input_type: bool,
    /// Holds an output pad.
    pub is_output_type: bool,
    /// Where the tile was declared.
    pub loc: SourceLoc,
}

impl PhysicalTileType {
    /// Name of the empty tile.
    pub const EMPTY_NAME: &'static str = "EMPTY";

    /// The zero-pin tile registered at ID 0.
    pub fn empty() -> Self {
        Self::new(PhysicalTileId::from_raw(0), Self::EMPTY_NAME, SourceLoc::UNKNOWN)
    }

    /// Creates a 1×1 tile with no sub-tiles.
    pub fn new(id: PhysicalTileId, name: &str, loc: SourceLoc) -> Self {
        Self {
            id,
            name: name.to_string(),
            width: 1,
            height: 1,
            area: None,
            capacity: 0,
            sub_tiles: Vec::new(),
            equivalent_sites: Vec::new(),
            num_pins: 0,
            num_input_pins: 0,
            num_output_pins: 0,
            num_clock_pins: 0,
            num_inst_pins: 0,
            num_receivers: 0,
            num_drivers: 0,
            class_inf: Vec::new(),
            pin_class: Vec::new(),
            is_ignored_pin: Vec::new(),
            is_pin_global: Vec::new(),
            clock_pin_indices: Vec::new(),
            fc_specs: Vec::new(),
            switchblock_locations: None,
            tile_block_pin_directs_map: BTreeMap::new(),
            is_input_type: false,
            is_output_type: false,
            loc,
        }
    }

    /// Whether this is the empty tile.
    pub fn is_empty(&self) -> bool {
        self.id.index() == 0
    }

    /// Number of pin classes.
    pub fn num_class(&self) -> usize {
        self.class_inf.len()
    }

    /// Union of the sub-tiles' equivalent sites, in first-seen order.
    pub fn site_union(&self) -> Vec<LogicalBlockId> {
        let mut sites = Vec::new();
        for site in self.sub_tiles.iter().flat_map(|s| &s.equivalent_sites) {
            if !sites.contains(site) {
                sites.push(*site);
            }
        }
        sites
    }

    /// Whether some sub-tile accepts `block`.
    pub fn is_equivalent_site(&self, block: LogicalBlockId) -> bool {
        self.sub_tiles.iter().any(|s| s.equivalent_sites.contains(&block))
    }

    /// Finds a sub-tile by name.
    pub fn find_sub_tile(&self, name: &str) -> Option<&SubTile> {
        self.sub_tiles.iter().find(|s| s.name == name)
    }

    /// The pin map for `block` in sub-tile `sub_tile`.
    pub fn pin_map(&self, block: LogicalBlockId, sub_tile: usize) -> Option<&PinDirectMap> {
        self.tile_block_pin_directs_map.get(&block)?.get(&sub_tile)
    }
}

/// A pin of a pb_type port.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PbPinRef {
    /// The pb_type owning the port.
    pub pb_type: PbTypeId,
    /// Port index on that pb_type.
    pub port: usize,
    /// Pin within the port.
    pub pin: u32,
}

/// A placement target rooted at a pb_type.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LogicalBlockType {
    /// This block's ID. ID 0 is the empty block.
    pub id: LogicalBlockId,
    /// Unique name, equal to the root pb_type's name.
    pub name: String,
    /// Root of the pb_type hierarchy; `None` for the empty block.
    pub pb_type: Option<PbTypeId>,
    /// Tiles this block can be placed in, closest pin count first.
    pub equivalent_tiles: Vec<PhysicalTileId>,
    /// Root port pin of each logical pin.
    pub pin_logical_num_to_pb_pin_mapping: Vec<PbPinRef>,
    /// Where the block was declared.
    pub loc: SourceLoc,
}

impl LogicalBlockType {
    /// Name of the empty block.
    pub const EMPTY_NAME: &'static str = "EMPTY";

    /// The zero-pin block registered at ID 0.
    pub fn empty() -> Self {
        Self {
            id: LogicalBlockId::from_raw(0),
            name: Self::EMPTY_NAME.to_string(),
            pb_type: None,
            equivalent_tiles: Vec::new(),
            pin_logical_num_to_pb_pin_mapping: Vec::new(),
            loc: SourceLoc::UNKNOWN,
        }
    }

    /// Whether this is the empty block.
    pub fn is_empty(&self) -> bool {
        self.pb_type.is_none()
    }

    /// Number of logical pins.
    pub fn num_pins(&self) -> u32 {
        self.pin_logical_num_to_pb_pin_mapping.len() as u32
    }
}
