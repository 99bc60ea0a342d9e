//! Reads `<complexblocklist>` and `<tiles>` into the block and tile registries.

use crate::fc::{process_fc, FcValues};
use crate::ids::{LogicalBlockId, PhysicalTileId};
use crate::model::ModelLibrary;
use crate::pb_builder::{positive_u32, PbTypeBuilder};
use crate::pb_type::PbTypeArena;
use crate::pin_class::setup_pin_classes;
use crate::pin_map::{check_port_direct_mappings, custom_pin_map, direct_pin_map};
use crate::report::Reporter;
use crate::routing::{Segment, Switch};
use crate::switchblock::SwitchblockLocations;
use crate::tile::{CapacityRange, LogicalBlockType, PbPinRef, PhysicalTileType, SubTile, TilePort};
use crate::types::{PortDirection, PortEquivalence};
use archfpga_common::{ArchError, ArchResult};
use archfpga_tree::ArchNode;
use std::collections::BTreeSet;

/// Builds one logical block type per root `<pb_type>`, after the empty
/// block at ID 0.
pub fn process_complexblocks(
    list: &ArchNode,
    arena: &mut PbTypeArena,
    library: &ModelLibrary,
    reporter: &Reporter,
) -> ArchResult<Vec<LogicalBlockType>> {
    list.expect_only_children(&["pb_type"])?;
    let mut blocks = vec![LogicalBlockType::empty()];
    let mut names = BTreeSet::new();
    for node in &list.children {
        let name = node.required_attr("name")?;
        if !names.insert(name) {
            return Err(ArchError::duplicate("pb_type descriptor", name, &node.loc));
        }
        let root = PbTypeBuilder::new(arena, library, reporter).build_root(node)?;
        let mapping = arena
            .pb_type(root)
            .ports
            .iter()
            .enumerate()
            .flat_map(|(port, p)| {
                (0..p.num_pins).map(move |pin| PbPinRef {
                    pb_type: root,
                    port,
                    pin,
                })
            })
            .collect();
        blocks.push(LogicalBlockType {
            id: LogicalBlockId::from_raw(blocks.len() as u32),
            name: name.to_string(),
            pb_type: Some(root),
            equivalent_tiles: Vec::new(),
            pin_logical_num_to_pb_pin_mapping: mapping,
            loc: node.loc.clone(),
        });
    }
    Ok(blocks)
}

/// What tile construction reads from the rest of the architecture.
pub struct TileContext<'a> {
    /// Logical blocks, indexed by ID.
    pub blocks: &'a [LogicalBlockType],
    /// The pb_types the blocks are rooted in.
    pub arena: &'a PbTypeArena,
    /// Segment catalog.
    pub segments: &'a [Segment],
    /// Switch catalog.
    pub switches: &'a [Switch],
    /// The device `<default_fc>`, if any.
    pub default_fc: Option<&'a FcValues>,
    /// Soft finding policy.
    pub reporter: &'a Reporter<'a>,
}

/// Builds one physical tile type per `<tile>`, after the empty tile at ID 0.
pub fn process_tiles(list: &ArchNode, ctx: &TileContext) -> ArchResult<Vec<PhysicalTileType>> {
    list.expect_only_children(&["tile"])?;
    let mut tiles = vec![PhysicalTileType::empty()];
    let mut names = BTreeSet::new();
    for node in &list.children {
        let id = PhysicalTileId::from_raw(tiles.len() as u32);
        let tile = process_tile(node, id, ctx)?;
        if !names.insert(tile.name.clone()) {
            return Err(ArchError::duplicate("tile", tile.name, &node.loc));
        }
        tiles.push(tile);
    }
    Ok(tiles)
}

fn process_tile(
    node: &ArchNode,
    id: PhysicalTileId,
    ctx: &TileContext,
) -> ArchResult<PhysicalTileType> {
    node.expect_only_attributes(&["name", "width", "height", "area"])?;
    node.expect_only_children(&["sub_tile", "switchblock_locations"])?;
    let name = node.required_attr("name")?;
    let mut tile = PhysicalTileType::new(id, name, node.loc.clone());
    tile.width = node.parse_attr("width")?.unwrap_or(1);
    tile.height = node.parse_attr("height")?.unwrap_or(1);
    if tile.width == 0 || tile.height == 0 {
        return Err(ArchError::shape(
            format!("Tile '{name}' must be at least one grid unit wide and high"),
            &node.loc,
        ));
    }
    tile.area = node.parse_attr("area")?;
    if tile.area.is_some_and(|area| area < 0.0) {
        return Err(ArchError::malformed(
            format!("Area for type {name} must be non-negative"),
            &node.loc,
        ));
    }

    tile.switchblock_locations = Some(SwitchblockLocations::process(
        node.optional_child("switchblock_locations")?,
        tile.width as usize,
        tile.height as usize,
        ctx.switches,
    )?);

    if node.count_children("sub_tile") == 0 {
        return Err(ArchError::shape(
            format!(
                "No sub tile found for the Physical Tile {name}. At least one sub tile is needed to correctly describe the Physical Tile."
            ),
            &node.loc,
        ));
    }
    let mut sub_tile_names = BTreeSet::new();
    for (index, child) in node.children_named("sub_tile").enumerate() {
        let sub_name = child.required_attr("name")?;
        if !sub_tile_names.insert(sub_name) {
            let scoped = format!("{name}.{sub_name}");
            return Err(ArchError::duplicate("sub tile", scoped, &child.loc));
        }
        process_sub_tile(child, index, &mut tile, ctx)?;
    }

    setup_pin_classes(&mut tile)?;
    Ok(tile)
}

fn process_sub_tile(
    node: &ArchNode,
    index: usize,
    tile: &mut PhysicalTileType,
    ctx: &TileContext,
) -> ArchResult<()> {
    node.expect_only_attributes(&["name", "capacity"])?;
    node.expect_only_children(&[
        "input",
        "output",
        "clock",
        "fc",
        "pinlocations",
        "equivalent_sites",
    ])?;
    let name = node.required_attr("name")?;
    let capacity: i64 = node.parse_attr("capacity")?.unwrap_or(1);
    let capacity = positive_u32(capacity).ok_or_else(|| {
        ArchError::shape(
            format!("Invalid capacity {capacity} for sub tile '{name}'"),
            &node.loc,
        )
    })?;

    let ports = process_sub_tile_ports(node, name)?;
    let too_many = || {
        ArchError::shape(
            format!("Too many pins in sub tile '{name}' of tile '{}'", tile.name),
            &node.loc,
        )
    };
    let per_instance = ports
        .iter()
        .try_fold(0u32, |sum, p| sum.checked_add(p.num_pins))
        .ok_or_else(too_many)?;
    let num_phy_pins = capacity.checked_mul(per_instance).ok_or_else(too_many)?;
    let first_pin = tile.num_pins;
    let end_pin = first_pin.checked_add(num_phy_pins).ok_or_else(too_many)?;
    let end_slot = tile.capacity.checked_add(capacity).ok_or_else(|| {
        ArchError::shape(
            format!("Total capacity of tile '{}' is too large", tile.name),
            &node.loc,
        )
    })?;
    let mut sub_tile = SubTile {
        name: name.to_string(),
        index,
        capacity: CapacityRange {
            low: tile.capacity,
            high: end_slot - 1,
        },
        ports,
        equivalent_sites: Vec::new(),
        sub_tile_to_tile_pin_indices: (first_pin..end_pin).collect(),
        class_range: 0..0,
        num_phy_pins,
        loc: node.loc.clone(),
    };

    tile.capacity = end_slot;
    for port in &sub_tile.ports {
        let pins = capacity * port.num_pins;
        match (port.direction, port.is_clock) {
            (_, true) => tile.num_clock_pins += pins,
            (PortDirection::Input, false) => {
                tile.num_input_pins += pins;
                tile.num_receivers += pins;
            }
            (PortDirection::Output, false) => {
                tile.num_output_pins += pins;
                tile.num_drivers += pins;
            }
        }
    }
    tile.num_pins = end_pin;
    tile.num_inst_pins += per_instance;

    let fc_specs = process_fc(
        node.optional_child("fc")?,
        &sub_tile,
        ctx.segments,
        ctx.default_fc,
        ctx.reporter,
    )?;
    tile.fc_specs.extend(fc_specs);

    process_equivalent_sites(node.single_child("equivalent_sites")?, &mut sub_tile, tile, ctx)?;
    tile.sub_tiles.push(sub_tile);
    Ok(())
}

fn process_sub_tile_ports(node: &ArchNode, sub_tile: &str) -> ArchResult<Vec<TilePort>> {
    let mut ports: Vec<TilePort> = Vec::new();
    let mut names = BTreeSet::new();
    let mut first_pin = 0;
    for element in ["input", "output", "clock"] {
        for (by_type, child) in node.children_named(element).enumerate() {
            let mut port = process_tile_port(child)?;
            if !names.insert(port.name.clone()) {
                let scoped = format!("{sub_tile}.{}", port.name);
                return Err(ArchError::duplicate("port", scoped, &child.loc));
            }
            port.index = ports.len();
            port.port_index_by_type = by_type;
            port.absolute_first_pin_index = first_pin;
            first_pin = first_pin.checked_add(port.num_pins).ok_or_else(|| {
                ArchError::shape(
                    format!("Too many pins in subtile '{sub_tile}'"),
                    &child.loc,
                )
            })?;
            ports.push(port);
        }
    }
    Ok(ports)
}

fn process_tile_port(node: &ArchNode) -> ArchResult<TilePort> {
    let element = node.name.as_str();
    if element == "output" {
        node.expect_only_attributes(&["name", "num_pins", "equivalent"])?;
    } else {
        node.expect_only_attributes(&["name", "num_pins", "equivalent", "is_non_clock_global"])?;
    }
    let name = node.required_attr("name")?;
    let equivalence = match node.attribute("equivalent") {
        None => PortEquivalence::None,
        Some(value) => PortEquivalence::parse(value, element, &node.loc)?,
    };
    let num_pins: i64 = node.required_parse("num_pins")?;
    let num_pins = positive_u32(num_pins).ok_or_else(|| {
        ArchError::shape(
            format!("Invalid number of pins {num_pins} for {element} port."),
            &node.loc,
        )
    })?;
    let is_non_clock_global = node.bool_attr("is_non_clock_global", false)?;
    let is_clock = element == "clock";
    if is_clock && is_non_clock_global {
        return Err(ArchError::malformed(
            format!("Port {name} cannot be both a clock and a non-clock simultaneously"),
            &node.loc,
        ));
    }
    Ok(TilePort {
        name: name.to_string(),
        direction: if element == "output" {
            PortDirection::Output
        } else {
            PortDirection::Input
        },
        is_clock,
        is_non_clock_global,
        num_pins,
        equivalence,
        absolute_first_pin_index: 0,
        index: 0,
        port_index_by_type: 0,
        loc: node.loc.clone(),
    })
}

fn process_equivalent_sites(
    node: &ArchNode,
    sub_tile: &mut SubTile,
    tile: &mut PhysicalTileType,
    ctx: &TileContext,
) -> ArchResult<()> {
    node.expect_only_children(&["site"])?;
    if node.children.is_empty() {
        return Err(ArchError::malformed(
            format!("There are no sites corresponding to this tile: {}.", sub_tile.name),
            &node.loc,
        ));
    }
    for site in &node.children {
        site.expect_only_attributes(&["pb_type", "pin_mapping"])?;
        let block_name = site.required_attr("pb_type")?;
        let (block, root) = ctx
            .blocks
            .iter()
            .find(|b| b.name == block_name)
            .and_then(|b| b.pb_type.map(|root| (b, ctx.arena.pb_type(root))))
            .ok_or_else(|| {
                ArchError::unknown(
                    format!(
                        "No pb_type found with name '{block_name}' for site of sub tile '{}'",
                        sub_tile.name
                    ),
                    &site.loc,
                )
            })?;
        if sub_tile.equivalent_sites.contains(&block.id) {
            return Err(ArchError::duplicate("site", block_name, &site.loc));
        }
        let map = match site.attr_or("pin_mapping", "direct") {
            "direct" => direct_pin_map(site, sub_tile, root)?,
            "custom" => custom_pin_map(site, sub_tile, root)?,
            other => {
                return Err(ArchError::malformed(
                    format!("Invalid pin_mapping '{other}' (must be 'direct' or 'custom')"),
                    &site.loc,
                ))
            }
        };
        check_port_direct_mappings(&tile.name, sub_tile, root, &map, &site.loc)?;
        tile.tile_block_pin_directs_map
            .entry(block.id)
            .or_default()
            .insert(sub_tile.index, map);
        sub_tile.equivalent_sites.push(block.id);
    }
    Ok(())
}
