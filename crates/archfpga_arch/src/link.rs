//! Links physical tiles and logical blocks into equivalent-site lists.
//!
//! Candidate lists are ordered tightest fit first: by the absolute
//! difference between the tile's per-instance pin count and the block's pin
//! count, ties kept in declaration order. Callers that take the first entry
//! rely on this order.

use crate::ids::{LogicalBlockId, LogicalPin, PhysicalTileId};
use crate::tile::{LogicalBlockType, PhysicalTileType};
use archfpga_common::{ArchError, ArchResult};
use std::collections::BTreeMap;

fn pin_distance(tile: &PhysicalTileType, block_pins: u32) -> u32 {
    tile.num_inst_pins.abs_diff(block_pins)
}

/// Orders every sub-tile's sites and every block's tiles, then checks that
/// each logical pin is ignored or global the same way wherever it lands.
pub fn link_physical_logical_types(
    tiles: &mut [PhysicalTileType],
    blocks: &mut [LogicalBlockType],
) -> ArchResult<()> {
    let block_pins: Vec<u32> = blocks.iter().map(LogicalBlockType::num_pins).collect();

    for tile in tiles.iter_mut().filter(|t| !t.is_empty()) {
        let inst_pins = tile.num_inst_pins;
        for sub_tile in &mut tile.sub_tiles {
            sub_tile
                .equivalent_sites
                .sort_by_key(|site| inst_pins.abs_diff(block_pins[site.index()]));
        }
        let mut sites = tile.site_union();
        sites.sort_by_key(|site| inst_pins.abs_diff(block_pins[site.index()]));
        for site in &sites {
            blocks[site.index()].equivalent_tiles.push(tile.id);
        }
        tile.equivalent_sites = sites;
    }

    for block in blocks.iter_mut().filter(|b| !b.is_empty()) {
        if block.equivalent_tiles.is_empty() {
            return Err(ArchError::inconsistent(
                format!("Logical Block {} does not have any equivalent tiles.", block.name),
                &block.loc,
            ));
        }
        let pins = block.num_pins();
        block
            .equivalent_tiles
            .sort_by_key(|tile| pin_distance(&tiles[tile.index()], pins));
        check_pin_flags(block, tiles)?;
    }
    Ok(())
}

/// Requires `is_ignored_pin` and `is_pin_global` of every logical pin to
/// agree over all tiles, sub-tiles and capacity instances it can map to.
fn check_pin_flags(block: &LogicalBlockType, tiles: &[PhysicalTileType]) -> ArchResult<()> {
    let mut ignored: BTreeMap<u32, bool> = BTreeMap::new();
    let mut global: BTreeMap<u32, bool> = BTreeMap::new();
    for pin in 0..block.num_pins() {
        for &tile_id in &block.equivalent_tiles {
            let tile = &tiles[tile_id.index()];
            for sub_tile in &tile.sub_tiles {
                if !sub_tile.equivalent_sites.contains(&block.id) {
                    continue;
                }
                let physical = tile
                    .pin_map(block.id, sub_tile.index)
                    .and_then(|map| map.physical(LogicalPin::from_raw(pin)))
                    .ok_or_else(|| {
                        ArchError::inconsistent(
                            format!(
                                "Logical pin {pin} not present in pin mapping between Tile {} and Block {}.",
                                tile.name, block.name
                            ),
                            &sub_tile.loc,
                        )
                    })?;
                for instance in 0..sub_tile.capacity.total() {
                    let tile_pin = sub_tile.tile_pin(instance, physical.as_raw());
                    let slot = tile_pin as usize;
                    let is_ignored = tile.is_ignored_pin[slot];
                    let is_global = tile.is_pin_global[slot];
                    check_flag(&mut ignored, pin, is_ignored, "ignored", tile, tile_pin, block)?;
                    check_flag(&mut global, pin, is_global, "global", tile, tile_pin, block)?;
                }
            }
        }
    }
    Ok(())
}

fn check_flag(
    seen: &mut BTreeMap<u32, bool>,
    pin: u32,
    value: bool,
    what: &str,
    tile: &PhysicalTileType,
    tile_pin: u32,
    block: &LogicalBlockType,
) -> ArchResult<()> {
    match seen.get(&pin) {
        Some(&first) if first != value => Err(ArchError::inconsistent(
            format!(
                "Physical Tile {} has a different value for the {what} pin (physical pin: {tile_pin}, logical pin: {pin}) different from the corresponding pins of the other equivalent site {}.",
                tile.name, block.name
            ),
            &tile.loc,
        )),
        Some(_) => Ok(()),
        None => {
            seen.insert(pin, value);
            Ok(())
        }
    }
}

/// The tiles `block` can be placed in, tightest fit first.
pub fn equivalent_tiles(block: &LogicalBlockType) -> &[PhysicalTileId] {
    &block.equivalent_tiles
}

/// The blocks sub-tile `sub_tile` of `tile` accepts, tightest fit first.
pub fn equivalent_sites(tile: &PhysicalTileType, sub_tile: usize) -> &[LogicalBlockId] {
    tile.sub_tiles
        .get(sub_tile)
        .map_or(&[], |s| s.equivalent_sites.as_slice())
}
