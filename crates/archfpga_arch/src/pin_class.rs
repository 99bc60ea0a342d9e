//! Pin and pin-class numbering for physical tiles.

use crate::tile::{PhysicalTileType, PinClass};
use crate::types::{PinClassType, PortEquivalence};
use archfpga_common::{ArchError, ArchResult};

/// Numbers every pin of `tile` and groups them into classes.
///
/// Walks sub-tiles, then capacity instances, then ports in declaration
/// order. An equivalent port becomes one class per instance; any other port
/// gets one class per pin. Rerunning on an unchanged tile yields the same
/// numbering.
pub fn setup_pin_classes(tile: &mut PhysicalTileType) -> ArchResult<()> {
    tile.class_inf.clear();
    tile.pin_class = vec![0; tile.num_pins as usize];
    tile.is_ignored_pin = vec![false; tile.num_pins as usize];
    tile.is_pin_global = vec![false; tile.num_pins as usize];
    tile.clock_pin_indices.clear();

    let expected_classes: usize = tile
        .sub_tiles
        .iter()
        .map(|s| {
            let per_instance: usize = s
                .ports
                .iter()
                .map(|p| match p.equivalence {
                    PortEquivalence::None => p.num_pins as usize,
                    _ => 1,
                })
                .sum();
            per_instance * s.capacity.total() as usize
        })
        .sum();

    let mut next_pin = 0u32;
    for sub_tile in &mut tile.sub_tiles {
        let first_class = tile.class_inf.len();
        for _ in 0..sub_tile.capacity.total() {
            for port in &sub_tile.ports {
                let class_type = PinClassType::for_direction(port.direction);
                let pins: Vec<u32> = (next_pin..next_pin + port.num_pins).collect();
                next_pin += port.num_pins;
                if pins.last().is_some_and(|&p| p >= tile.num_pins) {
                    return Err(ArchError::inconsistent(
                        format!(
                            "Tile '{}' declares {} pins but its ports need more",
                            tile.name, tile.num_pins
                        ),
                        &sub_tile.loc,
                    ));
                }
                let groups: Vec<Vec<u32>> = match port.equivalence {
                    PortEquivalence::None => pins.iter().map(|&p| vec![p]).collect(),
                    _ => vec![pins],
                };
                for group in groups {
                    let class = tile.class_inf.len();
                    for &pin in &group {
                        let slot = pin as usize;
                        tile.pin_class[slot] = class;
                        tile.is_ignored_pin[slot] = port.is_global();
                        tile.is_pin_global[slot] = port.is_global();
                        if port.is_clock {
                            tile.clock_pin_indices.push(pin);
                        }
                    }
                    tile.class_inf.push(PinClass {
                        class_type,
                        equivalence: port.equivalence,
                        pins: group,
                    });
                }
            }
        }
        sub_tile.class_range = first_class..tile.class_inf.len();
    }

    if next_pin != tile.num_pins {
        return Err(ArchError::inconsistent(
            format!(
                "Tile '{}' numbered {next_pin} pins but declares {}",
                tile.name, tile.num_pins
            ),
            &tile.loc,
        ));
    }
    if tile.class_inf.len() != expected_classes {
        return Err(ArchError::inconsistent(
            format!(
                "Tile '{}' produced {} pin classes but expects {expected_classes}",
                tile.name,
                tile.class_inf.len()
            ),
            &tile.loc,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PhysicalTileId;
    use crate::tile::tests::{sub_tile, tile_port};
    use crate::types::PortDirection::{Input, Output};
    use archfpga_common::SourceLoc;

    fn tile() -> PhysicalTileType {
        let mut clk = tile_port("clk", Input, 1, 5);
        clk.is_clock = true;
        let mut inputs = tile_port("I", Input, 4, 0);
        inputs.equivalence = PortEquivalence::Full;
        let clb = sub_tile("clb", vec![inputs, tile_port("O", Output, 1, 4), clk], 1, 0);

        let mut io = sub_tile(
            "io",
            vec![tile_port("outpad", Input, 1, 0), tile_port("inpad", Output, 1, 1)],
            2,
            6,
        );
        io.index = 1;
        io.capacity = crate::tile::CapacityRange { low: 1, high: 2 };

        let mut tile =
            PhysicalTileType::new(PhysicalTileId::from_raw(1), "mixed", SourceLoc::UNKNOWN);
        tile.sub_tiles = vec![clb, io];
        tile.num_pins = 10;
        tile
    }

    #[test]
    fn numbers_pins_and_classes() {
        let mut tile = tile();
        setup_pin_classes(&mut tile).unwrap();
        assert_eq!(tile.num_class(), 1 + 1 + 1 + 4);
        assert_eq!(tile.class_inf[0].pins, vec![0, 1, 2, 3]);
        assert_eq!(tile.class_inf[0].class_type, PinClassType::Receiver);
        assert_eq!(tile.class_inf[1].class_type, PinClassType::Driver);
        assert_eq!(tile.pin_class, vec![0, 0, 0, 0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(tile.clock_pin_indices, vec![5]);
        assert!(tile.is_ignored_pin[5] && tile.is_pin_global[5]);
        assert!(!tile.is_ignored_pin[4]);
        assert_eq!(tile.sub_tiles[0].class_range, 0..3);
        assert_eq!(tile.sub_tiles[1].class_range, 3..7);
    }

    #[test]
    fn every_pin_in_exactly_one_class() {
        let mut tile = tile();
        setup_pin_classes(&mut tile).unwrap();
        let total: usize = tile.class_inf.iter().map(|c| c.pins.len()).sum();
        assert_eq!(total, tile.num_pins as usize);
        for (class, info) in tile.class_inf.iter().enumerate() {
            for &pin in &info.pins {
                assert_eq!(tile.pin_class[pin as usize], class);
            }
        }
    }

    #[test]
    fn rerun_is_identical() {
        let mut tile = tile();
        setup_pin_classes(&mut tile).unwrap();
        let first = tile.clone();
        setup_pin_classes(&mut tile).unwrap();
        assert_eq!(tile, first);
    }

    #[test]
    fn pin_count_mismatch_is_rejected() {
        let mut short = tile();
        short.num_pins = 9;
        assert!(matches!(setup_pin_classes(&mut short), Err(ArchError::Inconsistent { .. })));
        let mut long = tile();
        long.num_pins = 12;
        let err = setup_pin_classes(&mut long).unwrap_err();
        assert_eq!(err.message(), "Tile 'mixed' numbered 10 pins but declares 12");
    }
}
