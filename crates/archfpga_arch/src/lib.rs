//! The FPGA architecture model: logic models, complex-block hierarchies,
//! physical tiles and the pin mappings between them.
//!
//! [`build_architecture`] turns an already-parsed `<architecture>` tree into
//! an immutable [`Architecture`]. Construction is a fixed chain of passes:
//!
//! - models are read into the [`ModelLibrary`], after the four built-ins;
//! - each `<pb_type>` under `<complexblocklist>` becomes a
//!   [`LogicalBlockType`] rooted in a [`PbTypeArena`] subtree, with LUT and
//!   memory classes expanded into explicit modes;
//! - each `<tile>` becomes a [`PhysicalTileType`] with numbered pins and
//!   pin classes and a pin map per equivalent site;
//! - tiles and blocks are linked, primitives are bound to their models and
//!   the whole model is cross-checked.
//!
//! Any hard failure aborts the build with an [`ArchError`]. Soft findings
//! (missing timing on a built-in model, overlapping Fc overrides) go to the
//! [`DiagnosticSink`] unless the [`ArchConfig`] denies or allows them.
//!
//! ```
//! use archfpga_arch::{build_architecture, ModelLibrary};
//! use archfpga_config::ArchConfig;
//! use archfpga_diagnostics::DiagnosticSink;
//! use archfpga_tree::ArchNode;
//!
//! let root = ArchNode::new("architecture")
//!     .child(ArchNode::new("models"))
//!     .child(ArchNode::new("complexblocklist"))
//!     .child(ArchNode::new("tiles"));
//! let sink = DiagnosticSink::new();
//! let arch = build_architecture(&root, &ArchConfig::default(), &sink).unwrap();
//! assert_eq!(arch.models.len(), ModelLibrary::NUM_LIBRARY_MODELS);
//! assert!(arch.physical_tile_types[0].is_empty());
//! ```

#![warn(missing_docs)]

pub mod annotation;
pub mod arena;
pub mod check;
pub mod class_expand;
pub mod codes;
pub mod fc;
pub mod ids;
pub mod link;
pub mod model;
pub mod model_builder;
pub mod pb_builder;
pub mod pb_type;
pub mod pin_class;
pub mod pin_map;
pub mod port_spec;
pub mod report;
pub mod routing;
pub mod switchblock;
pub mod tile;
pub mod tile_builder;
pub mod types;

pub use fc::{FcSpec, FcValues};
pub use ids::{LogicalBlockId, LogicalPin, ModeId, ModelId, PbTypeId, PhysicalPin, PhysicalTileId};
pub use model::{Model, ModelLibrary, ModelPort};
pub use pb_type::{Mode, PbType, PbTypeArena, Port};
pub use pin_map::PinDirectMap;
pub use routing::{Segment, Switch};
pub use tile::{LogicalBlockType, PhysicalTileType, PinClass, SubTile};
pub use types::PortDirection;

use archfpga_common::{ArchError, ArchResult, ContentHash};
use archfpga_config::ArchConfig;
use archfpga_diagnostics::DiagnosticSink;
use archfpga_tree::ArchNode;
use report::Reporter;
use serde::Serialize;
use tile_builder::TileContext;

/// A fully built and validated architecture.
///
/// Nothing is mutated after [`build_architecture`] returns, so the value
/// can be shared freely between threads.
#[derive(Clone, Debug, Serialize)]
pub struct Architecture {
    /// Hash of the input description, stable across re-reads.
    pub id: ContentHash,
    /// Built-in and user logic models.
    pub models: ModelLibrary,
    /// Every pb_type and mode of every complex block.
    pub pb_types: PbTypeArena,
    /// Logical block types, the empty block at index 0.
    pub logical_block_types: Vec<LogicalBlockType>,
    /// Physical tile types, the empty tile at index 0.
    pub physical_tile_types: Vec<PhysicalTileType>,
    /// Switch catalog.
    pub switches: Vec<Switch>,
    /// Segment catalog.
    pub segments: Vec<Segment>,
    /// The device-wide default Fc, if declared.
    pub default_fc: Option<FcValues>,
}

impl Architecture {
    /// Looks up a physical tile type by name.
    pub fn tile_by_name(&self, name: &str) -> Option<&PhysicalTileType> {
        self.physical_tile_types.iter().find(|t| t.name == name)
    }

    /// Looks up a logical block type by name.
    pub fn block_by_name(&self, name: &str) -> Option<&LogicalBlockType> {
        self.logical_block_types.iter().find(|b| b.name == name)
    }

    /// The pin map between `block` and sub-tile `sub_tile` of `tile`.
    pub fn pin_map(
        &self,
        tile: PhysicalTileId,
        block: LogicalBlockId,
        sub_tile: usize,
    ) -> Option<&PinDirectMap> {
        self.physical_tile_types.get(tile.index())?.pin_map(block, sub_tile)
    }
}

/// Builds the architecture described by the `<architecture>` tree `root`.
pub fn build_architecture(
    root: &ArchNode,
    config: &ArchConfig,
    sink: &DiagnosticSink,
) -> ArchResult<Architecture> {
    if root.name != "architecture" {
        return Err(ArchError::malformed(
            format!("expected <architecture> root, found <{}>", root.name),
            &root.loc,
        ));
    }
    let reporter = Reporter::new(config, sink);
    let id = content_hash(root)?;

    let mut models = ModelLibrary::new();
    model_builder::process_models(root.single_child("models")?, &mut models, &reporter)?;

    let default_fc = match root.optional_child("device")? {
        Some(device) => device
            .optional_child("default_fc")?
            .map(fc::process_fc_values)
            .transpose()?,
        None => None,
    };
    let switches = match root.optional_child("switchlist")? {
        Some(list) => routing::process_switches(list)?,
        None => Vec::new(),
    };
    let segments = match root.optional_child("segmentlist")? {
        Some(list) => routing::process_segments(list)?,
        None => Vec::new(),
    };

    let mut pb_types = PbTypeArena::new();
    let mut logical_block_types = tile_builder::process_complexblocks(
        root.single_child("complexblocklist")?,
        &mut pb_types,
        &models,
        &reporter,
    )?;

    let ctx = TileContext {
        blocks: &logical_block_types,
        arena: &pb_types,
        segments: &segments,
        switches: &switches,
        default_fc: default_fc.as_ref(),
        reporter: &reporter,
    };
    let mut physical_tile_types = tile_builder::process_tiles(root.single_child("tiles")?, &ctx)?;

    link::link_physical_logical_types(&mut physical_tile_types, &mut logical_block_types)?;
    check::sync_models_pb_types(&mut models, &mut pb_types, &logical_block_types)?;
    check::check_models(&mut models)?;
    check::mark_io_types(&mut physical_tile_types, &logical_block_types, &pb_types);

    Ok(Architecture {
        id,
        models,
        pb_types,
        logical_block_types,
        physical_tile_types,
        switches,
        segments,
        default_fc,
    })
}

/// Hashes the canonical JSON form of `root`. Provenance is not serialized.
pub fn content_hash(root: &ArchNode) -> ArchResult<ContentHash> {
    let json = serde_json::to_vec(root).map_err(|e| {
        ArchError::malformed(format!("cannot serialize architecture: {e}"), &root.loc)
    })?;
    Ok(ContentHash::from_bytes(&json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pb_builder::tests::clb;
    use crate::tile_builder::tests::{clb_tile, fc, io_pb_type, io_tile};

    fn minimal() -> ArchNode {
        ArchNode::new("architecture")
            .child(ArchNode::new("models"))
            .child(ArchNode::new("complexblocklist"))
            .child(ArchNode::new("tiles"))
    }

    #[test]
    fn empty_architecture_has_sentinels() {
        let sink = DiagnosticSink::new();
        let arch = build_architecture(&minimal(), &ArchConfig::default(), &sink).unwrap();
        assert_eq!(arch.logical_block_types.len(), 1);
        assert_eq!(arch.physical_tile_types.len(), 1);
        assert!(arch.logical_block_types[0].is_empty());
        assert!(arch.models.user_models().next().is_none());
    }

    #[test]
    fn wrong_root_rejected() {
        let sink = DiagnosticSink::new();
        let err = build_architecture(&ArchNode::new("device"), &ArchConfig::default(), &sink)
            .unwrap_err();
        assert!(matches!(err, ArchError::Malformed { .. }));
    }

    #[test]
    fn missing_section_rejected() {
        let root = ArchNode::new("architecture").child(ArchNode::new("models"));
        let sink = DiagnosticSink::new();
        let err = build_architecture(&root, &ArchConfig::default(), &sink).unwrap_err();
        assert!(err.message().contains("complexblocklist"));
    }

    #[test]
    fn id_ignores_layout() {
        let a = content_hash(&minimal().at(1)).unwrap();
        let b = content_hash(&minimal().at(40).with_file("other.xml")).unwrap();
        assert_eq!(a, b);
        let c = content_hash(&minimal().child(ArchNode::new("layout"))).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn builds_io_and_clb() {
        let root = ArchNode::new("architecture")
            .child(ArchNode::new("models"))
            .child(ArchNode::new("device").child(fc()))
            .child(
                ArchNode::new("segmentlist")
                    .child(ArchNode::new("segment").attr("name", "L4").attr("length", 4)),
            )
            .child(
                ArchNode::new("complexblocklist")
                    .child(io_pb_type())
                    .child(clb()),
            )
            .child(ArchNode::new("tiles").child(io_tile()).child(clb_tile()));
        let sink = DiagnosticSink::new();
        let arch = build_architecture(&root, &ArchConfig::default(), &sink).unwrap();

        let io = arch.tile_by_name("io").unwrap();
        assert!(io.is_input_type && io.is_output_type);
        let clb_block = arch.block_by_name("clb").unwrap();
        assert_eq!(clb_block.equivalent_tiles, vec![arch.tile_by_name("clb").unwrap().id]);
        let latch = arch.models.get_model(ModelLibrary::LATCH);
        assert_eq!(latch.pb_types.len(), 1);
        assert!(arch.default_fc.is_some());
        assert!(arch.pin_map(io.id, arch.block_by_name("io").unwrap().id, 0).is_some());
    }
}
