//! The recursive pb_type/mode hierarchy, stored in arenas.
//!
//! Parents own children through ID lists; the upward links
//! ([`PbType::parent_mode`], [`Mode::parent`]) are plain IDs.

use crate::annotation::Annotation;
use crate::arena::Arena;
use crate::ids::{ModeId, ModelId, PbTypeId};
use crate::types::{PortDirection, PortEquivalence};
use archfpga_common::{ArchError, ArchResult, SourceLoc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// `<metadata>` key/value pairs. A key may repeat.
pub type Metadata = BTreeMap<String, Vec<String>>;

/// The `class` of a primitive pb_type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum PbClass {
    /// No special handling.
    #[default]
    None,
    /// Look-up table, expanded into a wire mode and a LUT mode.
    Lut,
    /// Flip-flop.
    Latch,
    /// Memory, expanded into one-bit slices.
    Memory,
}

impl PbClass {
    /// Parses a `class` attribute.
    pub fn parse(value: &str, pb_type: &str, loc: &SourceLoc) -> ArchResult<Self> {
        match value {
            "lut" => Ok(PbClass::Lut),
            "flipflop" | "latch" => Ok(PbClass::Latch),
            "memory" => Ok(PbClass::Memory),
            _ => Err(ArchError::malformed(
                format!("Unknown class '{value}' in pb_type '{pb_type}'"),
                loc,
            )),
        }
    }
}

/// Where a leaf port is bound on its model.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ModelPortRef {
    /// The model.
    pub model: ModelId,
    /// Which list of the model holds the port.
    pub direction: PortDirection,
    /// Position in that list.
    pub index: usize,
}

/// A port of a pb_type.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique within the pb_type.
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
    /// `port_class` tag such as `lut_in` or `data_in`.
    pub port_class: Option<String>,
    /// First pin of this port counted over all ports of the pb_type.
    pub absolute_first_pin_index: u32,
    /// Position among all ports of the pb_type.
    pub index: usize,
    /// Position among ports of the same kind (input, output, clock).
    pub port_index_by_type: usize,
    /// Matching model port, filled in for leaves once models are synced.
    pub model_port: Option<ModelPortRef>,
    /// Where the port was declared.
    pub loc: SourceLoc,
}

impl Port {
    /// Kind name as written in the description.
    pub fn element(&self) -> &'static str {
        match (self.direction, self.is_clock) {
            (_, true) => "clock",
            (PortDirection::Input, false) => "input",
            (PortDirection::Output, false) => "output",
        }
    }

    /// Whether the port's pins bypass general routing.
    pub fn is_global(&self) -> bool {
        self.is_clock || self.is_non_clock_global
    }

    /// Logical pins of this port within its pb_type.
    pub fn pin_range(&self) -> Range<u32> {
        self.absolute_first_pin_index..self.absolute_first_pin_index + self.num_pins
    }
}

/// Interconnect flavors inside a mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum InterconnectKind {
    /// Full crossbar.
    Complete,
    /// Bit-for-bit wires.
    Direct,
    /// Multiplexer.
    Mux,
}

impl InterconnectKind {
    /// Element name as written.
    pub fn element(self) -> &'static str {
        match self {
            InterconnectKind::Complete => "complete",
            InterconnectKind::Direct => "direct",
            InterconnectKind::Mux => "mux",
        }
    }
}

/// One interconnect edge of a mode.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Interconnect {
    /// Name, unique within the mode.
    pub name: String,
    /// Flavor.
    pub kind: InterconnectKind,
    /// Source port references as written.
    pub input: String,
    /// Sink port references as written.
    pub output: String,
    /// Delay, capacitance and pack-pattern annotations.
    pub annotations: Vec<Annotation>,
    /// Whether timing should be inferred from the connected primitives.
    pub infer_annotations: bool,
    /// `<metadata>` entries.
    pub metadata: Metadata,
    /// Where the interconnect was declared.
    pub loc: SourceLoc,
}

impl Interconnect {
    /// Creates a synthesized direct connection.
    pub fn direct(name: String, input: String, output: String, loc: &SourceLoc) -> Self {
        Self {
            name,
            kind: InterconnectKind::Direct,
            input,
            output,
            annotations: Vec::new(),
            infer_annotations: true,
            metadata: Metadata::new(),
            loc: loc.clone(),
        }
    }
}

/// One operating configuration of a pb_type.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Mode {
    /// This mode's ID.
    pub id: ModeId,
    /// Name, unique within the parent pb_type.
    pub name: String,
    /// Position within the parent's modes.
    pub index: usize,
    /// The pb_type this mode belongs to.
    pub parent: PbTypeId,
    /// Child pb_types in declaration order.
    pub children: Vec<PbTypeId>,
    /// Interconnect in declaration order.
    pub interconnects: Vec<Interconnect>,
    /// Hidden from the packer.
    pub disable_packing: bool,
    /// `<metadata>` entries.
    pub metadata: Metadata,
    /// Where the mode was declared.
    pub loc: SourceLoc,
}

/// A node of the complex-block hierarchy.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PbType {
    /// This pb_type's ID.
    pub id: PbTypeId,
    /// Name, unique among siblings.
    pub name: String,
    /// Replication count under the parent mode (1 at the root).
    pub num_pb: u32,
    /// Model name as written, for primitives.
    pub blif_model: Option<String>,
    /// Resolved model, once models are synced.
    pub model: Option<ModelId>,
    /// Primitive class.
    pub class: PbClass,
    /// Ports: inputs, then outputs, then clocks.
    pub ports: Vec<Port>,
    /// Modes in declaration order.
    pub modes: Vec<ModeId>,
    /// Timing annotations (leaves only).
    pub annotations: Vec<Annotation>,
    /// The mode containing this pb_type, `None` at the root.
    pub parent_mode: Option<ModeId>,
    /// Nesting depth, 0 at the root.
    pub depth: u32,
    /// Total input pins.
    pub num_input_pins: u32,
    /// Total output pins.
    pub num_output_pins: u32,
    /// Total clock pins.
    pub num_clock_pins: u32,
    /// `<metadata>` entries.
    pub metadata: Metadata,
    /// Where the pb_type was declared.
    pub loc: SourceLoc,
}

impl PbType {
    /// A leaf has no modes.
    pub fn is_leaf(&self) -> bool {
        self.modes.is_empty()
    }

    /// Whether this pb_type is bound to a model.
    pub fn is_primitive(&self) -> bool {
        self.blif_model.is_some()
    }

    /// Total pin count.
    pub fn num_pins(&self) -> u32 {
        self.num_input_pins + self.num_output_pins + self.num_clock_pins
    }

    /// Finds a port by name.
    pub fn find_port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Names of the clock ports.
    pub fn clock_port_names(&self) -> Vec<&str> {
        self.ports
            .iter()
            .filter(|p| p.is_clock)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Recomputes pin totals and absolute offsets from `ports`.
    pub fn recount_pins(&mut self) {
        let mut next = 0;
        self.num_input_pins = 0;
        self.num_output_pins = 0;
        self.num_clock_pins = 0;
        for port in &mut self.ports {
            port.absolute_first_pin_index = next;
            next += port.num_pins;
            match (port.direction, port.is_clock) {
                (_, true) => self.num_clock_pins += port.num_pins,
                (PortDirection::Input, false) => self.num_input_pins += port.num_pins,
                (PortDirection::Output, false) => self.num_output_pins += port.num_pins,
            }
        }
    }
}

/// Owner of every pb_type and mode of an architecture.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PbTypeArena {
    pb_types: Arena<PbTypeId, PbType>,
    modes: Arena<ModeId, Mode>,
}

impl PbTypeArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a pb_type, assigning its ID.
    pub fn add_pb_type(&mut self, mut pb_type: PbType) -> PbTypeId {
        let id = self.pb_types.next_id();
        pb_type.id = id;
        self.pb_types.alloc(pb_type)
    }

    /// Allocates a mode under `parent`, assigning its ID and index.
    pub fn add_mode(&mut self, mut mode: Mode) -> ModeId {
        let id = self.modes.next_id();
        mode.id = id;
        mode.index = self.pb_types[mode.parent].modes.len();
        let parent = mode.parent;
        self.modes.alloc(mode);
        self.pb_types[parent].modes.push(id);
        id
    }

    /// Adds `child` to `mode`, fixing its parent link and depth.
    pub fn attach_child(&mut self, mode: ModeId, child: PbTypeId) {
        let depth = self.pb_types[self.modes[mode].parent].depth + 1;
        let pb = &mut self.pb_types[child];
        pb.parent_mode = Some(mode);
        pb.depth = depth;
        self.modes[mode].children.push(child);
    }

    /// Returns a pb_type.
    pub fn pb_type(&self, id: PbTypeId) -> &PbType {
        &self.pb_types[id]
    }

    /// Returns a pb_type mutably.
    pub fn pb_type_mut(&mut self, id: PbTypeId) -> &mut PbType {
        &mut self.pb_types[id]
    }

    /// Returns a mode.
    pub fn mode(&self, id: ModeId) -> &Mode {
        &self.modes[id]
    }

    /// Returns a mode mutably.
    pub fn mode_mut(&mut self, id: ModeId) -> &mut Mode {
        &mut self.modes[id]
    }

    /// Every pb_type in allocation order.
    pub fn pb_types(&self) -> impl Iterator<Item = &PbType> {
        self.pb_types.values()
    }

    /// Number of pb_types.
    pub fn len(&self) -> usize {
        self.pb_types.len()
    }

    /// Whether no pb_type was allocated.
    pub fn is_empty(&self) -> bool {
        self.pb_types.is_empty()
    }

    /// The parent pb_type of `id`, if any.
    pub fn parent_of(&self, id: PbTypeId) -> Option<PbTypeId> {
        self.pb_types[id].parent_mode.map(|m| self.modes[m].parent)
    }

    /// The pb_types under `root` in pre-order, `root` first.
    pub fn walk(&self, root: PbTypeId) -> Vec<PbTypeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            for &mode in self.pb_types[id].modes.iter().rev() {
                stack.extend(self.modes[mode].children.iter().rev());
            }
        }
        order
    }

    /// The leaves under `root` in pre-order.
    pub fn leaves(&self, root: PbTypeId) -> Vec<PbTypeId> {
        self.walk(root)
            .into_iter()
            .filter(|&id| self.pb_types[id].is_leaf())
            .collect()
    }

    /// The hierarchical path of `id`, e.g. `clb.fle[n1_lut6].ble6`.
    pub fn path(&self, id: PbTypeId) -> String {
        let pb = &self.pb_types[id];
        match pb.parent_mode {
            None => pb.name.clone(),
            Some(mode) => {
                let mode = &self.modes[mode];
                let parent = self.path(mode.parent);
                format!("{parent}[{}].{}", mode.name, pb.name)
            }
        }
    }
}
