//! The logic-model library: built-in primitives plus user `<model>`s.
//!
//! The four built-in models are created first, in a fixed order, so their
//! IDs are the constants [`ModelLibrary::INPUT`], [`ModelLibrary::OUTPUT`],
//! [`ModelLibrary::LATCH`] and [`ModelLibrary::NAMES`]. Every model created
//! afterwards is a user model.

use crate::arena::Arena;
use crate::ids::{ModelId, PbTypeId};
use crate::types::PortDirection;
use archfpga_common::{ArchError, ArchResult, SourceLoc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One port of a logic model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelPort {
    /// Port name, unique within the model.
    pub name: String,
    /// Input or output.
    pub direction: PortDirection,
    /// Widest pin count of any pb_type port bound to this model port.
    pub size: u32,
    /// Narrowest pin count of any bound pb_type port, if any is bound yet.
    pub min_size: Option<u32>,
    /// Whether the port is a clock.
    pub is_clock: bool,
    /// Whether the port carries a device-wide non-clock signal.
    pub is_non_clock_global: bool,
    /// Name of the clock port this port is sequential with.
    pub clock: Option<String>,
    /// Output ports this input drives combinationally.
    pub combinational_sink_ports: Vec<String>,
    /// Index among ports of the same kind (clock inputs, other inputs, outputs).
    pub index: u32,
    /// Where the port was declared.
    pub loc: SourceLoc,
}

impl ModelPort {
    /// Creates a one-bit port with no timing relations.
    pub fn new(name: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            name: name.into(),
            direction,
            size: 0,
            min_size: None,
            is_clock: false,
            is_non_clock_global: false,
            clock: None,
            combinational_sink_ports: Vec::new(),
            index: 0,
            loc: SourceLoc::UNKNOWN,
        }
    }

    /// Widens `size`/`min_size` to cover a bound pb_type port of `num_pins`.
    pub fn widen(&mut self, num_pins: u32) {
        self.size = self.size.max(num_pins);
        self.min_size = Some(match self.min_size {
            Some(min) => min.min(num_pins),
            None => num_pins,
        });
    }
}

/// A named primitive with ordered input and output ports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// This model's ID.
    pub id: ModelId,
    /// Model name, e.g. `.latch` or `single_port_ram`.
    pub name: String,
    /// Input ports in declaration order.
    pub inputs: Vec<ModelPort>,
    /// Output ports in declaration order.
    pub outputs: Vec<ModelPort>,
    /// Whether netlist cleanup must keep instances of this model.
    pub never_prune: bool,
    /// Leaf pb_types implementing this model, in discovery order.
    pub pb_types: Vec<PbTypeId>,
    /// Where the model was declared.
    pub loc: SourceLoc,
}

impl Model {
    /// Iterates over inputs then outputs.
    pub fn ports(&self) -> impl Iterator<Item = &ModelPort> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Finds a port of either direction by name.
    pub fn find_port(&self, name: &str) -> Option<&ModelPort> {
        self.ports().find(|p| p.name == name)
    }

    /// Finds an input port by name.
    pub fn find_input(&self, name: &str) -> Option<&ModelPort> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Finds an output port by name.
    pub fn find_output(&self, name: &str) -> Option<&ModelPort> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Returns `true` if some input lists `output` as a combinational sink.
    pub fn is_combinationally_driven(&self, output: &str) -> bool {
        self.inputs
            .iter()
            .any(|p| p.combinational_sink_ports.iter().any(|s| s == output))
    }
}

/// Owner of every [`Model`] of an architecture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelLibrary {
    models: Arena<ModelId, Model>,
    by_name: BTreeMap<String, ModelId>,
}

impl ModelLibrary {
    /// The input pad primitive `.input`.
    pub const INPUT: ModelId = ModelId::from_raw(0);
    /// The output pad primitive `.output`.
    pub const OUTPUT: ModelId = ModelId::from_raw(1);
    /// The flip-flop primitive `.latch`.
    pub const LATCH: ModelId = ModelId::from_raw(2);
    /// The look-up table primitive `.names`.
    pub const NAMES: ModelId = ModelId::from_raw(3);
    /// Number of built-in models.
    pub const NUM_LIBRARY_MODELS: usize = 4;

    /// Creates a library holding only the four built-in models.
    pub fn new() -> Self {
        let mut library = Self {
            models: Arena::new(),
            by_name: BTreeMap::new(),
        };
        for (name, inputs, outputs) in builtin_models() {
            let id = library.models.next_id();
            library.by_name.insert(name.to_string(), id);
            library.models.alloc(Model {
                id,
                name: name.to_string(),
                inputs,
                outputs,
                never_prune: false,
                pb_types: Vec::new(),
                loc: SourceLoc::UNKNOWN,
            });
        }
        library
    }

    /// Creates an empty user model named `name`.
    pub fn create_model(&mut self, name: &str, loc: &SourceLoc) -> ArchResult<ModelId> {
        if self.by_name.contains_key(name) {
            return Err(ArchError::duplicate("model", name, loc));
        }
        let id = self.models.next_id();
        self.by_name.insert(name.to_string(), id);
        self.models.alloc(Model {
            id,
            name: name.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            never_prune: false,
            pb_types: Vec::new(),
            loc: loc.clone(),
        });
        Ok(id)
    }

    /// Returns the model with the given ID.
    pub fn get_model(&self, id: ModelId) -> &Model {
        &self.models[id]
    }

    /// Returns the model with the given ID mutably.
    pub fn get_model_mut(&mut self, id: ModelId) -> &mut Model {
        &mut self.models[id]
    }

    /// Looks a model up by name.
    pub fn get_model_by_name(&self, name: &str) -> Option<ModelId> {
        self.by_name.get(name).copied()
    }

    /// Returns `true` for the four built-in models.
    pub fn is_library_model(&self, id: ModelId) -> bool {
        id.index() < Self::NUM_LIBRARY_MODELS
    }

    /// Iterates over the built-in models.
    pub fn library_models(&self) -> impl Iterator<Item = &Model> {
        self.models.values().take(Self::NUM_LIBRARY_MODELS)
    }

    /// Iterates over user models in creation order.
    pub fn user_models(&self) -> impl Iterator<Item = &Model> {
        self.models.values().skip(Self::NUM_LIBRARY_MODELS)
    }

    /// IDs of user models in creation order.
    pub fn user_model_ids(&self) -> impl Iterator<Item = ModelId> {
        self.models.ids().skip(Self::NUM_LIBRARY_MODELS)
    }

    /// Iterates over every model, built-ins first.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Total number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always `false`: the built-ins are always present.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn library_port(name: &str, direction: PortDirection) -> ModelPort {
    ModelPort {
        size: 1,
        min_size: Some(1),
        ..ModelPort::new(name, direction)
    }
}

fn builtin_models() -> [(&'static str, Vec<ModelPort>, Vec<ModelPort>); 4] {
    use PortDirection::{Input, Output};

    let inpad = library_port("inpad", Output);
    let outpad = library_port("outpad", Input);

    let d = ModelPort {
        clock: Some("clk".to_string()),
        ..library_port("D", Input)
    };
    let clk = ModelPort {
        is_clock: true,
        ..library_port("clk", Input)
    };
    let q = ModelPort {
        clock: Some("clk".to_string()),
        ..library_port("Q", Output)
    };

    let lut_in = ModelPort {
        combinational_sink_ports: vec!["out".to_string()],
        ..library_port("in", Input)
    };
    let lut_out = library_port("out", Output);

    [
        (".input", vec![], vec![inpad]),
        (".output", vec![outpad], vec![]),
        (".latch", vec![d, clk], vec![q]),
        (".names", vec![lut_in], vec![lut_out]),
    ]
}

/// Strips a leading `.subckt ` from a `blif_model` value.
pub fn strip_subckt(blif_model: &str) -> &str {
    blif_model.strip_prefix(".subckt ").unwrap_or(blif_model)
}
