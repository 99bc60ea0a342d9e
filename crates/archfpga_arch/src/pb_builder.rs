//! Builds pb_type hierarchies from `<pb_type>` nodes.

use crate::annotation::Annotation;
use crate::check::check_leaf_pb_model_timing_consistency;
use crate::class_expand::{expand_lut, expand_memory};
use crate::codes;
use crate::ids::{ModeId, PbTypeId};
use crate::model::ModelLibrary;
use crate::pb_type::{
    Interconnect, InterconnectKind, Metadata, Mode, PbClass, PbType, PbTypeArena, Port,
};
use crate::report::Reporter;
use crate::types::{PortDirection, PortEquivalence};
use archfpga_common::{ArchError, ArchResult};
use archfpga_tree::ArchNode;
use std::collections::BTreeSet;

/// Reads `<metadata><meta name="k">v</meta></metadata>` under `node`.
pub fn parse_metadata(node: &ArchNode) -> ArchResult<Metadata> {
    let mut metadata = Metadata::new();
    if let Some(list) = node.optional_child("metadata")? {
        list.expect_only_children(&["meta"])?;
        for meta in &list.children {
            meta.expect_only_attributes(&["name"])?;
            metadata
                .entry(meta.required_attr("name")?.to_string())
                .or_default()
                .push(meta.text_or_empty().to_string());
        }
    }
    Ok(metadata)
}

/// Recursive pb_type reader.
///
/// Leaves are checked against their model when timing checks are enabled,
/// then expanded if they carry the `lut` or `memory` class.
pub struct PbTypeBuilder<'a> {
    arena: &'a mut PbTypeArena,
    library: &'a ModelLibrary,
    reporter: &'a Reporter<'a>,
}

impl<'a> PbTypeBuilder<'a> {
    /// Creates a builder that allocates into `arena`.
    pub fn new(
        arena: &'a mut PbTypeArena,
        library: &'a ModelLibrary,
        reporter: &'a Reporter<'a>,
    ) -> Self {
        Self {
            arena,
            library,
            reporter,
        }
    }

    /// Builds the root pb_type of a complex block.
    pub fn build_root(&mut self, node: &ArchNode) -> ArchResult<PbTypeId> {
        node.expect_only_attributes(&["name"])?;
        self.build_pb_type(node, None)
    }

    fn build_pb_type(
        &mut self,
        node: &ArchNode,
        parent_mode: Option<ModeId>,
    ) -> ArchResult<PbTypeId> {
        let is_root = parent_mode.is_none();
        let is_leaf = node.attribute("blif_model").is_some();
        if is_root && is_leaf {
            return Err(ArchError::malformed(
                "A complex block's top-level pb_type cannot be a primitive",
                &node.loc,
            ));
        }

        let mut expected = vec!["input", "output", "clock", "power", "metadata"];
        if is_leaf {
            expected.extend(Annotation::LEAF_ELEMENTS);
        } else {
            expected.extend(["mode", "model", "pb_type", "interconnect"]);
            if is_root {
                expected.extend(["fc", "pinlocations", "switchblock_locations"]);
            }
        }
        node.expect_only_children(&expected)?;

        let name = node.required_attr("name")?.to_string();
        let (num_pb, depth) = match parent_mode {
            None => (1, 0),
            Some(mode) => {
                node.expect_only_attributes(&["name", "num_pb", "blif_model", "class"])?;
                let num_pb: i64 = node.required_parse("num_pb")?;
                let num_pb = positive_u32(num_pb).ok_or_else(|| {
                    ArchError::shape(
                        format!("Invalid num_pb {num_pb} for pb_type '{name}'"),
                        &node.loc,
                    )
                })?;
                let parent = self.arena.mode(mode).parent;
                (num_pb, self.arena.pb_type(parent).depth + 1)
            }
        };

        let class = match node.attribute("class") {
            None => PbClass::None,
            Some(value) => PbClass::parse(value, &name, &node.loc)?,
        };
        if class != PbClass::None && !is_leaf {
            let declared = node.required_attr("class")?;
            return Err(ArchError::malformed(
                format!("pb_type '{name}' has class '{declared}' but no blif_model"),
                &node.loc,
            ));
        }

        let num_inputs = node.count_children("input");
        let num_outputs = node.count_children("output");
        if matches!(class, PbClass::Lut | PbClass::Latch) && (num_inputs != 1 || num_outputs != 1) {
            let kind = if class == PbClass::Lut { "LUT" } else { "Latch" };
            return Err(ArchError::shape(
                format!(
                    "{kind} primitives must contain exactly one input port and one output port. Found '{num_inputs}' input port(s) and '{num_outputs}' output port(s) for '{name}'"
                ),
                &node.loc,
            ));
        }

        let ports = process_ports(node, &name, class, is_root)?;
        let mut pb_type = PbType {
            id: PbTypeId::from_raw(0),
            name,
            num_pb,
            blif_model: node.attribute("blif_model").map(str::to_string),
            model: None,
            class,
            ports,
            modes: Vec::new(),
            annotations: Vec::new(),
            parent_mode,
            depth,
            num_input_pins: 0,
            num_output_pins: 0,
            num_clock_pins: 0,
            metadata: parse_metadata(node)?,
            loc: node.loc.clone(),
        };
        pb_type.recount_pins();

        if is_leaf {
            let clocks = pb_type.clock_port_names();
            let mut annotations = Vec::new();
            for element in Annotation::LEAF_ELEMENTS {
                for child in node.children_named(element) {
                    annotations.push(Annotation::parse(child, &pb_type.name, &clocks)?);
                }
            }
            pb_type.annotations = annotations;
            if self.reporter.timing_enabled() {
                check_leaf_pb_model_timing_consistency(&pb_type, self.library, self.reporter)?;
            }
        }

        let id = self.arena.add_pb_type(pb_type);
        match class {
            PbClass::Lut => expand_lut(self.arena, id)?,
            PbClass::Memory => expand_memory(self.arena, id)?,
            _ if is_leaf => {}
            _ => self.process_modes(node, id)?,
        }
        Ok(id)
    }

    fn process_modes(&mut self, node: &ArchNode, parent: PbTypeId) -> ArchResult<()> {
        if node.count_children("mode") == 0 {
            return self.process_mode(node, parent, true);
        }
        let mut names = BTreeSet::new();
        for mode in node.children_named("mode") {
            let name = mode.required_attr("name")?;
            if !names.insert(name) {
                let scoped = format!("{}.{name}", self.arena.pb_type(parent).name);
                return Err(ArchError::duplicate("mode", scoped, &mode.loc));
            }
            self.process_mode(mode, parent, false)?;
        }
        Ok(())
    }

    /// Reads one mode. An implied mode is read from the pb_type node itself.
    fn process_mode(&mut self, node: &ArchNode, parent: PbTypeId, implied: bool) -> ArchResult<()> {
        let parent_pb = self.arena.pb_type(parent);
        let inherited = parent_pb
            .parent_mode
            .is_some_and(|m| self.arena.mode(m).disable_packing);
        let (name, metadata) = if implied {
            ("default".to_string(), Metadata::new())
        } else {
            node.expect_only_attributes(&["name", "disable_packing"])?;
            node.expect_only_children(&["pb_type", "interconnect", "metadata"])?;
            (node.required_attr("name")?.to_string(), parse_metadata(node)?)
        };
        let disable_packing = node.bool_attr("disable_packing", inherited)?;
        if disable_packing {
            self.reporter
                .emit(codes::packing_disabled(&parent_pb.name, &name, &node.loc))?;
        }

        let mode = self.arena.add_mode(Mode {
            id: ModeId::from_raw(0),
            name,
            index: 0,
            parent,
            children: Vec::new(),
            interconnects: Vec::new(),
            disable_packing,
            metadata,
            loc: node.loc.clone(),
        });

        let mut names = BTreeSet::new();
        for child in node.children_named("pb_type") {
            let id = self.build_pb_type(child, Some(mode))?;
            let child_name = &self.arena.pb_type(id).name;
            if !names.insert(child_name.clone()) {
                let scoped = format!("{}.{child_name}", self.arena.mode(mode).name);
                return Err(ArchError::duplicate("pb_type", scoped, &child.loc));
            }
            self.arena.attach_child(mode, id);
        }

        let interconnects =
            process_interconnect(node.single_child("interconnect")?, &self.arena.mode(mode).name)?;
        self.arena.mode_mut(mode).interconnects = interconnects;
        Ok(())
    }
}

/// Converts a parsed count to `u32`, rejecting zero, negatives and values
/// that do not fit.
pub(crate) fn positive_u32(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|&v| v > 0)
}

fn process_ports(
    node: &ArchNode,
    pb_name: &str,
    class: PbClass,
    is_root: bool,
) -> ArchResult<Vec<Port>> {
    let mut ports = Vec::new();
    let mut names = BTreeSet::new();
    let mut total_pins: u32 = 0;
    for element in ["input", "output", "clock"] {
        for (by_type, child) in node.children_named(element).enumerate() {
            let mut port = process_port(child, class, is_root)?;
            if !names.insert(port.name.clone()) {
                let scoped = format!("{pb_name}.{}", port.name);
                return Err(ArchError::duplicate("port", scoped, &child.loc));
            }
            total_pins = total_pins.checked_add(port.num_pins).ok_or_else(|| {
                ArchError::shape(
                    format!("Too many pins in pb_type '{pb_name}'"),
                    &child.loc,
                )
            })?;
            port.index = ports.len();
            port.port_index_by_type = by_type;
            ports.push(port);
        }
    }
    Ok(ports)
}

fn process_port(node: &ArchNode, class: PbClass, is_root: bool) -> ArchResult<Port> {
    let element = node.name.as_str();
    let mut allowed = vec!["name", "num_pins", "port_class"];
    if is_root {
        allowed.push("equivalent");
        if element != "output" {
            allowed.push("is_non_clock_global");
        }
    }
    node.expect_only_attributes(&allowed)?;
    node.expect_only_children(&["power"])?;

    let name = node.required_attr("name")?.to_string();
    let port_class = node.attribute("port_class").map(str::to_string);
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

    let required_class = match (class, element) {
        (PbClass::Lut, "input") => Some("lut_in"),
        (PbClass::Lut, "output") => Some("lut_out"),
        (PbClass::Latch, "input") => Some("D"),
        (PbClass::Latch, "output") => Some("Q"),
        (PbClass::Latch, "clock") => Some("clock"),
        _ => None,
    };
    if let Some(required) = required_class {
        if port_class.as_deref() != Some(required) {
            return Err(ArchError::shape(
                format!(
                    "The {element} port of {class:?} primitives must have a port class named \"{required}\"."
                ),
                &node.loc,
            ));
        }
    }
    let single_pin = matches!(
        (class, element),
        (PbClass::Lut, "output") | (PbClass::Latch, _)
    );
    if single_pin && num_pins != 1 {
        return Err(ArchError::shape(
            format!(
                "The {element} port of {class:?} primitives must have exactly one pin. Found {num_pins}."
            ),
            &node.loc,
        ));
    }

    Ok(Port {
        name,
        direction: if element == "output" {
            PortDirection::Output
        } else {
            PortDirection::Input
        },
        is_clock,
        is_non_clock_global,
        num_pins,
        equivalence,
        port_class,
        absolute_first_pin_index: 0,
        index: 0,
        port_index_by_type: 0,
        model_port: None,
        loc: node.loc.clone(),
    })
}

/// Reads `<complete>`, `<direct>` and `<mux>` entries, in that order.
fn process_interconnect(node: &ArchNode, mode_name: &str) -> ArchResult<Vec<Interconnect>> {
    node.expect_only_children(&["complete", "direct", "mux"])?;
    let mut names = BTreeSet::new();
    let mut interconnects = Vec::new();
    for kind in [
        InterconnectKind::Complete,
        InterconnectKind::Direct,
        InterconnectKind::Mux,
    ] {
        for child in node.children_named(kind.element()) {
            child.expect_only_attributes(&["name", "input", "output"])?;
            let mut expected = Annotation::INTERCONNECT_ELEMENTS.to_vec();
            expected.push("metadata");
            child.expect_only_children(&expected)?;

            let name = child.required_attr("name")?.to_string();
            if !names.insert(name.clone()) {
                let scoped = format!("{mode_name}.{name}");
                return Err(ArchError::duplicate("interconnect", scoped, &child.loc));
            }
            let mut annotations = Vec::new();
            for element in Annotation::INTERCONNECT_ELEMENTS {
                for a in child.children_named(element) {
                    annotations.push(Annotation::parse(a, &name, &[])?);
                }
            }
            interconnects.push(Interconnect {
                name,
                kind,
                input: child.required_attr("input")?.to_string(),
                output: child.required_attr("output")?.to_string(),
                annotations,
                infer_annotations: false,
                metadata: parse_metadata(child)?,
                loc: child.loc.clone(),
            });
        }
    }
    Ok(interconnects)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use archfpga_config::ArchConfig;
    use archfpga_diagnostics::DiagnosticSink;

    pub(crate) fn pin(element: &str, name: &str, num_pins: u32) -> ArchNode {
        ArchNode::new(element)
            .attr("name", name)
            .attr("num_pins", num_pins)
    }

    pub(crate) fn direct(name: &str, input: &str, output: &str) -> ArchNode {
        ArchNode::new("direct")
            .attr("name", name)
            .attr("input", input)
            .attr("output", output)
    }

    pub(crate) fn ff() -> ArchNode {
        ArchNode::new("pb_type")
            .attr("name", "ff")
            .attr("num_pb", 1)
            .attr("blif_model", ".latch")
            .attr("class", "flipflop")
            .child(pin("input", "D", 1).attr("port_class", "D"))
            .child(pin("output", "Q", 1).attr("port_class", "Q"))
            .child(pin("clock", "clk", 1).attr("port_class", "clock"))
            .child(
                ArchNode::new("T_setup")
                    .attr("value", "66e-12")
                    .attr("port", "ff.D")
                    .attr("clock", "clk"),
            )
            .child(
                ArchNode::new("T_clock_to_Q")
                    .attr("max", "124e-12")
                    .attr("port", "ff.Q")
                    .attr("clock", "clk"),
            )
    }

    pub(crate) fn lut4() -> ArchNode {
        ArchNode::new("pb_type")
            .attr("name", "lut4")
            .attr("num_pb", 1)
            .attr("blif_model", ".names")
            .attr("class", "lut")
            .child(pin("input", "in", 4).attr("port_class", "lut_in"))
            .child(pin("output", "out", 1).attr("port_class", "lut_out"))
            .child(
                ArchNode::new("delay_matrix")
                    .attr("type", "max")
                    .attr("in_port", "lut4.in")
                    .attr("out_port", "lut4.out")
                    .text("1e-10 1e-10 1e-10 1e-10"),
            )
    }

    pub(crate) fn clb() -> ArchNode {
        ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(pin("input", "I", 4).attr("equivalent", "full"))
            .child(pin("output", "O", 1))
            .child(pin("clock", "clk", 1))
            .child(lut4())
            .child(ff())
            .child(
                ArchNode::new("interconnect")
                    .child(direct("in", "clb.I", "lut4.in"))
                    .child(direct("lut2ff", "lut4.out", "ff.D"))
                    .child(direct("clk", "clb.clk", "ff.clk"))
                    .child(direct("out", "ff.Q", "clb.O")),
            )
    }

    fn build(node: &ArchNode) -> (ArchResult<(PbTypeArena, PbTypeId)>, DiagnosticSink) {
        let config = ArchConfig::default();
        let sink = DiagnosticSink::new();
        let library = ModelLibrary::new();
        let reporter = Reporter::new(&config, &sink);
        let mut arena = PbTypeArena::new();
        let result = PbTypeBuilder::new(&mut arena, &library, &reporter).build_root(node);
        (result.map(|root| (arena, root)), sink)
    }

    #[test]
    fn builds_implied_mode_hierarchy() {
        let (result, sink) = build(&clb());
        let (arena, root) = result.unwrap();
        let clb = arena.pb_type(root);
        assert_eq!((clb.num_pb, clb.depth), (1, 0));
        assert_eq!(clb.num_pins(), 6);
        assert_eq!(clb.ports[0].equivalence, PortEquivalence::Full);
        assert_eq!(clb.modes.len(), 1);
        let mode = arena.mode(clb.modes[0]);
        assert_eq!(mode.name, "default");
        assert_eq!(mode.children.len(), 2);
        assert_eq!(mode.interconnects.len(), 4);

        let lut = arena.pb_type(mode.children[0]);
        assert_eq!(lut.depth, 1);
        assert_eq!(lut.modes.len(), 2);
        let ff = arena.pb_type(mode.children[1]);
        assert!(ff.is_leaf());
        assert_eq!(ff.annotations.len(), 2);
        assert!(ff.annotations[0].is_setup_or_hold());
        assert!(ff.annotations[1].is_clock_to_q());
        assert_eq!(arena.leaves(root).len(), 2);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn interconnect_read_by_kind() {
        let node = ArchNode::new("interconnect")
            .child(direct("d", "a.x", "b.y"))
            .child(
                ArchNode::new("mux")
                    .attr("name", "m")
                    .attr("input", "a.x a.z")
                    .attr("output", "b.y"),
            )
            .child(
                ArchNode::new("complete")
                    .attr("name", "c")
                    .attr("input", "a.x")
                    .attr("output", "b.y")
                    .child(
                        ArchNode::new("pack_pattern")
                            .attr("name", "chain")
                            .attr("in_port", "a.x")
                            .attr("out_port", "b.y"),
                    ),
            );
        let list = process_interconnect(&node, "m0").unwrap();
        let names: Vec<_> = list.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["c", "d", "m"]);
        assert_eq!(list[0].annotations.len(), 1);

        let dup = ArchNode::new("interconnect")
            .child(direct("d", "a.x", "b.y"))
            .child(direct("d", "a.x", "b.y"));
        let err = process_interconnect(&dup, "m0").unwrap_err();
        assert!(matches!(err, ArchError::Duplicate { what: "interconnect", .. }));
        assert_eq!(err.message(), "duplicate interconnect 'm0.d'");
    }

    #[test]
    fn lut_needs_one_input_and_output() {
        let bad = lut4().child(pin("input", "extra", 1).attr("port_class", "lut_in"));
        let root = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(bad)
            .child(ArchNode::new("interconnect"));
        let (result, _) = build(&root);
        let err = result.unwrap_err();
        assert!(err.message().starts_with("LUT primitives must contain exactly one input port"));
        assert!(err
            .message()
            .contains("Found '2' input port(s) and '1' output port(s) for 'lut4'"));
    }

    #[test]
    fn port_rules() {
        let wrong_class = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(
                ArchNode::new("pb_type")
                    .attr("name", "lut")
                    .attr("num_pb", 1)
                    .attr("blif_model", ".names")
                    .attr("class", "lut")
                    .child(pin("input", "in", 4))
                    .child(pin("output", "out", 1).attr("port_class", "lut_out")),
            )
            .child(ArchNode::new("interconnect"));
        assert!(matches!(build(&wrong_class).0, Err(ArchError::Shape { .. })));

        let zero = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(pin("input", "I", 0))
            .child(ArchNode::new("interconnect"));
        let err = build(&zero).0.unwrap_err();
        assert_eq!(err.message(), "Invalid number of pins 0 for input port.");

        let clock_global = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(pin("clock", "clk", 1).attr("is_non_clock_global", "true"))
            .child(ArchNode::new("interconnect"));
        assert!(build(&clock_global).0.is_err());

        let dup = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(pin("input", "I", 1))
            .child(pin("output", "I", 1))
            .child(ArchNode::new("interconnect"));
        let err = build(&dup).0.unwrap_err();
        assert!(matches!(err, ArchError::Duplicate { what: "port", .. }));
        assert_eq!(err.message(), "duplicate port 'clb.I'");
    }

    #[test]
    fn oversized_counts_rejected() {
        let mut many = ff();
        many.attributes[1].1 = "4294967296".to_string();
        let root = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(many)
            .child(ArchNode::new("interconnect"));
        let err = build(&root).0.unwrap_err();
        assert!(matches!(err, ArchError::Shape { .. }));
        assert_eq!(err.message(), "Invalid num_pb 4294967296 for pb_type 'ff'");

        let wide = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(pin("input", "I", u32::MAX))
            .child(pin("output", "O", 1))
            .child(ArchNode::new("interconnect"));
        let err = build(&wide).0.unwrap_err();
        assert_eq!(err.message(), "Too many pins in pb_type 'clb'");

        assert_eq!(positive_u32(7), Some(7));
        assert_eq!(positive_u32(0), None);
        assert_eq!(positive_u32(-3), None);
        assert_eq!(positive_u32(1 << 32), None);
    }

    #[test]
    fn equivalence_only_on_root() {
        let root = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(
                ArchNode::new("pb_type")
                    .attr("name", "inner")
                    .attr("num_pb", 2)
                    .child(pin("input", "I", 2).attr("equivalent", "full"))
                    .child(ArchNode::new("interconnect")),
            )
            .child(ArchNode::new("interconnect"));
        assert!(matches!(build(&root).0, Err(ArchError::Malformed { .. })));
    }

    #[test]
    fn mode_rules() {
        let mode = |name: &str| {
            ArchNode::new("mode")
                .attr("name", name)
                .child(ArchNode::new("interconnect"))
        };
        let dup = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(mode("a"))
            .child(mode("a"));
        let err = build(&dup).0.unwrap_err();
        assert!(matches!(err, ArchError::Duplicate { what: "mode", .. }));
        assert_eq!(err.message(), "duplicate mode 'clb.a'");

        let missing = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(ArchNode::new("mode").attr("name", "a"));
        assert!(build(&missing).0.is_err());

        let dup_child = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(ff())
            .child(ff())
            .child(ArchNode::new("interconnect"));
        let err = build(&dup_child).0.unwrap_err();
        assert!(matches!(err, ArchError::Duplicate { what: "pb_type", .. }));
        assert_eq!(err.message(), "duplicate pb_type 'default.ff'");
    }

    #[test]
    fn disable_packing_is_inherited_and_reported() {
        let inner = ArchNode::new("pb_type")
            .attr("name", "ble")
            .attr("num_pb", 1)
            .child(ArchNode::new("mode").attr("name", "m").child(ArchNode::new("interconnect")));
        let root = ArchNode::new("pb_type").attr("name", "clb").child(
            ArchNode::new("mode")
                .attr("name", "off")
                .attr("disable_packing", "true")
                .child(inner)
                .child(ArchNode::new("interconnect")),
        );
        let (result, sink) = build(&root);
        let (arena, root) = result.unwrap();
        let outer = arena.mode(arena.pb_type(root).modes[0]);
        assert!(outer.disable_packing);
        let ble = arena.pb_type(outer.children[0]);
        assert!(arena.mode(ble.modes[0]).disable_packing);
        assert_eq!(sink.count_code(codes::I303), 2);
    }

    #[test]
    fn metadata_is_kept() {
        let root = clb().child(
            ArchNode::new("metadata")
                .child(ArchNode::new("meta").attr("name", "fasm_prefix").text("CLB"))
                .child(ArchNode::new("meta").attr("name", "fasm_prefix").text("CLB_ALT")),
        );
        let (arena, root) = build(&root).0.unwrap();
        assert_eq!(
            arena.pb_type(root).metadata["fasm_prefix"],
            vec!["CLB".to_string(), "CLB_ALT".to_string()]
        );
    }

    #[test]
    fn unknown_class_and_orphan_class() {
        let root = ArchNode::new("pb_type")
            .attr("name", "clb")
            .child(
                ArchNode::new("pb_type")
                    .attr("name", "x")
                    .attr("num_pb", 1)
                    .attr("blif_model", ".names")
                    .attr("class", "dsp")
                    .child(pin("input", "in", 1))
                    .child(pin("output", "out", 1)),
            )
            .child(ArchNode::new("interconnect"));
        let err = build(&root).0.unwrap_err();
        assert_eq!(err.message(), "Unknown class 'dsp' in pb_type 'x'");
    }
}
