//! Expansion of `lut` and `memory` class primitives into canonical
//! mode hierarchies.
//!
//! A LUT becomes a pb_type with a route-through `wire` mode and a mode
//! holding one LUT child. A memory becomes a pb_type whose single mode
//! replicates a one-bit-wide slice once per data bit.

use crate::ids::{ModeId, PbTypeId};
use crate::pb_type::{
    Interconnect, InterconnectKind, Metadata, Mode, PbType, PbTypeArena, Port,
};
use crate::types::{PortDirection, PortEquivalence};
use archfpga_common::{ArchError, ArchResult};

/// Copies `parent` as a one-instance primitive named `name`.
fn default_child(parent: &PbType, name: &str) -> PbType {
    let ports = parent
        .ports
        .iter()
        .map(|p| Port {
            equivalence: PortEquivalence::None,
            is_non_clock_global: false,
            ..p.clone()
        })
        .collect();
    let mut child = PbType {
        name: name.to_string(),
        num_pb: 1,
        ports,
        modes: Vec::new(),
        annotations: Vec::new(),
        parent_mode: None,
        depth: parent.depth + 1,
        metadata: Metadata::new(),
        ..parent.clone()
    };
    child.recount_pins();
    child
}

fn synthesized_mode(name: &str, parent: &PbType) -> Mode {
    Mode {
        id: ModeId::from_raw(0),
        name: name.to_string(),
        index: 0,
        parent: parent.id,
        children: Vec::new(),
        interconnects: Vec::new(),
        disable_packing: false,
        metadata: Metadata::new(),
        loc: parent.loc.clone(),
    }
}

fn strip_primitive(pb: &mut PbType) {
    pb.blif_model = None;
    pb.model = None;
    pb.annotations.clear();
}

/// Expands a `class="lut"` pb_type in place.
pub fn expand_lut(arena: &mut PbTypeArena, id: PbTypeId) -> ArchResult<()> {
    let parent = arena.pb_type(id).clone();
    let (input, output) = match parent.ports.as_slice() {
        [a, b] if a.direction == PortDirection::Input && b.direction == PortDirection::Output => {
            (a.name.clone(), b.name.clone())
        }
        [a, b] if a.direction == PortDirection::Output && b.direction == PortDirection::Input => {
            (b.name.clone(), a.name.clone())
        }
        _ => {
            return Err(ArchError::shape(
                format!(
                    "LUT pb_type '{}' must have exactly one input and one output port",
                    parent.name
                ),
                &parent.loc,
            ))
        }
    };
    let pb = &parent.name;
    let child_name = if pb == "lut" { "lut_child" } else { "lut" };

    let mut wire = synthesized_mode("wire", &parent);
    wire.interconnects.push(Interconnect {
        name: format!("complete:{pb}"),
        kind: InterconnectKind::Complete,
        input: format!("{pb}.{input}"),
        output: format!("{pb}.{output}"),
        annotations: parent.annotations.clone(),
        infer_annotations: false,
        metadata: Metadata::new(),
        loc: parent.loc.clone(),
    });
    arena.add_mode(wire);

    let mut lut = synthesized_mode(pb, &parent);
    lut.interconnects = vec![
        Interconnect::direct(
            format!("direct:{pb}"),
            format!("{pb}.{input}"),
            format!("{child_name}.{input}"),
            &parent.loc,
        ),
        Interconnect::direct(
            format!("direct:{pb}"),
            format!("{child_name}.{output}"),
            format!("{pb}.{output}"),
            &parent.loc,
        ),
    ];
    let lut_mode = arena.add_mode(lut);

    let mut child = default_child(&parent, child_name);
    for port in &mut child.ports {
        if port.direction == PortDirection::Input {
            port.equivalence = PortEquivalence::Full;
        }
    }
    child.annotations = parent
        .annotations
        .iter()
        .map(|a| a.rewritten_for(child_name))
        .collect();
    let child = arena.add_pb_type(child);
    arena.attach_child(lut_mode, child);

    strip_primitive(arena.pb_type_mut(id));
    Ok(())
}

fn is_data_port(port: &Port) -> bool {
    port.port_class
        .as_deref()
        .is_some_and(|class| class.starts_with("data"))
}

/// Expands a `class="memory"` pb_type in place.
pub fn expand_memory(arena: &mut PbTypeArena, id: PbTypeId) -> ArchResult<()> {
    let parent = arena.pb_type(id).clone();
    let mut width: Option<u32> = None;
    for port in parent.ports.iter().filter(|p| is_data_port(p)) {
        match width {
            None => width = Some(port.num_pins),
            Some(w) if w != port.num_pins => {
                return Err(ArchError::shape(
                    format!(
                        "memory {} has inconsistent number of data bits {w} and {}",
                        parent.name, port.num_pins
                    ),
                    &port.loc,
                ))
            }
            Some(_) => {}
        }
    }
    let num_pb = width.ok_or_else(|| {
        ArchError::shape(
            format!("memory {} has no data ports", parent.name),
            &parent.loc,
        )
    })?;

    let pb = &parent.name;
    let child_name = if pb == "memory_slice" {
        "memory_slice_1bit"
    } else {
        "memory_slice"
    };

    let mut mode = synthesized_mode(child_name, &parent);
    let mut next = 0usize;
    for port in &parent.ports {
        let name = &port.name;
        if is_data_port(port) {
            let bus = format!("{child_name}[{}:0].{name}", num_pb - 1);
            let local = format!("{pb}.{name}");
            let (input, output) = match port.direction {
                PortDirection::Input => (local, bus),
                PortDirection::Output => (bus, local),
            };
            mode.interconnects.push(Interconnect::direct(
                format!("direct{next}"),
                input,
                output,
                &parent.loc,
            ));
            next += 1;
        } else {
            for j in 0..num_pb {
                let slice = format!("{child_name}[{j}:{j}].{name}");
                let local = format!("{pb}.{name}");
                let (input, output) = match port.direction {
                    PortDirection::Input => (local, slice),
                    PortDirection::Output => (slice, local),
                };
                mode.interconnects.push(Interconnect::direct(
                    format!("direct{next}_{j}"),
                    input,
                    output,
                    &parent.loc,
                ));
                next += 1;
            }
        }
    }
    let mode = arena.add_mode(mode);

    let mut child = default_child(&parent, child_name);
    child.num_pb = num_pb;
    for port in child.ports.iter_mut().filter(|p| is_data_port(p)) {
        port.num_pins = 1;
    }
    child.recount_pins();
    let child = arena.add_pb_type(child);
    arena.attach_child(mode, child);

    strip_primitive(arena.pb_type_mut(id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, AnnotationKind};
    use crate::pb_type::tests::{pb, port};
    use crate::pb_type::PbClass;
    use archfpga_common::SourceLoc;

    fn lut_pb(name: &str) -> PbType {
        let mut input = port("in", PortDirection::Input, 6);
        input.port_class = Some("lut_in".into());
        let mut output = port("out", PortDirection::Output, 1);
        output.port_class = Some("lut_out".into());
        let mut p = pb(name, vec![input, output]);
        p.class = PbClass::Lut;
        p.blif_model = Some(".names".into());
        p.annotations.push(Annotation {
            kind: AnnotationKind::DelayConstant {
                max: Some("2e-10".into()),
                min: None,
            },
            input_pins: Some(format!("{name}.in")),
            output_pins: Some(format!("{name}.out")),
            clock: None,
            loc: SourceLoc::UNKNOWN,
        });
        p
    }

    #[test]
    fn lut_expands_into_two_modes() {
        let mut arena = PbTypeArena::new();
        let id = arena.add_pb_type(lut_pb("lut6"));
        expand_lut(&mut arena, id).unwrap();

        let parent = arena.pb_type(id);
        assert_eq!(parent.modes.len(), 2);
        assert!(parent.blif_model.is_none() && parent.annotations.is_empty());

        let wire = arena.mode(parent.modes[0]);
        assert_eq!(wire.name, "wire");
        assert!(wire.children.is_empty());
        assert_eq!(wire.interconnects[0].name, "complete:lut6");
        assert_eq!(wire.interconnects[0].input, "lut6.in");
        assert_eq!(wire.interconnects[0].annotations.len(), 1);

        let lut = arena.mode(parent.modes[1]);
        assert_eq!(lut.name, "lut6");
        assert_eq!(lut.children.len(), 1);
        let links: Vec<_> = lut
            .interconnects
            .iter()
            .map(|i| (i.input.as_str(), i.output.as_str()))
            .collect();
        assert_eq!(links, vec![("lut6.in", "lut.in"), ("lut.out", "lut6.out")]);

        let child = arena.pb_type(lut.children[0]);
        assert_eq!(child.name, "lut");
        assert_eq!(child.depth, 1);
        assert_eq!(child.blif_model.as_deref(), Some(".names"));
        assert_eq!(child.ports[0].equivalence, PortEquivalence::Full);
        assert_eq!(child.ports[1].equivalence, PortEquivalence::None);
        assert_eq!(child.annotations[0].input_pins.as_deref(), Some("lut.in"));
        assert!(child.is_leaf());
    }

    #[test]
    fn lut_named_lut_gets_child_suffix() {
        let mut arena = PbTypeArena::new();
        let id = arena.add_pb_type(lut_pb("lut"));
        expand_lut(&mut arena, id).unwrap();
        let mode = arena.mode(arena.pb_type(id).modes[1]);
        assert_eq!(arena.pb_type(mode.children[0]).name, "lut_child");
    }

    fn memory(data_out: u32) -> PbType {
        let mut data_in = port("data_in", PortDirection::Input, 8);
        data_in.port_class = Some("data_in".into());
        let mut out = port("data_out", PortDirection::Output, data_out);
        out.port_class = Some("data_out".into());
        let mut p = pb(
            "mem",
            vec![port("addr", PortDirection::Input, 4), data_in, out],
        );
        p.class = PbClass::Memory;
        p.blif_model = Some(".subckt sp_ram".into());
        p
    }

    #[test]
    fn memory_slices_per_data_bit() {
        let mut arena = PbTypeArena::new();
        let id = arena.add_pb_type(memory(8));
        expand_memory(&mut arena, id).unwrap();

        let parent = arena.pb_type(id);
        assert_eq!(parent.modes.len(), 1);
        let mode = arena.mode(parent.modes[0]);
        assert_eq!(mode.name, "memory_slice");
        assert_eq!(mode.interconnects.len(), 10);
        assert_eq!(mode.interconnects[0].name, "direct0_0");
        assert_eq!(mode.interconnects[0].output, "memory_slice[0:0].addr");
        assert_eq!(mode.interconnects[7].name, "direct7_7");
        assert_eq!(mode.interconnects[8].name, "direct8");
        assert_eq!(mode.interconnects[8].output, "memory_slice[7:0].data_in");
        assert_eq!(mode.interconnects[9].input, "memory_slice[7:0].data_out");
        assert_eq!(mode.interconnects[9].output, "mem.data_out");
        assert!(mode.interconnects.iter().all(|i| i.infer_annotations));

        let child = arena.pb_type(mode.children[0]);
        assert_eq!(child.num_pb, 8);
        let widths: Vec<_> = child.ports.iter().map(|p| p.num_pins).collect();
        assert_eq!(widths, vec![4, 1, 1]);
        assert_eq!(child.num_input_pins, 5);
        assert_eq!(child.ports[2].absolute_first_pin_index, 5);
        assert!(parent.blif_model.is_none());
    }

    #[test]
    fn memory_widths_must_agree() {
        let mut arena = PbTypeArena::new();
        let id = arena.add_pb_type(memory(4));
        let err = expand_memory(&mut arena, id).unwrap_err();
        assert!(err.message().contains("inconsistent number of data bits 8 and 4"));
    }

    #[test]
    fn memory_without_data_ports_rejected() {
        let mut arena = PbTypeArena::new();
        let id = arena.add_pb_type(pb("mem", vec![port("addr", PortDirection::Input, 4)]));
        assert!(matches!(
            expand_memory(&mut arena, id),
            Err(ArchError::Shape { .. })
        ));
    }
}
