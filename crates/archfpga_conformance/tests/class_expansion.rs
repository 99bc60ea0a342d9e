//! LUT and memory class expansion observed through a full build.

use archfpga_arch::pb_type::{InterconnectKind, PbClass};
use archfpga_arch::{Architecture, ModelLibrary, PbTypeId, PortDirection};
use archfpga_conformance::{
    architecture, build, clb_block, clb_tile, k_lut_architecture, memory_block, memory_model,
    memory_tile,
};

fn find(arch: &Architecture, name: &str) -> PbTypeId {
    arch.pb_types
        .pb_types()
        .find(|pb| pb.name == name)
        .map(|pb| pb.id)
        .unwrap_or_else(|| panic!("no pb_type named {name}"))
}

#[test]
fn lut_round_trip() {
    let arch = build(&k_lut_architecture(6)).arch.unwrap();
    let lut = arch.pb_types.pb_type(find(&arch, "lut"));
    assert_eq!(lut.class, PbClass::Lut);
    assert!(lut.blif_model.is_none());
    assert!(lut.annotations.is_empty());
    assert_eq!(lut.modes.len(), 2);

    let wire = arch.pb_types.mode(lut.modes[0]);
    assert_eq!(wire.name, "wire");
    assert!(wire.children.is_empty());
    assert_eq!(wire.interconnects.len(), 1);
    assert_eq!(wire.interconnects[0].kind, InterconnectKind::Complete);
    assert_eq!(wire.interconnects[0].input, "lut.in");
    assert_eq!(wire.interconnects[0].output, "lut.out");

    let evaluate = arch.pb_types.mode(lut.modes[1]);
    assert_eq!(evaluate.name, "lut");
    assert_eq!(evaluate.children.len(), 1);
    assert_eq!(evaluate.interconnects.len(), 2);
    assert!(evaluate
        .interconnects
        .iter()
        .all(|ic| ic.kind == InterconnectKind::Direct));

    let child = arch.pb_types.pb_type(evaluate.children[0]);
    assert_eq!(child.name, "lut_child");
    assert_eq!(child.blif_model.as_deref(), Some(".names"));
    assert_eq!(child.model, Some(ModelLibrary::NAMES));
    let inputs: Vec<_> = child
        .ports
        .iter()
        .filter(|p| p.direction == PortDirection::Input)
        .map(|p| p.num_pins)
        .collect();
    let outputs: Vec<_> = child
        .ports
        .iter()
        .filter(|p| p.direction == PortDirection::Output)
        .map(|p| p.num_pins)
        .collect();
    assert_eq!(inputs, vec![6]);
    assert_eq!(outputs, vec![1]);
    assert_eq!(child.annotations.len(), 1);
    assert_eq!(child.annotations[0].input_pins.as_deref(), Some("lut_child.in"));
}

#[test]
fn names_model_widened_by_lut() {
    let arch = build(&k_lut_architecture(5)).arch.unwrap();
    let names = arch.models.get_model(ModelLibrary::NAMES);
    assert_eq!(names.pb_types.len(), 1);
    assert_eq!(names.find_input("in").unwrap().size, 5);
    assert_eq!(names.find_output("out").unwrap().size, 1);
}

#[test]
fn memory_slices_per_data_bit() {
    let root = architecture(
        [memory_model()],
        [memory_block(4, 8)],
        [memory_tile(4, 8)],
    );
    let result = build(&root);
    let arch = result.arch.unwrap();

    let ram = arch.pb_types.pb_type(find(&arch, "ram"));
    assert!(ram.blif_model.is_none());
    assert_eq!(ram.modes.len(), 1);
    let mode = arch.pb_types.mode(ram.modes[0]);
    assert_eq!(mode.name, "memory_slice");
    assert_eq!(mode.children.len(), 1);

    let slice = arch.pb_types.pb_type(mode.children[0]);
    assert_eq!(slice.num_pb, 8);
    let width = |name: &str| slice.find_port(name).map(|p| p.num_pins);
    assert_eq!(width("addr"), Some(4));
    assert_eq!(width("data_in"), Some(1));
    assert_eq!(width("data_out"), Some(1));

    // Two data buses collapse to one interconnect each; addr fans out per slice.
    assert_eq!(mode.interconnects.len(), 2 + 8);
    assert_eq!(mode.interconnects[0].name, "direct0_0");
    assert_eq!(mode.interconnects[0].output, "memory_slice[0:0].addr");
    assert_eq!(mode.interconnects[8].input, "ram.data_in");
    assert_eq!(mode.interconnects[8].output, "memory_slice[7:0].data_in");
    assert_eq!(mode.interconnects[9].input, "memory_slice[7:0].data_out");

    let model_id = arch.models.get_model_by_name("spram").unwrap();
    assert_eq!(slice.model, Some(model_id));
    let model = arch.models.get_model(model_id);
    assert_eq!(model.find_input("data_in").unwrap().size, 1);
    assert_eq!(model.find_input("addr").unwrap().size, 4);
    assert_eq!(result.warning_count, 3);
}

#[test]
fn memory_data_widths_must_agree() {
    let mut block = memory_block(4, 8);
    let ram = &mut block.children[3];
    ram.children[2].attributes[1].1 = "4".to_string();
    let root = architecture([memory_model()], [block], [memory_tile(4, 8)]);
    let err = build(&root).arch.unwrap_err();
    assert!(err
        .message()
        .contains("has inconsistent number of data bits 8 and 4"));
}

#[test]
fn lut_needs_one_input_and_one_output() {
    let mut block = clb_block(4);
    let lut = &mut block.children[3];
    let extra = archfpga_conformance::pin("input", "extra", 1).attr("port_class", "lut_in");
    lut.children.insert(1, extra);
    let err = build(&architecture([], [block], [clb_tile(4)])).arch.unwrap_err();
    assert!(err
        .message()
        .starts_with("LUT primitives must contain exactly one input port and one output port"));
}
