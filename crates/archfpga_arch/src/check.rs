//! Structural and timing consistency checks.
//!
//! Model checks run as each `<model>` is read, the leaf timing check as
//! each primitive pb_type is read, and the remaining passes once the tiles
//! and blocks are linked.

use crate::annotation::{Annotation, AnnotationKind};
use crate::codes;
use crate::ids::ModelId;
use crate::model::{strip_subckt, Model, ModelLibrary, ModelPort};
use crate::pb_type::{ModelPortRef, PbType, PbTypeArena};
use crate::report::Reporter;
use crate::tile::{LogicalBlockType, PhysicalTileType};
use crate::types::PortDirection;
use archfpga_common::{ArchError, ArchResult};
use std::collections::BTreeSet;

/// Every non-empty `clock` on a port of `model` must name a clock port of
/// the same model.
pub fn check_model_clocks(model: &Model) -> ArchResult<()> {
    for port in model.ports() {
        let Some(clock) = &port.clock else { continue };
        if !model.ports().any(|p| p.is_clock && &p.name == clock) {
            return Err(ArchError::unknown(
                format!(
                    "No matching clock port '{clock}' on model '{}', required for port '{}'",
                    model.name, port.name
                ),
                &port.loc,
            ));
        }
    }
    Ok(())
}

/// Outputs have no combinational sinks, and every sink of an input is a
/// non-clock output of the same model.
pub fn check_model_combinational_sinks(model: &Model) -> ArchResult<()> {
    for port in &model.inputs {
        for sink in &port.combinational_sink_ports {
            let Some(output) = model.find_output(sink) else {
                return Err(ArchError::unknown(
                    format!(
                        "No matching combinational sink port '{sink}' on model '{}', required for port '{}'",
                        model.name, port.name
                    ),
                    &port.loc,
                ));
            };
            if output.is_clock {
                return Err(ArchError::inconsistent(
                    format!(
                        "Combinational sink port '{sink}' of model '{}' is a clock and cannot be driven combinationally by port '{}'",
                        model.name, port.name
                    ),
                    &port.loc,
                ));
            }
        }
    }
    for port in &model.outputs {
        if !port.combinational_sink_ports.is_empty() {
            return Err(ArchError::malformed(
                "Model output ports can not have combinational sink ports",
                &port.loc,
            ));
        }
    }
    Ok(())
}

fn combinationally_connected(model: &Model) -> BTreeSet<&str> {
    model
        .ports()
        .flat_map(|p| p.combinational_sink_ports.iter().map(String::as_str))
        .collect()
}

/// Emits T301 for every model port without any timing relation.
pub fn warn_model_missing_timing(model: &Model, reporter: &Reporter) -> ArchResult<()> {
    let driven = combinationally_connected(model);
    for port in &model.inputs {
        if port.clock.is_none() && port.combinational_sink_ports.is_empty() && !port.is_clock {
            reporter.emit(codes::untimed_model_input(&model.name, &port.name, &port.loc))?;
        }
    }
    for port in &model.outputs {
        if port.clock.is_none() && !driven.contains(port.name.as_str()) {
            reporter.emit(codes::untimed_model_output(&model.name, &port.name, &port.loc))?;
        }
    }
    Ok(())
}

fn names_port(pins: &[String], port: &str) -> bool {
    pins.iter().any(|p| p == port)
}

fn has_sequential(pb_type: &PbType, port: &str, pick: fn(&Annotation) -> bool) -> ArchResult<bool> {
    for annotation in pb_type.annotations.iter().filter(|a| a.clock.is_some() && pick(a)) {
        if names_port(&annotation.input_ports()?, port) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn has_combinational(pb_type: &PbType, input: &str, output: &str) -> ArchResult<bool> {
    for annotation in pb_type.annotations.iter().filter(|a| a.is_combinational_delay()) {
        if names_port(&annotation.input_ports()?, input)
            && names_port(&annotation.output_ports()?, output)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Cross-checks a primitive's timing annotations against its model.
///
/// Every annotation must agree with the model's clocks and combinational
/// paths. Every timing relation of the model must be annotated; a missing
/// annotation is a T300 warning on a built-in model and an error otherwise.
pub fn check_leaf_pb_model_timing_consistency(
    pb_type: &PbType,
    library: &ModelLibrary,
    reporter: &Reporter,
) -> ArchResult<()> {
    let Some(blif_model) = pb_type.blif_model.as_deref() else {
        return Ok(());
    };
    let model_name = strip_subckt(blif_model);
    let model_id = library.get_model_by_name(model_name).ok_or_else(|| {
        ArchError::unknown(
            format!(
                "Unable to find model for blif_model '{blif_model}' found on pb_type '{}'",
                pb_type.name
            ),
            &pb_type.loc,
        )
    })?;
    let model = library.get_model(model_id);

    for annotation in &pb_type.annotations {
        check_annotation_against_model(annotation, model)?;
    }

    let driven = combinationally_connected(model);
    let missing = |detail: String, port: &ModelPort| -> ArchResult<()> {
        let message = format!(
            "<pb_type> '{}' timing-annotation/<model> mismatch on port '{}' of model '{}', {detail}",
            pb_type.name, port.name, model.name
        );
        if library.is_library_model(model_id) {
            reporter.emit(codes::missing_library_timing(message, &pb_type.loc))
        } else {
            Err(ArchError::inconsistent(message, &pb_type.loc))
        }
    };

    for port in model.ports() {
        let sequential = port.clock.is_some();
        let is_driven = driven.contains(port.name.as_str());
        if !sequential && port.combinational_sink_ports.is_empty() && !is_driven {
            continue;
        }
        let setup_or_hold = || has_sequential(pb_type, &port.name, Annotation::is_setup_or_hold);
        let clock_to_q = || has_sequential(pb_type, &port.name, Annotation::is_clock_to_q);

        if sequential {
            match port.direction {
                PortDirection::Input => {
                    if !setup_or_hold()? {
                        missing(
                            "port is a sequential input but has neither T_setup nor T_hold specified".into(),
                            port,
                        )?;
                    }
                    if !port.combinational_sink_ports.is_empty() && !clock_to_q()? {
                        missing(
                            "port is a sequential input with internal combinational connects but has neither min nor max T_clock_to_Q specified".into(),
                            port,
                        )?;
                    }
                }
                PortDirection::Output => {
                    if !clock_to_q()? {
                        missing(
                            "port is a sequential output but has neither min nor max T_clock_to_Q specified".into(),
                            port,
                        )?;
                    }
                    if is_driven && !setup_or_hold()? {
                        missing(
                            "port is a sequential output with internal combinational connections but has neither T_setup nor T_hold specified".into(),
                            port,
                        )?;
                    }
                }
            }
        } else if port.direction == PortDirection::Input {
            for sink in &port.combinational_sink_ports {
                if !has_combinational(pb_type, &port.name, sink)? {
                    missing(
                        format!(
                            "input port '{}' has combinational connections to port '{sink}'; specified in model, but no combinational delays found on pb_type",
                            port.name
                        ),
                        port,
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn check_annotation_against_model(annotation: &Annotation, model: &Model) -> ArchResult<()> {
    if let Some(clock) = &annotation.clock {
        for port_name in annotation.input_ports()? {
            let port = model.find_port(&port_name).ok_or_else(|| {
                ArchError::unknown(
                    format!(
                        "Failed to find port '{port_name}' on '{}' for sequential delay annotation",
                        model.name
                    ),
                    &annotation.loc,
                )
            })?;
            match &port.clock {
                None => {
                    return Err(ArchError::inconsistent(
                        format!(
                            "<pb_type> timing-annotation/<model> mismatch on port '{port_name}' of model '{}', model specifies no clock but timing annotation specifies '{clock}'",
                            model.name
                        ),
                        &annotation.loc,
                    ))
                }
                Some(model_clock) if model_clock != clock => {
                    return Err(ArchError::inconsistent(
                        format!(
                            "<pb_type> timing-annotation/<model> mismatch on port '{port_name}' of model '{}', model specifies clock as '{model_clock}' but timing annotation specifies '{clock}'",
                            model.name
                        ),
                        &annotation.loc,
                    ))
                }
                Some(_) => {}
            }
        }
        return Ok(());
    }

    if !annotation.is_combinational_delay() {
        return Ok(());
    }
    let (inputs, outputs) = (annotation.input_ports()?, annotation.output_ports()?);
    if inputs.is_empty() || outputs.is_empty() {
        return Err(ArchError::malformed(
            "Unrecognized delay annotation",
            &annotation.loc,
        ));
    }
    for input in &inputs {
        let port = model.find_input(input).ok_or_else(|| {
            ArchError::unknown(
                format!(
                    "Failed to find port '{input}' on '{}' for combinational delay annotation",
                    model.name
                ),
                &annotation.loc,
            )
        })?;
        for output in &outputs {
            if !port.combinational_sink_ports.contains(output) {
                return Err(ArchError::inconsistent(
                    format!(
                        "<pb_type> timing-annotation/<model> mismatch on port '{input}' of model '{}', timing annotation specifies combinational connection to port '{output}' but the connection does not exist in the model",
                        model.name
                    ),
                    &annotation.loc,
                ));
            }
        }
    }
    Ok(())
}

/// Binds every primitive pb_type to its model and every primitive port to
/// its model port, widening the model ports to the bound pin counts.
pub fn sync_models_pb_types(
    library: &mut ModelLibrary,
    arena: &mut PbTypeArena,
    blocks: &[LogicalBlockType],
) -> ArchResult<()> {
    for root in blocks.iter().filter_map(|b| b.pb_type) {
        for id in arena.walk(root) {
            let pb_type = arena.pb_type_mut(id);
            let Some(blif_model) = pb_type.blif_model.as_deref() else {
                continue;
            };
            let model_id = library
                .get_model_by_name(strip_subckt(blif_model))
                .ok_or_else(|| {
                    ArchError::unknown(
                        format!("No matching model for pb_type {blif_model}"),
                        &pb_type.loc,
                    )
                })?;
            pb_type.model = Some(model_id);
            let model = library.get_model_mut(model_id);
            model.pb_types.push(id);

            for port in &mut pb_type.ports {
                let (direction, index, model_port) = if let Some(i) =
                    model.inputs.iter().position(|p| p.name == port.name)
                {
                    (PortDirection::Input, i, &mut model.inputs[i])
                } else if let Some(i) = model.outputs.iter().position(|p| p.name == port.name) {
                    (PortDirection::Output, i, &mut model.outputs[i])
                } else {
                    return Err(ArchError::unknown(
                        format!(
                            "No matching model port for port {} in pb_type {}",
                            port.name, pb_type.name
                        ),
                        &port.loc,
                    ));
                };
                if port.direction != model_port.direction {
                    return Err(ArchError::inconsistent(
                        format!(
                            "Direction for port '{}' on model does not match port direction in pb_type '{}'",
                            port.name, pb_type.name
                        ),
                        &port.loc,
                    ));
                }
                if direction == PortDirection::Input && port.is_clock != model_port.is_clock {
                    return Err(ArchError::inconsistent(
                        format!(
                            "Port '{}' on model does not match is_clock in pb_type '{}'",
                            port.name, pb_type.name
                        ),
                        &port.loc,
                    ));
                }
                model_port.widen(port.num_pins);
                port.model_port = Some(ModelPortRef {
                    model: model_id,
                    direction,
                    index,
                });
            }
        }
    }
    Ok(())
}

/// Every user model needs an implementing primitive. Assigns per-kind port
/// indices: clock inputs, other inputs and outputs are counted separately.
pub fn check_models(library: &mut ModelLibrary) -> ArchResult<()> {
    let ids: Vec<_> = library.user_model_ids().collect();
    for id in ids {
        let model = library.get_model_mut(id);
        if model.pb_types.is_empty() {
            return Err(ArchError::inconsistent(
                format!("No pb_type found for model {}", model.name),
                &model.loc,
            ));
        }
        let (mut clocks, mut others) = (0, 0);
        for port in &mut model.inputs {
            let counter = if port.is_clock { &mut clocks } else { &mut others };
            port.index = *counter;
            *counter += 1;
        }
        for (index, port) in model.outputs.iter_mut().enumerate() {
            port.index = index as u32;
        }
    }
    Ok(())
}

fn contains_model(arena: &PbTypeArena, block: &LogicalBlockType, model: ModelId) -> bool {
    block.pb_type.is_some_and(|root| {
        arena
            .walk(root)
            .into_iter()
            .any(|id| arena.pb_type(id).model == Some(model))
    })
}

/// Flags tiles whose sites hold an input pad or output pad primitive.
pub fn mark_io_types(
    tiles: &mut [PhysicalTileType],
    blocks: &[LogicalBlockType],
    arena: &PbTypeArena,
) {
    for tile in tiles.iter_mut() {
        let sites = tile.site_union();
        let has = |model| sites.iter().any(|s| contains_model(arena, &blocks[s.index()], model));
        tile.is_input_type = has(ModelLibrary::INPUT);
        tile.is_output_type = has(ModelLibrary::OUTPUT);
    }
}
