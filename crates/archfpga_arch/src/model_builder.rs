//! Reads `<models>` into the [`ModelLibrary`].

use crate::check::{check_model_clocks, check_model_combinational_sinks, warn_model_missing_timing};
use crate::model::{ModelLibrary, ModelPort};
use crate::report::Reporter;
use crate::types::PortDirection;
use archfpga_common::{ArchError, ArchResult};
use archfpga_tree::ArchNode;
use std::collections::BTreeSet;

/// Adds every `<model>` under `models` to `library`, validating each one
/// as it is read.
pub fn process_models(
    models: &ArchNode,
    library: &mut ModelLibrary,
    reporter: &Reporter<'_>,
) -> ArchResult<()> {
    models.expect_only_children(&["model"])?;
    for node in &models.children {
        node.expect_only_attributes(&["name", "never_prune"])?;
        node.expect_only_children(&["input_ports", "output_ports"])?;
        let name = node.required_attr("name")?;
        let never_prune = match node.attribute("never_prune") {
            None | Some("false") => false,
            Some("true") => true,
            Some(_) => {
                return Err(ArchError::malformed(
                    "Unsupported never prune attribute value.",
                    &node.loc,
                ))
            }
        };

        let id = library.create_model(name, &node.loc)?;
        let mut seen = BTreeSet::new();
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for group in &node.children {
            group.expect_only_attributes(&[])?;
            let (direction, ports) = if group.name == "input_ports" {
                (PortDirection::Input, &mut inputs)
            } else {
                (PortDirection::Output, &mut outputs)
            };
            for port in &group.children {
                ports.push(process_model_port(port, direction, &mut seen)?);
            }
        }

        let model = library.get_model_mut(id);
        model.never_prune = never_prune;
        model.inputs = inputs;
        model.outputs = outputs;

        let model = library.get_model(id);
        check_model_clocks(model)?;
        check_model_combinational_sinks(model)?;
        warn_model_missing_timing(model, reporter)?;
    }
    Ok(())
}

fn process_model_port(
    node: &ArchNode,
    direction: PortDirection,
    seen: &mut BTreeSet<String>,
) -> ArchResult<ModelPort> {
    if node.name != "port" {
        return Err(ArchError::malformed(
            format!("unexpected <{}> in model port list (expected <port>)", node.name),
            &node.loc,
        ));
    }
    node.expect_no_children()?;
    node.expect_only_attributes(&[
        "name",
        "is_clock",
        "is_non_clock_global",
        "clock",
        "combinational_sink_ports",
    ])?;

    let is_clock = node.bool_attr("is_clock", false)?;
    let is_non_clock_global = node.bool_attr("is_non_clock_global", false)?;
    let name = node
        .attribute("name")
        .ok_or_else(|| ArchError::malformed("Model port is missing a name", &node.loc))?;
    if is_clock && is_non_clock_global {
        return Err(ArchError::malformed(
            format!(
                "Model port '{name}' cannot be both a clock and a non-clock signal simultaneously"
            ),
            &node.loc,
        ));
    }
    if !seen.insert(name.to_string()) {
        return Err(ArchError::Duplicate {
            what: "model port",
            name: name.to_string(),
            loc: node.loc.clone(),
        });
    }
    let sinks: Vec<String> = node
        .attr_or("combinational_sink_ports", "")
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if direction == PortDirection::Output && !sinks.is_empty() {
        return Err(ArchError::malformed(
            "Model output ports can not have combinational sink ports",
            &node.loc,
        ));
    }

    Ok(ModelPort {
        is_clock,
        is_non_clock_global,
        clock: node
            .attribute("clock")
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        combinational_sink_ports: sinks,
        loc: node.loc.clone(),
        ..ModelPort::new(name, direction)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use archfpga_config::ArchConfig;
    use archfpga_diagnostics::DiagnosticSink;

    fn port(name: &str) -> ArchNode {
        ArchNode::new("port").attr("name", name)
    }

    fn adder() -> ArchNode {
        ArchNode::new("model")
            .attr("name", "adder")
            .child(
                ArchNode::new("input_ports")
                    .child(port("a").attr("combinational_sink_ports", "sumout cout"))
                    .child(port("b").attr("combinational_sink_ports", "sumout cout")),
            )
            .child(
                ArchNode::new("output_ports")
                    .child(port("sumout"))
                    .child(port("cout")),
            )
    }

    fn run(models: ArchNode) -> (ArchResult<ModelLibrary>, DiagnosticSink) {
        let config = ArchConfig::default();
        let sink = DiagnosticSink::new();
        let mut library = ModelLibrary::new();
        let result = process_models(&models, &mut library, &Reporter::new(&config, &sink))
            .map(|()| library);
        (result, sink)
    }

    #[test]
    fn reads_ports_in_declaration_order() {
        let (library, sink) = run(ArchNode::new("models").child(adder()));
        let library = library.unwrap();
        let id = library.get_model_by_name("adder").unwrap();
        assert!(!library.is_library_model(id));
        let model = library.get_model(id);
        let inputs: Vec<_> = model.inputs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(inputs, vec!["a", "b"]);
        assert_eq!(model.inputs[0].combinational_sink_ports, vec!["sumout", "cout"]);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn duplicate_model_rejected() {
        let (result, _) = run(ArchNode::new("models").child(adder()).child(adder()));
        assert!(matches!(result, Err(ArchError::Duplicate { what: "model", .. })));
    }

    #[test]
    fn builtin_name_collides() {
        let model = ArchNode::new("model").attr("name", ".latch");
        let (result, _) = run(ArchNode::new("models").child(model));
        assert!(matches!(result, Err(ArchError::Duplicate { .. })));
    }

    #[test]
    fn port_errors() {
        let both = ArchNode::new("model").attr("name", "m").child(
            ArchNode::new("input_ports").child(
                port("g")
                    .attr("is_clock", "1")
                    .attr("is_non_clock_global", "1"),
            ),
        );
        let (result, _) = run(ArchNode::new("models").child(both));
        assert!(result
            .unwrap_err()
            .message()
            .contains("cannot be both a clock and a non-clock"));

        let unnamed = ArchNode::new("model")
            .attr("name", "m")
            .child(ArchNode::new("input_ports").child(ArchNode::new("port")));
        let (result, _) = run(ArchNode::new("models").child(unnamed));
        assert_eq!(result.unwrap_err().message(), "Model port is missing a name");

        let out_sinks = ArchNode::new("model").attr("name", "m").child(
            ArchNode::new("output_ports").child(port("z").attr("combinational_sink_ports", "y")),
        );
        let (result, _) = run(ArchNode::new("models").child(out_sinks));
        assert!(result.unwrap_err().message().contains("combinational sink"));

        let dup = ArchNode::new("model")
            .attr("name", "m")
            .child(ArchNode::new("input_ports").child(port("a")))
            .child(ArchNode::new("output_ports").child(port("a")));
        let (result, _) = run(ArchNode::new("models").child(dup));
        assert!(matches!(result, Err(ArchError::Duplicate { what: "model port", .. })));
    }

    #[test]
    fn never_prune_values() {
        let ok = ArchNode::new("model").attr("name", "m").attr("never_prune", "true");
        let (library, _) = run(ArchNode::new("models").child(ok));
        let library = library.unwrap();
        let id = library.get_model_by_name("m").unwrap();
        assert!(library.get_model(id).never_prune);

        let bad = ArchNode::new("model").attr("name", "m").attr("never_prune", "1");
        let (result, _) = run(ArchNode::new("models").child(bad));
        assert_eq!(
            result.unwrap_err().message(),
            "Unsupported never prune attribute value."
        );
    }

    #[test]
    fn untimed_ports_warn() {
        let model = ArchNode::new("model")
            .attr("name", "blackbox")
            .child(ArchNode::new("input_ports").child(port("a")))
            .child(ArchNode::new("output_ports").child(port("z")));
        let (result, sink) = run(ArchNode::new("models").child(model));
        assert!(result.is_ok());
        assert_eq!(sink.count_code(crate::codes::T301), 2);
    }
}
