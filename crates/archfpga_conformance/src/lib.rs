//! Conformance helpers for the archfpga model builder.
//!
//! Provides fixture architecture trees (pads, LUT/FF clusters, a memory
//! block, user and built-in flip-flops) and a helper that runs
//! [`build_architecture`] and collects its result and diagnostics for
//! assertion in integration tests.

#![warn(missing_docs)]

use archfpga_arch::{build_architecture, Architecture};
use archfpga_common::ArchResult;
use archfpga_config::{load_config_from_str, ArchConfig};
use archfpga_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use archfpga_tree::ArchNode;

/// Result of building one architecture.
pub struct BuildResult {
    /// The built architecture or the error that aborted construction.
    pub arch: ArchResult<Architecture>,
    /// Every diagnostic that reached the sink.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

impl BuildResult {
    /// Counts the diagnostics with the given code.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }
}

/// Creates a configuration with diagnostic deny/allow overrides.
pub fn make_config(deny: &[&str], allow: &[&str]) -> ArchConfig {
    let quote = |codes: &[&str]| {
        codes
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let toml_str = format!(
        "[diagnostics]\ndeny = [{}]\nallow = [{}]\n",
        quote(deny),
        quote(allow)
    );
    load_config_from_str(&toml_str).unwrap()
}

/// Builds `root` with the default configuration.
pub fn build(root: &ArchNode) -> BuildResult {
    build_with_config(root, &ArchConfig::default())
}

/// Builds `root` with `config`.
pub fn build_with_config(root: &ArchNode, config: &ArchConfig) -> BuildResult {
    let sink = DiagnosticSink::new();
    let arch = build_architecture(root, config, &sink);
    let diagnostics = sink.take_all();
    let warning_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    BuildResult {
        arch,
        diagnostics,
        warning_count,
    }
}

/// A port element (`input`, `output` or `clock`).
pub fn pin(element: &str, name: &str, num_pins: u32) -> ArchNode {
    ArchNode::new(element)
        .attr("name", name)
        .attr("num_pins", num_pins)
}

/// A `<direct>` interconnect.
pub fn direct(name: &str, input: &str, output: &str) -> ArchNode {
    ArchNode::new("direct")
        .attr("name", name)
        .attr("input", input)
        .attr("output", output)
}

/// A `<complete>` interconnect.
pub fn complete(name: &str, input: &str, output: &str) -> ArchNode {
    ArchNode::new("complete")
        .attr("name", name)
        .attr("input", input)
        .attr("output", output)
}

/// Assembles an `<architecture>` with one L4 segment, one mux switch and a
/// device default Fc.
pub fn architecture(
    models: impl IntoIterator<Item = ArchNode>,
    blocks: impl IntoIterator<Item = ArchNode>,
    tiles: impl IntoIterator<Item = ArchNode>,
) -> ArchNode {
    ArchNode::new("architecture")
        .child(ArchNode::new("models").children(models))
        .child(
            ArchNode::new("device").child(
                ArchNode::new("default_fc")
                    .attr("in_type", "frac")
                    .attr("in_val", "0.15")
                    .attr("out_type", "frac")
                    .attr("out_val", "0.10"),
            ),
        )
        .child(
            ArchNode::new("switchlist").child(
                ArchNode::new("switch")
                    .attr("type", "mux")
                    .attr("name", "0"),
            ),
        )
        .child(
            ArchNode::new("segmentlist").child(
                ArchNode::new("segment")
                    .attr("name", "L4")
                    .attr("length", 4),
            ),
        )
        .child(ArchNode::new("complexblocklist").children(blocks))
        .child(ArchNode::new("tiles").children(tiles))
        .with_file("fixture.xml")
}

/// A `<model>` for a D flip-flop `name` with ports `D`, `clk` and `Q`.
pub fn flipflop_model(name: &str) -> ArchNode {
    ArchNode::new("model")
        .attr("name", name)
        .child(
            ArchNode::new("input_ports")
                .child(
                    ArchNode::new("port")
                        .attr("name", "D")
                        .attr("clock", "clk"),
                )
                .child(
                    ArchNode::new("port")
                        .attr("name", "clk")
                        .attr("is_clock", "1"),
                ),
        )
        .child(
            ArchNode::new("output_ports").child(
                ArchNode::new("port")
                    .attr("name", "Q")
                    .attr("clock", "clk"),
            ),
        )
}

/// A flip-flop primitive bound to `blif_model`, with `T_clock_to_Q` on `Q`
/// and, if `with_setup`, `T_setup` on `D`.
pub fn flipflop(name: &str, blif_model: &str, with_setup: bool) -> ArchNode {
    let mut ff = ArchNode::new("pb_type")
        .attr("name", name)
        .attr("num_pb", 1)
        .attr("blif_model", blif_model)
        .child(pin("input", "D", 1))
        .child(pin("output", "Q", 1))
        .child(pin("clock", "clk", 1));
    if with_setup {
        ff = ff.child(
            ArchNode::new("T_setup")
                .attr("value", "66e-12")
                .attr("port", format!("{name}.D"))
                .attr("clock", "clk"),
        );
    }
    ff.child(
        ArchNode::new("T_clock_to_Q")
            .attr("max", "124e-12")
            .attr("port", format!("{name}.Q"))
            .attr("clock", "clk"),
    )
}

/// A `k`-input LUT primitive named `name` with a constant delay.
pub fn lut(name: &str, k: u32) -> ArchNode {
    ArchNode::new("pb_type")
        .attr("name", name)
        .attr("num_pb", 1)
        .attr("blif_model", ".names")
        .attr("class", "lut")
        .child(pin("input", "in", k).attr("port_class", "lut_in"))
        .child(pin("output", "out", 1).attr("port_class", "lut_out"))
        .child(
            ArchNode::new("delay_constant")
                .attr("max", "261e-12")
                .attr("in_port", format!("{name}.in"))
                .attr("out_port", format!("{name}.out")),
        )
}

/// A complex block `clb` holding one `k`-LUT feeding a flip-flop.
pub fn clb_block(k: u32) -> ArchNode {
    ArchNode::new("pb_type")
        .attr("name", "clb")
        .child(pin("input", "I", k).attr("equivalent", "full"))
        .child(pin("output", "O", 1))
        .child(pin("clock", "clk", 1))
        .child(lut("lut", k))
        .child(flipflop("ff", ".latch", true))
        .child(
            ArchNode::new("interconnect")
                .child(complete("crossbar", "clb.I", "lut.in"))
                .child(direct("lut2ff", "lut.out", "ff.D"))
                .child(direct("clk", "clb.clk", "ff.clk"))
                .child(direct("out", "ff.Q", "clb.O")),
        )
}

/// The physical tile for [`clb_block`].
pub fn clb_tile(k: u32) -> ArchNode {
    ArchNode::new("tile").attr("name", "clb").child(
        ArchNode::new("sub_tile")
            .attr("name", "clb")
            .child(pin("input", "I", k).attr("equivalent", "full"))
            .child(pin("output", "O", 1))
            .child(pin("clock", "clk", 1))
            .child(
                ArchNode::new("equivalent_sites")
                    .child(ArchNode::new("site").attr("pb_type", "clb")),
            ),
    )
}

/// A bidirectional pad block `io` with an input-pad and an output-pad mode.
pub fn io_block() -> ArchNode {
    let pad_mode = |mode: &str,
                    blif_model: &str,
                    element: &str,
                    port: &str,
                    input: &str,
                    output: &str| {
        ArchNode::new("mode")
            .attr("name", mode)
            .child(
                ArchNode::new("pb_type")
                    .attr("name", mode)
                    .attr("num_pb", 1)
                    .attr("blif_model", blif_model)
                    .child(pin(element, port, 1)),
            )
            .child(ArchNode::new("interconnect").child(direct(mode, input, output)))
    };
    ArchNode::new("pb_type")
        .attr("name", "io")
        .child(pin("input", "outpad", 1))
        .child(pin("output", "inpad", 1))
        .child(pin("clock", "clock", 1))
        .child(pad_mode("inpad", ".input", "output", "inpad", "inpad.inpad", "io.inpad"))
        .child(pad_mode("outpad", ".output", "input", "outpad", "io.outpad", "outpad.outpad"))
}

/// The physical tile for [`io_block`], stacked `capacity` times.
pub fn io_tile(capacity: u32) -> ArchNode {
    ArchNode::new("tile").attr("name", "io").child(
        ArchNode::new("sub_tile")
            .attr("name", "io")
            .attr("capacity", capacity)
            .child(pin("input", "outpad", 1))
            .child(pin("output", "inpad", 1))
            .child(pin("clock", "clock", 1))
            .child(
                ArchNode::new("equivalent_sites")
                    .child(ArchNode::new("site").attr("pb_type", "io")),
            ),
    )
}

/// The `<model>` of a single-port RAM with untimed `addr`, `data_in` and
/// `data_out`.
pub fn memory_model() -> ArchNode {
    let port = |name: &str| ArchNode::new("port").attr("name", name);
    ArchNode::new("model")
        .attr("name", "spram")
        .child(
            ArchNode::new("input_ports")
                .child(port("addr"))
                .child(port("data_in")),
        )
        .child(ArchNode::new("output_ports").child(port("data_out")))
}

/// A block `mem` holding one memory-class primitive with an `addr_width`
/// address and a `data_width` data bus.
pub fn memory_block(addr_width: u32, data_width: u32) -> ArchNode {
    ArchNode::new("pb_type")
        .attr("name", "mem")
        .child(pin("input", "addr", addr_width))
        .child(pin("input", "din", data_width))
        .child(pin("output", "dout", data_width))
        .child(
            ArchNode::new("pb_type")
                .attr("name", "ram")
                .attr("num_pb", 1)
                .attr("blif_model", ".subckt spram")
                .attr("class", "memory")
                .child(pin("input", "addr", addr_width).attr("port_class", "address"))
                .child(pin("input", "data_in", data_width).attr("port_class", "data_in"))
                .child(pin("output", "data_out", data_width).attr("port_class", "data_out")),
        )
        .child(
            ArchNode::new("interconnect")
                .child(direct("a", "mem.addr", "ram.addr"))
                .child(direct("d", "mem.din", "ram.data_in"))
                .child(direct("q", "ram.data_out", "mem.dout")),
        )
}

/// The physical tile for [`memory_block`].
pub fn memory_tile(addr_width: u32, data_width: u32) -> ArchNode {
    ArchNode::new("tile")
        .attr("name", "mem")
        .attr("height", 2)
        .child(
            ArchNode::new("sub_tile")
                .attr("name", "mem")
                .child(pin("input", "addr", addr_width))
                .child(pin("input", "din", data_width))
                .child(pin("output", "dout", data_width))
                .child(
                    ArchNode::new("equivalent_sites")
                        .child(ArchNode::new("site").attr("pb_type", "mem")),
                ),
        )
}

/// A block `reg` with ports `d` (input), `q` (output) and `c` (clock)
/// wrapping one flip-flop bound to `blif_model`.
pub fn reg_block(blif_model: &str, with_setup: bool) -> ArchNode {
    ArchNode::new("pb_type")
        .attr("name", "reg")
        .child(pin("input", "d", 1))
        .child(pin("output", "q", 1))
        .child(pin("clock", "c", 1))
        .child(flipflop("ff", blif_model, with_setup))
        .child(
            ArchNode::new("interconnect")
                .child(direct("d", "reg.d", "ff.D"))
                .child(direct("c", "reg.c", "ff.clk"))
                .child(direct("q", "ff.Q", "reg.q")),
        )
}

/// A tile `name` with ports `d`, `q`, `c` hosting `reg`. With `mappings`,
/// the site uses a custom pin mapping of `(from, to)` pairs.
pub fn reg_tile(name: &str, mappings: Option<&[(&str, &str)]>) -> ArchNode {
    let mut site = ArchNode::new("site").attr("pb_type", "reg");
    if let Some(mappings) = mappings {
        site = site.attr("pin_mapping", "custom").children(
            mappings
                .iter()
                .map(|(from, to)| ArchNode::new("direct").attr("from", from).attr("to", to)),
        );
    }
    ArchNode::new("tile").attr("name", name).child(
        ArchNode::new("sub_tile")
            .attr("name", name)
            .child(pin("input", "d", 1))
            .child(pin("output", "q", 1))
            .child(pin("clock", "c", 1))
            .child(ArchNode::new("equivalent_sites").child(site)),
    )
}

/// An island-style architecture: pads and `k`-LUT clusters.
pub fn k_lut_architecture(k: u32) -> ArchNode {
    architecture(
        [],
        [io_block(), clb_block(k)],
        [io_tile(8), clb_tile(k)],
    )
}
