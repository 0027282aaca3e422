//! Structural Verilog writer.
//!
//! Renders the rewritten netlist as a flat gate-level module against the
//! fabric's cell library. I/O pad instances become module ports (the port
//! name is the net on the pad); every other instance becomes one
//! instantiation line, sorted by instance name for stable diffs.

use std::collections::HashSet;
use strata_netlist::{CellKind, Netlist, PinRole};

/// Renders the netlist as structural Verilog.
pub fn render_verilog(netlist: &Netlist) -> String {
    // Ports from pad instances, in declaration order. A pad that drives
    // its net is a chip input; a pad that sinks its net is a chip output.
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for inst in netlist.instances() {
        if inst.kind != CellKind::Io {
            continue;
        }
        for &pid in &inst.pins {
            let pin = netlist.pin(pid);
            let net = netlist.net(pin.net).name.clone();
            match pin.role {
                PinRole::Driver => inputs.push(net),
                PinRole::Sink => outputs.push(net),
            }
        }
    }

    let port_names: HashSet<&str> = inputs
        .iter()
        .chain(outputs.iter())
        .map(String::as_str)
        .collect();

    let wires: Vec<String> = netlist
        .nets()
        .filter(|n| !port_names.contains(n.name.as_str()))
        .map(|n| escape(&n.name))
        .collect();

    let mut out = String::new();
    let all_ports: Vec<String> = inputs
        .iter()
        .chain(outputs.iter())
        .map(|p| escape(p))
        .collect();
    out.push_str(&format!(
        "module {} ({});\n\n",
        escape(netlist.name()),
        all_ports.join(", ")
    ));

    if !inputs.is_empty() {
        let list: Vec<String> = inputs.iter().map(|p| escape(p)).collect();
        out.push_str(&format!("  input {};\n", list.join(", ")));
    }
    if !outputs.is_empty() {
        let list: Vec<String> = outputs.iter().map(|p| escape(p)).collect();
        out.push_str(&format!("  output {};\n", list.join(", ")));
    }
    out.push('\n');

    if !wires.is_empty() {
        out.push_str(&format!("  wire {};\n\n", wires.join(", ")));
    }

    let mut cells: Vec<_> = netlist
        .instances()
        .filter(|i| i.kind != CellKind::Io)
        .collect();
    cells.sort_by(|a, b| a.name.cmp(&b.name));

    for inst in cells {
        let conns: Vec<String> = inst
            .pins
            .iter()
            .map(|&pid| {
                let pin = netlist.pin(pid);
                format!(".{}({})", pin.name, escape(&netlist.net(pin.net).name))
            })
            .collect();
        out.push_str(&format!(
            "  {} {} ({});\n",
            inst.cell,
            escape(&inst.name),
            conns.join(", ")
        ));
    }

    out.push_str("\nendmodule\n");
    out
}

/// Escapes an identifier that is not a plain Verilog name.
fn escape(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\\{name} ")
    }
}
