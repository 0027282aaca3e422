//! Placement artifact writers.
//!
//! Three deterministic text renderings:
//!
//! * the **placement map** — one line per bound instance, sorted by
//!   instance name; the primary artifact consumed by the DEF writer and
//!   the visualizer;
//! * the **fabric occupancy map** — one line per fabric slot in row-major
//!   order, `UNUSED` where nothing is bound; handy for eyeballing
//!   utilization and for the tie-off reports;
//! * the **annealing trace** — one CSV row per temperature for the
//!   parameter-sweep tooling.

use crate::anneal::TempStats;
use crate::state::Placement;
use std::io::{self, Write};
use strata_fabric::Fabric;
use strata_netlist::Netlist;

/// Renders the placement map: `instance slot x_um y_um`, sorted by
/// instance name.
pub fn render_placement_map(fabric: &Fabric, netlist: &Netlist, placement: &Placement) -> String {
    let mut rows: Vec<(&str, &str, i64, i64)> = netlist
        .instances()
        .filter_map(|inst| {
            let slot = placement.slot_of(inst.id)?;
            let slot = fabric.slot(slot);
            Some((inst.name.as_str(), slot.name.as_str(), slot.pos.x, slot.pos.y))
        })
        .collect();
    rows.sort_by_key(|&(name, ..)| name);

    let mut out = String::new();
    for (inst, slot, x, y) in rows {
        out.push_str(&format!("{inst} {slot} {x} {y}\n"));
    }
    out
}

/// Writes the placement map to a stream.
pub fn write_placement_map(
    w: &mut impl Write,
    fabric: &Fabric,
    netlist: &Netlist,
    placement: &Placement,
) -> io::Result<()> {
    w.write_all(render_placement_map(fabric, netlist, placement).as_bytes())
}

/// Renders the fabric occupancy map:
/// `slot kind x_um y_um -> instance|UNUSED`, in row-major slot order.
pub fn render_fabric_map(fabric: &Fabric, netlist: &Netlist, placement: &Placement) -> String {
    let mut out = String::new();
    for slot in fabric.iter() {
        let occupant = placement
            .inst_of(slot.id)
            .map(|i| netlist.inst(i).name.as_str())
            .unwrap_or("UNUSED");
        out.push_str(&format!(
            "{}  {}  {}  {}  ->  {}\n",
            slot.name, slot.kind, slot.pos.x, slot.pos.y, occupant
        ));
    }
    out
}

/// Writes the fabric occupancy map to a stream.
pub fn write_fabric_map(
    w: &mut impl Write,
    fabric: &Fabric,
    netlist: &Netlist,
    placement: &Placement,
) -> io::Result<()> {
    w.write_all(render_fabric_map(fabric, netlist, placement).as_bytes())
}

/// Writes the per-temperature annealing trace as CSV.
pub fn write_sa_trace(w: &mut impl Write, temps: &[TempStats]) -> io::Result<()> {
    writeln!(w, "temperature,attempts,accepts,cost,elapsed_ms")?;
    for t in temps {
        writeln!(
            w,
            "{},{},{},{},{}",
            t.temperature, t.attempts, t.accepts, t.cost, t.elapsed_ms
        )?;
    }
    Ok(())
}
