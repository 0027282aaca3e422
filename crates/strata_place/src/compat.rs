//! Cell ↔ slot kind compatibility.
//!
//! Sequential cells need flip-flop sites and pads need I/O sites; every
//! other cell kind — combinational gates and tie cells alike — occupies a
//! generic logic site. Tie *slots* are constant-generator sites on the
//! fabric and are never placement targets.

use strata_fabric::SlotKind;
use strata_netlist::CellKind;

/// The slot kind a cell of the given kind must occupy.
pub fn slot_kind_for(kind: CellKind) -> SlotKind {
    match kind {
        CellKind::Seq => SlotKind::Dff,
        CellKind::Io => SlotKind::Io,
        CellKind::Comb | CellKind::Tie => SlotKind::Logic,
    }
}

/// Returns whether a cell of kind `cell` may occupy a slot of kind `slot`.
pub fn compatible(cell: CellKind, slot: SlotKind) -> bool {
    slot_kind_for(cell) == slot
}
