//! Placement engine for the strata toolchain.
//!
//! Assigns every instance of a mapped netlist to a distinct, type-compatible
//! fabric slot so that estimated wirelength (half-perimeter, Manhattan) is
//! minimized. Two stages:
//!
//! 1. **Greedy seed** — fanout-ordered nearest-compatible-slot assignment,
//!    pulling each instance toward its already-placed neighbours.
//! 2. **Annealing refinement** — swap/relocate moves under a geometric
//!    cooling schedule with Metropolis acceptance and incremental cost
//!    deltas.
//!
//! The run is single-threaded and bit-reproducible: one RNG seeded by the
//! caller, index-ordered iteration everywhere, integer-µm cost arithmetic.
//! Parameter sweeps parallelize by running independent processes.

#![warn(missing_docs)]

pub mod anneal;
pub mod compat;
pub mod cost;
pub mod error;
pub mod greedy;
pub mod map;
pub mod state;

pub use anneal::{refine, SaHooks, SaParams, SaStats, TempStats};
pub use compat::{compatible, slot_kind_for};
pub use cost::{net_hpwl, total_hpwl, DeltaScratch};
pub use error::PlaceError;
pub use greedy::seed;
pub use map::{
    render_fabric_map, render_placement_map, write_fabric_map, write_placement_map,
    write_sa_trace,
};
pub use state::Placement;

use strata_fabric::Fabric;
use strata_netlist::Netlist;

/// Runs the full placement pipeline: greedy seed, then annealing.
///
/// Returns the finished placement and the refinement summary.
pub fn place(
    fabric: &Fabric,
    netlist: &Netlist,
    params: &SaParams,
    hooks: &mut SaHooks<'_>,
) -> Result<(Placement, SaStats), PlaceError> {
    let mut placement = Placement::new(fabric, netlist);
    greedy::seed(fabric, netlist, &mut placement)?;
    let stats = anneal::refine(fabric, netlist, &mut placement, params, hooks)?;
    Ok((placement, stats))
}
