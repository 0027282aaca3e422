//! Simulated-annealing placement refinement.
//!
//! Starting from the greedy seed, repeatedly proposes cell swaps or
//! relocations and accepts/rejects each move with the Metropolis criterion.
//! The temperature decreases geometrically; at high temperature the
//! optimizer explores the whole die, at low temperature it refines inside a
//! shrinking window around each cell.
//!
//! Move deltas come from the hypothetical evaluator in [`crate::cost`], so
//! a rejected move costs nothing to undo. The running total is updated by
//! the accepted deltas only and matches a from-scratch recomputation
//! exactly (integer arithmetic throughout).
//!
//! Determinism: the RNG is [`StdRng`] seeded from the caller's 64-bit seed,
//! instances are iterated in ID order, and no decision ever depends on hash
//! iteration order. Identical inputs give bit-identical placements.

use crate::compat::slot_kind_for;
use crate::cost::{self, DeltaScratch};
use crate::error::PlaceError;
use crate::state::Placement;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use strata_fabric::{Fabric, SlotId};
use strata_netlist::{InstId, Netlist};

/// Redraw attempts before a refine move gives up on finding a windowed
/// partner and falls through to explore.
const REFINE_REDRAWS: u32 = 8;

/// Probability that an explore move relocates into a free slot instead of
/// swapping with a peer.
const RELOCATE_PROB: f64 = 0.125;

/// `Δ/T` beyond which the acceptance probability is treated as zero,
/// keeping `exp` far away from underflow.
const METROPOLIS_CLAMP: f64 = 40.0;

/// Below this temperature the annealer is pure greedy descent.
const FROZEN_TEMP: f64 = 1e-12;

/// Annealing schedule parameters. All fields are plain and overridable.
#[derive(Debug, Clone)]
pub struct SaParams {
    /// Initial temperature.
    pub t0: f64,
    /// Geometric cooling ratio, `0 < alpha < 1`.
    pub alpha: f64,
    /// Moves attempted at each temperature.
    pub moves_per_temp: u32,
    /// Probability of a refine (windowed) move versus an explore move.
    pub prob_refine: f64,
    /// Stopping temperature.
    pub t_min: f64,
    /// Early exit after this many consecutive temperatures with zero
    /// accepted moves. Zero disables the stall exit.
    pub max_stall: u32,
    /// RNG seed. Identical seeds reproduce identical placements.
    pub seed: u64,
}

impl SaParams {
    /// The default schedule: moderate cooling, even refine/explore split.
    pub fn balanced() -> Self {
        Self {
            t0: 100.0,
            alpha: 0.92,
            moves_per_temp: 200,
            prob_refine: 0.50,
            t_min: 1e-3,
            max_stall: 5,
            seed: 1,
        }
    }

    /// Slow-cooling preset biased toward refinement; spends more moves but
    /// tends to land a lower final wirelength on larger designs.
    pub fn explorer() -> Self {
        Self {
            alpha: 0.97,
            prob_refine: 0.70,
            ..Self::balanced()
        }
    }

    /// Returns the parameters with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for SaParams {
    fn default() -> Self {
        Self::balanced()
    }
}

/// One line of the annealing trace, emitted at each temperature boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempStats {
    /// Temperature during this step.
    pub temperature: f64,
    /// Moves attempted at this temperature.
    pub attempts: u32,
    /// Moves accepted at this temperature.
    pub accepts: u32,
    /// Running total cost after this temperature.
    pub cost: i64,
    /// Wall-clock milliseconds since the run started.
    pub elapsed_ms: u64,
}

/// Summary of a refinement run.
#[derive(Debug, Clone)]
pub struct SaStats {
    /// Cost of the placement the annealer started from.
    pub initial_cost: i64,
    /// Cost of the placement the annealer left behind.
    pub final_cost: i64,
    /// Total moves attempted.
    pub attempts: u64,
    /// Total moves accepted.
    pub accepts: u64,
    /// Per-temperature trace.
    pub temps: Vec<TempStats>,
}

/// Optional observers for a refinement run.
///
/// Both default to no-ops; they are plain callables, not a plugin system.
/// The reporter fires at each temperature boundary; the cancel predicate is
/// polled there too and ends the run cleanly with the current feasible
/// placement.
#[derive(Default)]
pub struct SaHooks<'a> {
    /// Called once per temperature with that step's statistics.
    pub reporter: Option<Box<dyn FnMut(&TempStats) + 'a>>,
    /// Polled at each temperature boundary; `true` stops the run.
    pub cancel: Option<Box<dyn FnMut() -> bool + 'a>>,
}

/// A candidate perturbation of the placement.
#[derive(Debug, Clone, Copy)]
enum Move {
    /// Exchange the slots of two bound instances.
    Swap(InstId, InstId),
    /// Move a bound instance to a free slot.
    Relocate(InstId, SlotId),
}

/// Refines a seeded placement in place.
///
/// Returns the run summary. The lowest-cost placement seen during the run
/// is what remains bound on return — the seed itself when no move strictly
/// improved on it.
pub fn refine(
    fabric: &Fabric,
    netlist: &Netlist,
    placement: &mut Placement,
    params: &SaParams,
    hooks: &mut SaHooks<'_>,
) -> Result<SaStats, PlaceError> {
    let start = Instant::now();
    let initial_cost = cost::total_hpwl(fabric, netlist, placement);
    let mut stats = SaStats {
        initial_cost,
        final_cost: initial_cost,
        attempts: 0,
        accepts: 0,
        temps: Vec::new(),
    };

    let movable: Vec<InstId> = netlist
        .instances()
        .filter(|i| placement.slot_of(i.id).is_some())
        .map(|i| i.id)
        .collect();

    if movable.len() < 2 || params.moves_per_temp == 0 {
        return Ok(stats);
    }

    // Peers grouped by the slot-kind class they occupy, in instance-ID
    // order. The binding set never changes during refinement, so these
    // lists stay valid for the whole run.
    let mut by_class: [Vec<InstId>; 4] = Default::default();
    for &i in &movable {
        by_class[slot_kind_for(netlist.inst(i).kind).index()].push(i);
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut scratch = DeltaScratch::new();
    let diameter = fabric.diameter();

    let mut current_cost = initial_cost;
    let mut best_cost = current_cost;
    let mut best_slots: Vec<Option<SlotId>> =
        movable.iter().map(|&i| placement.slot_of(i)).collect();
    let mut temperature = params.t0;
    let mut stall = 0u32;

    loop {
        let mut accepts_at_temp = 0u32;

        for _ in 0..params.moves_per_temp {
            stats.attempts += 1;

            let proposal = propose(
                fabric, netlist, placement, params, &movable, &by_class, temperature, diameter,
                &mut rng,
            );
            let Some(mv) = proposal else { continue };

            let delta = match mv {
                Move::Swap(a, b) => scratch.swap_delta(fabric, netlist, placement, a, b),
                Move::Relocate(i, s) => scratch.relocate_delta(fabric, netlist, placement, i, s),
            };

            if !accept(delta, temperature, &mut rng) {
                continue;
            }

            match mv {
                Move::Swap(a, b) => placement.swap(fabric, netlist, a, b)?,
                Move::Relocate(i, s) => placement.relocate(fabric, netlist, i, s)?,
            }
            current_cost += delta;
            accepts_at_temp += 1;
            stats.accepts += 1;

            if current_cost < best_cost {
                best_cost = current_cost;
                for (slot, &inst) in best_slots.iter_mut().zip(&movable) {
                    *slot = placement.slot_of(inst);
                }
            }
        }

        let temp_stats = TempStats {
            temperature,
            attempts: params.moves_per_temp,
            accepts: accepts_at_temp,
            cost: current_cost,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        if let Some(reporter) = hooks.reporter.as_mut() {
            reporter(&temp_stats);
        }
        stats.temps.push(temp_stats);

        if accepts_at_temp == 0 {
            stall += 1;
        } else {
            stall = 0;
        }
        if params.max_stall > 0 && stall >= params.max_stall {
            break;
        }

        temperature *= params.alpha;
        if temperature < params.t_min {
            break;
        }

        if let Some(cancel) = hooks.cancel.as_mut() {
            if cancel() {
                break;
            }
        }
    }

    // Return the best placement seen, not wherever the walk wandered.
    // Zero-delta moves keep the walk off plateaus but must not leak
    // cost-neutral churn into the result.
    let drifted = movable
        .iter()
        .zip(&best_slots)
        .any(|(&inst, &slot)| placement.slot_of(inst) != slot);
    if drifted {
        restore(fabric, netlist, placement, &movable, &best_slots)?;
        current_cost = best_cost;
    }

    stats.final_cost = current_cost;
    Ok(stats)
}

/// Proposes the next move, or `None` when the draw finds no legal
/// perturbation (counted as an attempt with nothing to accept).
#[allow(clippy::too_many_arguments)]
fn propose(
    fabric: &Fabric,
    netlist: &Netlist,
    placement: &Placement,
    params: &SaParams,
    movable: &[InstId],
    by_class: &[Vec<InstId>; 4],
    temperature: f64,
    diameter: i64,
    rng: &mut StdRng,
) -> Option<Move> {
    let inst = movable[rng.gen_range(0..movable.len())];
    let class = slot_kind_for(netlist.inst(inst).kind);
    let peers = &by_class[class.index()];

    if rng.gen::<f64>() < params.prob_refine {
        // Refine: a swap partner inside a window that shrinks with the
        // temperature. A handful of failed draws falls through to explore.
        let radius = if params.t0 > 0.0 {
            ((diameter as f64) * (temperature / params.t0)).round().max(1.0) as i64
        } else {
            1
        };
        let here = fabric.slot(placement.slot_of(inst)?).pos;
        if peers.len() >= 2 {
            for _ in 0..REFINE_REDRAWS {
                let partner = peers[rng.gen_range(0..peers.len())];
                if partner == inst {
                    continue;
                }
                let there = fabric.slot(placement.slot_of(partner)?).pos;
                if (there.x - here.x).abs() <= radius && (there.y - here.y).abs() <= radius {
                    return Some(Move::Swap(inst, partner));
                }
            }
        }
    }

    // Explore: occasionally relocate into free space, otherwise swap with a
    // uniform partner anywhere on the die.
    if rng.gen::<f64>() < RELOCATE_PROB {
        let free = placement.free_slots_of_kind(fabric, class);
        if !free.is_empty() {
            return Some(Move::Relocate(inst, free[rng.gen_range(0..free.len())]));
        }
    }

    if peers.len() < 2 {
        return None;
    }
    // Single draw over the peer list minus `inst`: no rejection loop.
    let own = peers.binary_search(&inst).ok()?;
    let k = rng.gen_range(0..peers.len() - 1);
    let partner = peers[if k >= own { k + 1 } else { k }];
    Some(Move::Swap(inst, partner))
}

/// Metropolis acceptance with the numeric guards from the cost model:
/// ties count as improvements, a frozen temperature means pure descent,
/// and large `Δ/T` short-circuits to rejection before `exp` underflows.
fn accept(delta: i64, temperature: f64, rng: &mut StdRng) -> bool {
    if delta <= 0 {
        return true;
    }
    if temperature < FROZEN_TEMP {
        return false;
    }
    let ratio = delta as f64 / temperature;
    if ratio > METROPOLIS_CLAMP {
        return false;
    }
    (-ratio).exp() > rng.gen::<f64>()
}

/// Rewinds the placement to a snapshot taken during the run.
fn restore(
    fabric: &Fabric,
    netlist: &Netlist,
    placement: &mut Placement,
    movable: &[InstId],
    saved: &[Option<SlotId>],
) -> Result<(), PlaceError> {
    for &inst in movable {
        placement.unbind(inst);
    }
    for (&inst, &slot) in movable.iter().zip(saved) {
        if let Some(slot) = slot {
            placement.bind(fabric, netlist, inst, slot)?;
        }
    }
    Ok(())
}
