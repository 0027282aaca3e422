//! Engineering-change rewrite for the strata toolchain.
//!
//! Ties the placement, the synthesized clock tree, and the logical netlist
//! together into the final fabric-named gate-level result:
//!
//! 1. materialize the clock buffers and their nets — the root buffer hangs
//!    off the original clock net, every other tree edge gets a fresh
//!    `clk_htree_<n>` net, and each flip-flop's clock pin moves from the
//!    flat clock net to its leaf buffer;
//! 2. rename every instance to the canonical name of the fabric slot it
//!    occupies.
//!
//! The whole rewrite is a pure function from `(Netlist, Placement,
//! ClockTree)` to a new netlist; its inputs are never mutated, and the
//! result passes through the same validation as a loaded design.

#![warn(missing_docs)]

pub mod error;
pub mod rewrite;
pub mod verilog;

pub use error::EcoError;
pub use rewrite::{insert_clock_tree, rename_instances, rewrite, slot_name_map};
pub use verilog::render_verilog;
