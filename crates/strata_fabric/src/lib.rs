//! Fabric model for the strata toolchain.
//!
//! A structured-ASIC fabric is a fixed lattice of pre-fabricated cell slots;
//! every slot has a canonical name, integer-µm coordinates, and a kind
//! (logic, flip-flop, I/O, or tie/constant site). The [`Fabric`] is built
//! once from a fabric description and never mutated: placement binds logical
//! instances *onto* it, it never changes the silicon.
//!
//! Slots are held in row-major order (y, then x), which fixes iteration
//! order for every downstream consumer and makes placement output
//! reproducible.

#![warn(missing_docs)]

pub mod data;
pub mod error;
pub mod ids;
pub mod loader;

pub use data::{Fabric, Slot, SlotKind, SlotSpec};
pub use error::FabricError;
pub use ids::SlotId;
pub use loader::{load_fabric, parse_fabric};
