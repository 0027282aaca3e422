//! Netlist model for the strata toolchain.
//!
//! The mapped design is a hypergraph: instances own pins, each pin connects
//! to exactly one net, and each net has one driver pin and any number of
//! sink pins. Nets and instances reference each other only through a flat
//! pin table indexed by opaque IDs — there are no owning back-pointers.
//!
//! The [`Netlist`] is constructed once (from a [`DesignSpec`], usually
//! parsed from a mapped-design JSON file) and never mutated. Placement
//! state lives elsewhere; the engineering-change rewrite produces a *new*
//! netlist rather than editing this one.

#![warn(missing_docs)]

pub mod data;
pub mod error;
pub mod ids;
pub mod loader;
pub mod spec;

pub use data::{CellKind, Instance, Net, Netlist, Pin, PinRole};
pub use error::NetlistError;
pub use ids::{InstId, NetId, PinId};
pub use loader::{load_design, load_design_with_clock, parse_design, parse_design_with_clock};
pub use spec::{DesignSpec, InstanceSpec, NetSpec, PinRef, PinSpec};
