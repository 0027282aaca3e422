//! Unvalidated design description.
//!
//! A [`DesignSpec`] is what loaders produce and what
//! [`Netlist::build`](crate::Netlist::build) validates. The engineering-change
//! rewrite also assembles one of these when it materializes clock buffers,
//! so the rewritten netlist passes through the same validation as the input
//! design.

use crate::data::CellKind;

/// A full mapped design, before validation.
#[derive(Debug, Clone, Default)]
pub struct DesignSpec {
    /// Design (top module) name.
    pub name: String,
    /// All instances.
    pub instances: Vec<InstanceSpec>,
    /// All nets.
    pub nets: Vec<NetSpec>,
    /// Clock net name. `None` requests auto-detection.
    pub clock: Option<String>,
}

impl DesignSpec {
    /// Creates an empty design with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// One instance row.
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    /// Instance name, unique per design.
    pub name: String,
    /// Library cell name (e.g. `sky130_fd_sc_hd__nand2_1`).
    pub cell: String,
    /// Cell kind. `None` lets the builder infer it from the cell name.
    pub kind: Option<CellKind>,
    /// Pins of this instance, each naming the net it connects to.
    pub pins: Vec<PinSpec>,
}

impl InstanceSpec {
    /// Creates an instance with no pins.
    pub fn new(name: impl Into<String>, cell: impl Into<String>, kind: CellKind) -> Self {
        Self {
            name: name.into(),
            cell: cell.into(),
            kind: Some(kind),
            pins: Vec::new(),
        }
    }

    /// Adds a pin connected to the named net.
    pub fn pin(mut self, name: impl Into<String>, net: impl Into<String>) -> Self {
        self.pins.push(PinSpec {
            name: name.into(),
            net: net.into(),
        });
        self
    }
}

/// One pin row.
#[derive(Debug, Clone)]
pub struct PinSpec {
    /// Pin name on the cell (e.g. `A`, `Y`, `CLK`).
    pub name: String,
    /// Name of the net this pin connects to.
    pub net: String,
}

/// A reference to a pin, as `instance` + `pin` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRef {
    /// Instance name.
    pub inst: String,
    /// Pin name on that instance.
    pub pin: String,
}

impl PinRef {
    /// Creates a pin reference.
    pub fn new(inst: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            inst: inst.into(),
            pin: pin.into(),
        }
    }
}

impl std::fmt::Display for PinRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.inst, self.pin)
    }
}

/// One net row: a single driver plus its sinks.
#[derive(Debug, Clone)]
pub struct NetSpec {
    /// Net name, unique per design.
    pub name: String,
    /// The driving pin. `None` is invalid and rejected by the builder.
    pub driver: Option<PinRef>,
    /// The sink pins.
    pub sinks: Vec<PinRef>,
}

impl NetSpec {
    /// Creates a net with the given driver and sinks.
    pub fn new(name: impl Into<String>, driver: PinRef, sinks: Vec<PinRef>) -> Self {
        Self {
            name: name.into(),
            driver: Some(driver),
            sinks,
        }
    }
}
