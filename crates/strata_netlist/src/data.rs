//! Core netlist data structures and validation.
//!
//! Instances, nets, and pins live in three flat arenas. A pin knows its
//! instance, its net, and its role; instances and nets hold pin ID lists.
//! This breaks the instance↔net reference cycle without back-pointers and
//! keeps every adjacency query an index lookup.

use crate::error::NetlistError;
use crate::ids::{InstId, NetId, PinId};
use crate::spec::DesignSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of a logical cell.
///
/// Closed tag set, mirrored by the fabric's slot kinds. Compatibility
/// between the two is decided by the placement crate's lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Combinational logic.
    Comb,
    /// Sequential element (flip-flop).
    Seq,
    /// I/O pad.
    Io,
    /// Constant generator (tie cell).
    Tie,
}

impl CellKind {
    /// Infers the kind from a library cell name.
    ///
    /// Matches the naming conventions of the sky130 standard-cell library
    /// the fabric is built from; unknown names default to combinational.
    pub fn infer(cell: &str) -> CellKind {
        let lower = cell.to_ascii_lowercase();
        if lower.contains("dff") || lower.contains("dfxtp") || lower.contains("dfrtp")
            || lower.contains("dfstp") || lower.contains("dfbbp")
        {
            CellKind::Seq
        } else if lower.contains("conb") {
            CellKind::Tie
        } else if lower.contains("inpad") || lower.contains("outpad") || lower.contains("iobuf") {
            CellKind::Io
        } else {
            CellKind::Comb
        }
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CellKind::Comb => "comb",
            CellKind::Seq => "seq",
            CellKind::Io => "io",
            CellKind::Tie => "tie",
        };
        f.write_str(s)
    }
}

/// The role of a pin on its net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinRole {
    /// The pin sources the net.
    Driver,
    /// The pin receives the net.
    Sink,
}

/// A pin: the connection point between one instance and one net.
#[derive(Debug, Clone)]
pub struct Pin {
    /// Arena index of this pin.
    pub id: PinId,
    /// Pin name on the cell (e.g. `A`, `Y`, `CLK`).
    pub name: String,
    /// The instance that owns this pin.
    pub inst: InstId,
    /// The net this pin connects to.
    pub net: NetId,
    /// Driver or sink.
    pub role: PinRole,
}

/// A logical cell awaiting slot assignment.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Arena index of this instance.
    pub id: InstId,
    /// Instance name, unique per design.
    pub name: String,
    /// Library cell name.
    pub cell: String,
    /// Cell kind.
    pub kind: CellKind,
    /// Pins of this instance, in declaration order.
    pub pins: Vec<PinId>,
}

/// A hyperedge over pins: one driver, any number of sinks.
#[derive(Debug, Clone)]
pub struct Net {
    /// Arena index of this net.
    pub id: NetId,
    /// Net name, unique per design.
    pub name: String,
    /// The driving pin.
    pub driver: PinId,
    /// The sink pins.
    pub sinks: Vec<PinId>,
}

/// The validated, immutable netlist.
#[derive(Debug, Clone)]
pub struct Netlist {
    name: String,
    instances: Vec<Instance>,
    nets: Vec<Net>,
    pins: Vec<Pin>,
    inst_by_name: HashMap<String, InstId>,
    net_by_name: HashMap<String, NetId>,
    nets_of: Vec<Vec<NetId>>,
    clock: Option<NetId>,
}

impl Netlist {
    /// Validates a design description and builds the netlist.
    ///
    /// Checks for duplicate instance names, dangling pin references,
    /// nets without a driver, and inconsistent pin↔net declarations.
    pub fn build(spec: DesignSpec) -> Result<Self, NetlistError> {
        let mut instances = Vec::with_capacity(spec.instances.len());
        let mut pins: Vec<Pin> = Vec::new();
        let mut inst_by_name = HashMap::with_capacity(spec.instances.len());
        let mut net_by_name = HashMap::with_capacity(spec.nets.len());
        // (instance name, pin name) -> pin id, for resolving net references.
        let mut pin_lookup: HashMap<(String, String), PinId> = HashMap::new();
        // Declared net name per pin, checked against the nets section.
        let mut declared_net: Vec<String> = Vec::new();

        for (ni, net) in spec.nets.iter().enumerate() {
            net_by_name.insert(net.name.clone(), NetId::from_raw(ni as u32));
        }

        for (ii, ispec) in spec.instances.into_iter().enumerate() {
            let id = InstId::from_raw(ii as u32);
            if inst_by_name.insert(ispec.name.clone(), id).is_some() {
                return Err(NetlistError::DuplicateInstance { name: ispec.name });
            }

            let kind = ispec
                .kind
                .unwrap_or_else(|| CellKind::infer(&ispec.cell));
            let mut pin_ids = Vec::with_capacity(ispec.pins.len());
            for pspec in ispec.pins {
                let net = *net_by_name.get(&pspec.net).ok_or_else(|| {
                    NetlistError::DanglingRef {
                        net: pspec.net.clone(),
                        reference: format!("{}.{}", ispec.name, pspec.name),
                    }
                })?;
                let pid = PinId::from_raw(pins.len() as u32);
                pin_lookup.insert((ispec.name.clone(), pspec.name.clone()), pid);
                declared_net.push(pspec.net);
                pins.push(Pin {
                    id: pid,
                    name: pspec.name,
                    inst: id,
                    net,
                    // Provisional; the nets section assigns the real role.
                    role: PinRole::Sink,
                });
                pin_ids.push(pid);
            }

            instances.push(Instance {
                id,
                name: ispec.name,
                cell: ispec.cell,
                kind,
                pins: pin_ids,
            });
        }

        let mut nets = Vec::with_capacity(spec.nets.len());
        let mut referenced = vec![false; pins.len()];

        for (ni, nspec) in spec.nets.into_iter().enumerate() {
            let id = NetId::from_raw(ni as u32);

            let resolve = |r: &crate::spec::PinRef| -> Result<PinId, NetlistError> {
                pin_lookup
                    .get(&(r.inst.clone(), r.pin.clone()))
                    .copied()
                    .ok_or_else(|| NetlistError::DanglingRef {
                        net: nspec.name.clone(),
                        reference: r.to_string(),
                    })
            };

            let driver_ref = nspec.driver.ok_or_else(|| NetlistError::NoDriver {
                net: nspec.name.clone(),
            })?;
            let driver = resolve(&driver_ref)?;

            let mut sinks = Vec::with_capacity(nspec.sinks.len());
            for sref in &nspec.sinks {
                if *sref == driver_ref {
                    return Err(NetlistError::MultipleDrivers {
                        net: nspec.name.clone(),
                    });
                }
                sinks.push(resolve(sref)?);
            }

            for &pid in std::iter::once(&driver).chain(sinks.iter()) {
                if declared_net[pid.index()] != nspec.name {
                    return Err(NetlistError::DanglingRef {
                        net: nspec.name.clone(),
                        reference: format!(
                            "{}.{}",
                            instances[pins[pid.index()].inst.index()].name,
                            pins[pid.index()].name
                        ),
                    });
                }
                referenced[pid.index()] = true;
            }

            pins[driver.index()].role = PinRole::Driver;
            for &s in &sinks {
                pins[s.index()].role = PinRole::Sink;
            }

            nets.push(Net {
                id,
                name: nspec.name,
                driver,
                sinks,
            });
        }

        // A pin that declares a net the net's connection list omits is as
        // stale as the reverse direction.
        if let Some(idx) = referenced.iter().position(|&r| !r) {
            let pin = &pins[idx];
            return Err(NetlistError::DanglingRef {
                net: declared_net[idx].clone(),
                reference: format!("{}.{}", instances[pin.inst.index()].name, pin.name),
            });
        }

        let mut nets_of: Vec<Vec<NetId>> = vec![Vec::new(); instances.len()];
        for inst in &instances {
            let adj = &mut nets_of[inst.id.index()];
            for &pid in &inst.pins {
                adj.push(pins[pid.index()].net);
            }
            adj.sort_unstable();
            adj.dedup();
        }

        let clock = match spec.clock {
            Some(name) => Some(
                net_by_name
                    .get(&name)
                    .copied()
                    .ok_or(NetlistError::ClockNotFound { name })?,
            ),
            None => detect_clock(&nets, &net_by_name),
        };

        Ok(Self {
            name: spec.name,
            instances,
            nets,
            pins,
            inst_by_name,
            net_by_name,
            nets_of,
            clock,
        })
    }

    /// Design (top module) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instance with the given ID.
    pub fn inst(&self, id: InstId) -> &Instance {
        &self.instances[id.index()]
    }

    /// Looks an instance up by name.
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.inst_by_name.get(name).map(|&id| self.inst(id))
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.index()]
    }

    /// Looks a net up by name.
    pub fn net_by_name(&self, name: &str) -> Option<&Net> {
        self.net_by_name.get(name).map(|&id| self.net(id))
    }

    /// Returns the pin with the given ID.
    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.index()]
    }

    /// All nets touching the instance, deduplicated, in ascending net order.
    ///
    /// This is the affected-net set for wirelength deltas: moving the
    /// instance can only change the bounding boxes of these nets.
    pub fn nets_of(&self, inst: InstId) -> &[NetId] {
        &self.nets_of[inst.index()]
    }

    /// Total sink count over the nets this instance drives.
    pub fn fanout(&self, inst: InstId) -> usize {
        self.instances[inst.index()]
            .pins
            .iter()
            .filter(|&&pid| self.pins[pid.index()].role == PinRole::Driver)
            .map(|&pid| self.nets[self.pins[pid.index()].net.index()].sinks.len())
            .sum()
    }

    /// The distinguished clock net, if any.
    pub fn clock(&self) -> Option<NetId> {
        self.clock
    }

    /// Returns whether `net` is the clock net.
    pub fn is_clock(&self, net: NetId) -> bool {
        self.clock == Some(net)
    }

    /// Iterates over all instances in ID order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    /// Iterates over all nets in ID order.
    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.iter()
    }

    /// Number of instances.
    pub fn inst_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of nets.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Number of pins.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }
}

/// Picks the clock net by naming convention: an exact `clk` match wins,
/// otherwise the lowest-id net whose lowercase name contains `clk`.
fn detect_clock(nets: &[Net], net_by_name: &HashMap<String, NetId>) -> Option<NetId> {
    if let Some(&id) = net_by_name.get("clk") {
        return Some(id);
    }
    nets.iter()
        .find(|n| n.name.to_ascii_lowercase().contains("clk"))
        .map(|n| n.id)
}
