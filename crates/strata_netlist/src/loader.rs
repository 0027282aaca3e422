//! JSON mapped-design loader.
//!
//! Reads the technology-mapped design produced by the synthesis flow:
//!
//! ```json
//! {
//!   "name": "counter",
//!   "clock": "clk",
//!   "instances": [
//!     { "name": "u0", "cell": "sky130_fd_sc_hd__nand2_1",
//!       "pins": [ { "name": "A", "net": "n1" }, { "name": "Y", "net": "n2" } ] }
//!   ],
//!   "nets": [
//!     { "name": "n2", "driver": { "inst": "u0", "pin": "Y" },
//!       "sinks": [ { "inst": "u1", "pin": "A" } ] }
//!   ]
//! }
//! ```
//!
//! Cell kinds are inferred from library cell names unless the file carries
//! an explicit `"kind"` field per instance.

use crate::data::{CellKind, Netlist};
use crate::error::NetlistError;
use crate::spec::{DesignSpec, InstanceSpec, NetSpec, PinRef, PinSpec};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct DesignFile {
    name: String,
    #[serde(default)]
    clock: Option<String>,
    instances: Vec<InstanceFile>,
    nets: Vec<NetFile>,
}

#[derive(Debug, Deserialize)]
struct InstanceFile {
    name: String,
    cell: String,
    #[serde(default)]
    kind: Option<CellKind>,
    pins: Vec<PinFile>,
}

#[derive(Debug, Deserialize)]
struct PinFile {
    name: String,
    net: String,
}

#[derive(Debug, Deserialize)]
struct NetFile {
    name: String,
    #[serde(default)]
    driver: Option<PinRefFile>,
    #[serde(default)]
    sinks: Vec<PinRefFile>,
}

#[derive(Debug, Deserialize)]
struct PinRefFile {
    inst: String,
    pin: String,
}

impl From<PinRefFile> for PinRef {
    fn from(r: PinRefFile) -> Self {
        PinRef::new(r.inst, r.pin)
    }
}

/// Parses and validates a mapped design from JSON text.
pub fn parse_design(json: &str) -> Result<Netlist, NetlistError> {
    parse_design_with_clock(json, None)
}

/// Parses a mapped design, overriding the file's clock net name.
///
/// `Some(name)` forces the clock (and fails if no such net exists);
/// `None` defers to the file's `"clock"` field or auto-detection.
pub fn parse_design_with_clock(json: &str, clock: Option<&str>) -> Result<Netlist, NetlistError> {
    let file: DesignFile =
        serde_json::from_str(json).map_err(|e| NetlistError::Load(e.to_string()))?;

    let spec = DesignSpec {
        name: file.name,
        clock: clock.map(str::to_string).or(file.clock),
        instances: file
            .instances
            .into_iter()
            .map(|i| InstanceSpec {
                name: i.name,
                cell: i.cell,
                kind: i.kind,
                pins: i
                    .pins
                    .into_iter()
                    .map(|p| PinSpec {
                        name: p.name,
                        net: p.net,
                    })
                    .collect(),
            })
            .collect(),
        nets: file
            .nets
            .into_iter()
            .map(|n| NetSpec {
                name: n.name,
                driver: n.driver.map(Into::into),
                sinks: n.sinks.into_iter().map(Into::into).collect(),
            })
            .collect(),
    };

    Netlist::build(spec)
}

/// Reads and parses a mapped-design file.
pub fn load_design(path: &Path) -> Result<Netlist, NetlistError> {
    load_design_with_clock(path, None)
}

/// Reads and parses a mapped-design file with an optional clock override.
pub fn load_design_with_clock(path: &Path, clock: Option<&str>) -> Result<Netlist, NetlistError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| NetlistError::Load(format!("{}: {e}", path.display())))?;
    parse_design_with_clock(&json, clock)
}
