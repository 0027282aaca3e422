//! JSON fabric loader.
//!
//! The fabric file is the silicon's self-description: a die box plus one row
//! per pre-fabricated slot.
//!
//! ```json
//! {
//!   "die": { "width_um": 400, "height_um": 400 },
//!   "slots": [
//!     { "name": "tile0_nand2_0", "x_um": 12, "y_um": 8, "kind": "logic" }
//!   ]
//! }
//! ```

use crate::data::{Fabric, SlotKind, SlotSpec};
use crate::error::FabricError;
use serde::Deserialize;
use std::path::Path;
use strata_common::Rect;

#[derive(Debug, Deserialize)]
struct FabricFile {
    die: DieFile,
    slots: Vec<SlotFile>,
}

#[derive(Debug, Deserialize)]
struct DieFile {
    width_um: i64,
    height_um: i64,
}

#[derive(Debug, Deserialize)]
struct SlotFile {
    name: String,
    x_um: i64,
    y_um: i64,
    kind: SlotKind,
}

/// Parses a fabric description from JSON text.
pub fn parse_fabric(json: &str) -> Result<Fabric, FabricError> {
    let file: FabricFile =
        serde_json::from_str(json).map_err(|e| FabricError::Load(e.to_string()))?;

    let die = Rect::from_size(file.die.width_um, file.die.height_um);
    let specs = file
        .slots
        .into_iter()
        .map(|s| SlotSpec {
            name: s.name,
            x: s.x_um,
            y: s.y_um,
            kind: s.kind,
        })
        .collect();

    Fabric::new(specs, die)
}

/// Reads and parses a fabric description file.
pub fn load_fabric(path: &Path) -> Result<Fabric, FabricError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| FabricError::Load(format!("{}: {e}", path.display())))?;
    parse_fabric(&json)
}
