//! Core fabric data structures.
//!
//! The [`Fabric`] owns a dense slot table sorted in row-major order, plus
//! per-kind index views and a name lookup. Construction validates the
//! description; afterwards the fabric is immutable and may be shared by any
//! number of placement runs.

use crate::error::FabricError;
use crate::ids::SlotId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_common::{Point, Rect};

/// The kind of a physical fabric site.
///
/// A closed tag set: compatibility with logical cell kinds is a table
/// lookup, not an interface hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// A combinational logic site.
    Logic,
    /// A flip-flop site.
    Dff,
    /// An I/O pad site.
    Io,
    /// A constant-generator (tie) site.
    Tie,
}

impl SlotKind {
    /// All slot kinds, in table order.
    pub const ALL: [SlotKind; 4] = [SlotKind::Logic, SlotKind::Dff, SlotKind::Io, SlotKind::Tie];

    /// Dense table index for per-kind views.
    pub fn index(self) -> usize {
        match self {
            SlotKind::Logic => 0,
            SlotKind::Dff => 1,
            SlotKind::Io => 2,
            SlotKind::Tie => 3,
        }
    }
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SlotKind::Logic => "logic",
            SlotKind::Dff => "dff",
            SlotKind::Io => "io",
            SlotKind::Tie => "tie",
        };
        f.write_str(s)
    }
}

/// One physical site on the fabric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Arena index of this slot.
    pub id: SlotId,
    /// Canonical fabric name (e.g. `tile3_nand2_7`). Unique per fabric.
    pub name: String,
    /// Site coordinates in µm.
    pub pos: Point,
    /// Site kind.
    pub kind: SlotKind,
}

/// One row of a fabric description, before validation.
#[derive(Debug, Clone)]
pub struct SlotSpec {
    /// Canonical slot name.
    pub name: String,
    /// Site x coordinate in µm.
    pub x: i64,
    /// Site y coordinate in µm.
    pub y: i64,
    /// Site kind.
    pub kind: SlotKind,
}

/// The immutable slot grid.
#[derive(Debug, Clone)]
pub struct Fabric {
    slots: Vec<Slot>,
    die: Rect,
    by_kind: [Vec<SlotId>; 4],
    slot_by_name: HashMap<String, SlotId>,
}

impl Fabric {
    /// Builds a fabric from a slot description and a die bounding box.
    ///
    /// Slots are sorted into row-major order (y, then x, then name) and
    /// assigned dense [`SlotId`]s in that order. Fails with
    /// [`FabricError`] on an empty description, a duplicate slot name, or a
    /// slot outside the die box.
    pub fn new(mut specs: Vec<SlotSpec>, die: Rect) -> Result<Self, FabricError> {
        if specs.is_empty() {
            return Err(FabricError::Empty);
        }

        specs.sort_by(|a, b| (a.y, a.x, &a.name).cmp(&(b.y, b.x, &b.name)));

        let mut slots = Vec::with_capacity(specs.len());
        let mut by_kind: [Vec<SlotId>; 4] = Default::default();
        let mut slot_by_name = HashMap::with_capacity(specs.len());

        for (i, spec) in specs.into_iter().enumerate() {
            let pos = Point::new(spec.x, spec.y);
            if !die.contains(pos) {
                return Err(FabricError::OutOfBounds {
                    name: spec.name,
                    x: spec.x,
                    y: spec.y,
                });
            }
            let id = SlotId::from_raw(i as u32);
            if slot_by_name.insert(spec.name.clone(), id).is_some() {
                return Err(FabricError::DuplicateSlot { name: spec.name });
            }
            by_kind[spec.kind.index()].push(id);
            slots.push(Slot {
                id,
                name: spec.name,
                pos,
                kind: spec.kind,
            });
        }

        Ok(Self {
            slots,
            die,
            by_kind,
            slot_by_name,
        })
    }

    /// Returns the slot with the given ID.
    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    /// Looks a slot up by its canonical name.
    pub fn find(&self, name: &str) -> Option<&Slot> {
        self.slot_by_name.get(name).map(|&id| self.slot(id))
    }

    /// Iterates over all slots in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// All slots of a kind, in row-major order.
    pub fn slots_of_kind(&self, kind: SlotKind) -> &[SlotId] {
        &self.by_kind[kind.index()]
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether the fabric has no slots. Always false for a
    /// validated fabric.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The die bounding box.
    pub fn die(&self) -> Rect {
        self.die
    }

    /// The die centre, used as the seeding reference for instances with no
    /// placed neighbours.
    pub fn center(&self) -> Point {
        self.die.center()
    }

    /// Manhattan diameter of the die (half-perimeter). The annealer scales
    /// its refine window from this.
    pub fn diameter(&self) -> i64 {
        self.die.half_perimeter()
    }
}
