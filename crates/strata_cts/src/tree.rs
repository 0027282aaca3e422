//! Clock tree structure and its serialized record.

use serde::{Deserialize, Serialize};
use strata_common::Point;
use strata_fabric::{Fabric, SlotId};
use strata_netlist::{InstId, Netlist};

/// Opaque, copyable ID for a node of the clock tree.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct CtsNodeId(u32);

impl CtsNodeId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the index as a `usize` for direct table access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CtsNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One synthesized clock buffer.
///
/// `pos` is the ideal geometric coordinate (centroid or midpoint); `slot`
/// is the fabric site the buffer actually occupies. Leaves carry sinks,
/// internal nodes carry children; no node carries both.
#[derive(Debug, Clone)]
pub struct CtsNode {
    /// Arena index of this node.
    pub id: CtsNodeId,
    /// Ideal coordinate from the recursive geometry.
    pub pos: Point,
    /// The fabric slot hosting this buffer.
    pub slot: SlotId,
    /// Child buffers (internal nodes only).
    pub children: Vec<CtsNodeId>,
    /// Flip-flops driven directly (leaf nodes only).
    pub sinks: Vec<InstId>,
}

impl CtsNode {
    /// Returns whether this node drives sinks directly.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A rooted buffer tree over the design's flip-flops.
#[derive(Debug, Clone)]
pub struct ClockTree {
    nodes: Vec<CtsNode>,
    root: CtsNodeId,
}

impl ClockTree {
    pub(crate) fn new(nodes: Vec<CtsNode>, root: CtsNodeId) -> Self {
        Self { nodes, root }
    }

    /// The root buffer; its input is the top-level clock.
    pub fn root(&self) -> CtsNodeId {
        self.root
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: CtsNodeId) -> &CtsNode {
        &self.nodes[id.index()]
    }

    /// Iterates over all nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &CtsNode> {
        self.nodes.iter()
    }

    /// Number of synthesized buffers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree is empty. Never true for a synthesized tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over the leaf nodes.
    pub fn leaves(&self) -> impl Iterator<Item = &CtsNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Edge count of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk(tree: &ClockTree, id: CtsNodeId) -> usize {
            tree.node(id)
                .children
                .iter()
                .map(|&c| 1 + walk(tree, c))
                .max()
                .unwrap_or(0)
        }
        walk(self, self.root)
    }

    /// Every sink the tree serves, in leaf order.
    pub fn all_sinks(&self) -> Vec<InstId> {
        self.leaves().flat_map(|n| n.sinks.iter().copied()).collect()
    }
}

/// Serialized clock tree: the nested `{id, x_um, y_um, children}` record
/// the downstream reporting tools consume.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClockTreeRecord {
    /// ID of the root node.
    pub root: u32,
    /// All nodes, indexed by ID.
    pub nodes: Vec<NodeRecord>,
}

/// One node of the serialized record.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node ID.
    pub id: u32,
    /// Fabric slot name hosting the buffer.
    pub slot: String,
    /// Ideal x coordinate in µm.
    pub x_um: i64,
    /// Ideal y coordinate in µm.
    pub y_um: i64,
    /// Child node IDs.
    pub children: Vec<u32>,
    /// Names of the flip-flops driven directly (leaves only).
    pub sinks: Vec<String>,
}

/// Builds the serializable record for a tree.
pub fn to_record(tree: &ClockTree, fabric: &Fabric, netlist: &Netlist) -> ClockTreeRecord {
    ClockTreeRecord {
        root: tree.root().as_raw(),
        nodes: tree
            .nodes()
            .map(|n| NodeRecord {
                id: n.id.as_raw(),
                slot: fabric.slot(n.slot).name.clone(),
                x_um: n.pos.x,
                y_um: n.pos.y,
                children: n.children.iter().map(|c| c.as_raw()).collect(),
                sinks: n
                    .sinks
                    .iter()
                    .map(|&s| netlist.inst(s).name.clone())
                    .collect(),
            })
            .collect(),
    }
}

/// Renders the clock tree record as pretty JSON.
pub fn render_json(tree: &ClockTree, fabric: &Fabric, netlist: &Netlist) -> String {
    // The record is plain data; serialization cannot fail.
    serde_json::to_string_pretty(&to_record(tree, fabric, netlist)).unwrap_or_default()
}
