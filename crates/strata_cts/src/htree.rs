//! Recursive geometric bisection.

use crate::error::CtsError;
use crate::tree::{ClockTree, CtsNode, CtsNodeId};
use std::collections::HashSet;
use strata_common::{BoundingBox, Point};
use strata_fabric::{Fabric, SlotId, SlotKind};
use strata_netlist::{CellKind, InstId, Netlist};
use strata_place::Placement;

/// Clock tree synthesis parameters.
#[derive(Debug, Clone)]
pub struct CtsParams {
    /// Maximum sinks per leaf buffer and children per internal buffer.
    pub max_fanout: usize,
    /// Library cell instantiated for every synthesized buffer.
    pub buffer_cell: String,
}

impl Default for CtsParams {
    fn default() -> Self {
        Self {
            max_fanout: 4,
            buffer_cell: "sky130_fd_sc_hd__clkbuf_4".to_string(),
        }
    }
}

/// A sink under construction: a flip-flop and where it sits.
#[derive(Debug, Clone, Copy)]
struct Sink {
    inst: InstId,
    pos: Point,
}

/// Builder state threaded through the recursion.
struct Builder<'a> {
    fabric: &'a Fabric,
    placement: &'a Placement,
    params: &'a CtsParams,
    nodes: Vec<CtsNode>,
    claimed: HashSet<SlotId>,
}

/// Synthesizes the H-tree over every placed flip-flop.
///
/// Fails with [`CtsError::NoSinks`] on a flip-flop-free design,
/// [`CtsError::UnplacedSink`] if a flip-flop has no binding, and
/// [`CtsError::NoBufferSlot`] when the fabric cannot host a buffer.
pub fn synthesize(
    fabric: &Fabric,
    netlist: &Netlist,
    placement: &Placement,
    params: &CtsParams,
) -> Result<ClockTree, CtsError> {
    let mut sinks = Vec::new();
    for inst in netlist.instances() {
        if inst.kind != CellKind::Seq {
            continue;
        }
        let slot = placement
            .slot_of(inst.id)
            .ok_or_else(|| CtsError::UnplacedSink {
                instance: inst.name.clone(),
            })?;
        sinks.push(Sink {
            inst: inst.id,
            pos: fabric.slot(slot).pos,
        });
    }
    if sinks.is_empty() {
        return Err(CtsError::NoSinks);
    }

    let mut builder = Builder {
        fabric,
        placement,
        params,
        nodes: Vec::new(),
        claimed: HashSet::new(),
    };
    let root = builder.build(&mut sinks)?;
    Ok(ClockTree::new(builder.nodes, root))
}

impl Builder<'_> {
    /// Recursively builds the subtree over `sinks`, returning its buffer.
    fn build(&mut self, sinks: &mut [Sink]) -> Result<CtsNodeId, CtsError> {
        if sinks.len() <= self.params.max_fanout {
            let pos = centroid(sinks);
            let slot = self.claim_near(pos)?;
            return Ok(self.push(CtsNode {
                id: CtsNodeId::from_raw(0),
                pos,
                slot,
                children: Vec::new(),
                sinks: sinks.iter().map(|s| s.inst).collect(),
            }));
        }

        // Split on the wider axis at the median; ties inside a coordinate
        // resolve by instance ID, so equal-coordinate sinks partition the
        // same way every run.
        let mut bbox = BoundingBox::new();
        for s in sinks.iter() {
            bbox.expand(s.pos);
        }
        if bbox.width() >= bbox.height() {
            sinks.sort_by_key(|s| (s.pos.x, s.inst));
        } else {
            sinks.sort_by_key(|s| (s.pos.y, s.inst));
        }
        let mid = sinks.len() / 2;
        let (lo, hi) = sinks.split_at_mut(mid);

        let left = self.build(lo)?;
        let right = self.build(hi)?;

        let (a, b) = (self.nodes[left.index()].pos, self.nodes[right.index()].pos);
        let pos = Point::new((a.x + b.x) / 2, (a.y + b.y) / 2);
        let slot = self.claim_near(pos)?;
        Ok(self.push(CtsNode {
            id: CtsNodeId::from_raw(0),
            pos,
            slot,
            children: vec![left, right],
            sinks: Vec::new(),
        }))
    }

    fn push(&mut self, mut node: CtsNode) -> CtsNodeId {
        let id = CtsNodeId::from_raw(self.nodes.len() as u32);
        node.id = id;
        self.nodes.push(node);
        id
    }

    /// Claims the free slot nearest `pos`, preferring logic sites and
    /// falling back to flip-flop then I/O sites when a kind is exhausted.
    fn claim_near(&mut self, pos: Point) -> Result<SlotId, CtsError> {
        for kind in [SlotKind::Logic, SlotKind::Dff, SlotKind::Io] {
            let mut best: Option<(i64, SlotId)> = None;
            for &slot in self.fabric.slots_of_kind(kind) {
                if !self.placement.is_free(slot) || self.claimed.contains(&slot) {
                    continue;
                }
                let d = self.fabric.slot(slot).pos.manhattan(pos);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, slot));
                }
            }
            if let Some((_, slot)) = best {
                self.claimed.insert(slot);
                return Ok(slot);
            }
        }
        Err(CtsError::NoBufferSlot { x: pos.x, y: pos.y })
    }
}

/// Integer centroid of a sink group.
fn centroid(sinks: &[Sink]) -> Point {
    let n = sinks.len() as i64;
    let sum_x: i64 = sinks.iter().map(|s| s.pos.x).sum();
    let sum_y: i64 = sinks.iter().map(|s| s.pos.y).sum();
    Point::new(sum_x / n, sum_y / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet as Set;
    use strata_common::Rect;
    use strata_fabric::SlotSpec;
    use strata_netlist::{DesignSpec, InstanceSpec, NetSpec, PinRef};

    /// `n_dff` flip-flops on a regular grid plus a generous pool of logic
    /// slots for buffers, with every flip-flop clock pin on `clk`.
    fn placed_dff_grid(side: usize, pitch: i64) -> (Fabric, Netlist, Placement) {
        let mut specs = Vec::new();
        for y in 0..side {
            for x in 0..side {
                specs.push(SlotSpec {
                    name: format!("F_{x}_{y}"),
                    x: x as i64 * pitch,
                    y: y as i64 * pitch,
                    kind: SlotKind::Dff,
                });
                specs.push(SlotSpec {
                    name: format!("L_{x}_{y}"),
                    x: x as i64 * pitch + pitch / 2,
                    y: y as i64 * pitch,
                    kind: SlotKind::Logic,
                });
            }
        }
        specs.push(SlotSpec {
            name: "P_clk".into(),
            x: 0,
            y: (side as i64) * pitch,
            kind: SlotKind::Io,
        });
        let extent = side as i64 * pitch;
        let fabric = Fabric::new(specs, Rect::from_size(extent, extent)).unwrap();

        let mut d = DesignSpec::new("dffs");
        d.instances
            .push(InstanceSpec::new("p_clk", "inpad", CellKind::Io).pin("PAD", "clk"));
        let mut clk_sinks = Vec::new();
        for i in 0..side * side {
            d.instances.push(
                InstanceSpec::new(format!("ff{i:02}"), "dfxtp_1", CellKind::Seq)
                    .pin("CLK", "clk")
                    .pin("Q", format!("q{i}")),
            );
            d.nets
                .push(NetSpec::new(format!("q{i}"), PinRef::new(format!("ff{i:02}"), "Q"), vec![]));
            clk_sinks.push(PinRef::new(format!("ff{i:02}"), "CLK"));
        }
        d.nets
            .push(NetSpec::new("clk", PinRef::new("p_clk", "PAD"), clk_sinks));
        let netlist = Netlist::build(d).unwrap();

        let mut placement = Placement::new(&fabric, &netlist);
        // Pin each flip-flop to its grid site directly; the clock tree only
        // cares about coordinates, not how placement chose them.
        for i in 0..side * side {
            let inst = netlist.instance(&format!("ff{i:02}")).unwrap().id;
            let slot = fabric
                .find(&format!("F_{}_{}", i % side, i / side))
                .unwrap()
                .id;
            placement.bind(&fabric, &netlist, inst, slot).unwrap();
        }
        let p_clk = netlist.instance("p_clk").unwrap().id;
        let io = fabric.find("P_clk").unwrap().id;
        placement.bind(&fabric, &netlist, p_clk, io).unwrap();

        (fabric, netlist, placement)
    }

    #[test]
    fn sixteen_dffs_make_a_depth_two_tree() {
        let (f, nl, p) = placed_dff_grid(4, 20);
        let tree = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap();

        assert_eq!(tree.depth(), 2);
        let leaves: Vec<_> = tree.leaves().collect();
        assert_eq!(leaves.len(), 4);
        for leaf in &leaves {
            assert_eq!(leaf.sinks.len(), 4);
        }
        // Root midpoint lands at the grid centre.
        let root = tree.node(tree.root());
        assert_eq!(root.pos, Point::new(30, 30));
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn every_sink_appears_exactly_once() {
        let (f, nl, p) = placed_dff_grid(4, 20);
        let tree = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap();

        let sinks = tree.all_sinks();
        let unique: Set<_> = sinks.iter().collect();
        assert_eq!(sinks.len(), 16);
        assert_eq!(unique.len(), 16);
    }

    #[test]
    fn fanout_bound_holds() {
        for side in [2usize, 3, 4, 5] {
            let (f, nl, p) = placed_dff_grid(side, 20);
            let tree = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap();
            for node in tree.nodes() {
                assert!(node.children.len() <= 4);
                assert!(node.sinks.len() <= 4);
                // A node is a leaf or an internal node, never both.
                assert!(node.children.is_empty() || node.sinks.is_empty());
            }
            assert_eq!(tree.all_sinks().len(), side * side);
        }
    }

    #[test]
    fn single_dff_gets_a_single_leaf() {
        let (f, nl, p) = placed_dff_grid(1, 20);
        let tree = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.node(tree.root()).sinks.len(), 1);
    }

    #[test]
    fn buffers_claim_distinct_free_slots() {
        let (f, nl, p) = placed_dff_grid(4, 20);
        let tree = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap();

        let mut seen = Set::new();
        for node in tree.nodes() {
            assert!(p.is_free(node.slot), "buffer stole an occupied slot");
            assert!(seen.insert(node.slot), "two buffers share a slot");
        }
    }

    #[test]
    fn no_sinks_is_an_error() {
        let (f, nl, p) = {
            let specs = vec![SlotSpec {
                name: "l0".into(),
                x: 0,
                y: 0,
                kind: SlotKind::Logic,
            }];
            let fabric = Fabric::new(specs, Rect::from_size(10, 10)).unwrap();
            let mut d = DesignSpec::new("comb");
            d.instances = vec![InstanceSpec::new("u", "buf_1", CellKind::Comb).pin("X", "n")];
            d.nets = vec![NetSpec::new("n", PinRef::new("u", "X"), vec![])];
            let netlist = Netlist::build(d).unwrap();
            let placement = Placement::new(&fabric, &netlist);
            (fabric, netlist, placement)
        };
        let err = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap_err();
        assert!(matches!(err, CtsError::NoSinks));
    }

    #[test]
    fn unplaced_dff_is_an_error() {
        let (f, nl, _) = placed_dff_grid(2, 20);
        let empty = Placement::new(&f, &nl);
        let err = synthesize(&f, &nl, &empty, &CtsParams::default()).unwrap_err();
        assert!(matches!(err, CtsError::UnplacedSink { .. }));
    }

    #[test]
    fn fabric_exhaustion_is_an_error() {
        // One DFF slot for the sink and nothing else: the leaf buffer has
        // nowhere to go.
        let specs = vec![SlotSpec {
            name: "F_0".into(),
            x: 0,
            y: 0,
            kind: SlotKind::Dff,
        }];
        let fabric = Fabric::new(specs, Rect::from_size(10, 10)).unwrap();
        let mut d = DesignSpec::new("tight");
        d.instances =
            vec![InstanceSpec::new("ff0", "dfxtp_1", CellKind::Seq).pin("Q", "q")];
        d.nets = vec![NetSpec::new("q", PinRef::new("ff0", "Q"), vec![])];
        let netlist = Netlist::build(d).unwrap();

        let mut placement = Placement::new(&fabric, &netlist);
        let ff = netlist.instance("ff0").unwrap().id;
        placement
            .bind(&fabric, &netlist, ff, fabric.find("F_0").unwrap().id)
            .unwrap();

        let err = synthesize(&fabric, &netlist, &placement, &CtsParams::default()).unwrap_err();
        assert!(matches!(err, CtsError::NoBufferSlot { .. }));
    }

    #[test]
    fn deterministic_across_runs() {
        let (f, nl, p) = placed_dff_grid(3, 20);
        let t1 = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap();
        let t2 = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap();
        assert_eq!(t1.len(), t2.len());
        for (a, b) in t1.nodes().zip(t2.nodes()) {
            assert_eq!(a.slot, b.slot);
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.sinks, b.sinks);
        }
    }

    #[test]
    fn record_serializes_nested_ids() {
        let (f, nl, p) = placed_dff_grid(2, 20);
        let tree = synthesize(&f, &nl, &p, &CtsParams::default()).unwrap();
        let json = crate::tree::render_json(&tree, &f, &nl);
        let record: crate::tree::ClockTreeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.nodes.len(), tree.len());
        assert_eq!(record.root, tree.root().as_raw());
    }
}
