//! Greedy initial placement.
//!
//! Seeds the annealer with a feasible placement that is already biased
//! toward short wires: instances are placed in fanout order (heaviest
//! drivers first), each onto the free kind-compatible slot nearest the
//! barycenter of its already-placed neighbours. An instance with no placed
//! neighbours aims for the die centre.

use crate::compat::slot_kind_for;
use crate::error::PlaceError;
use crate::state::Placement;
use strata_common::Point;
use strata_fabric::{Fabric, SlotId, SlotKind};
use strata_netlist::{InstId, Netlist, PinRole};

/// Fills an empty placement with every instance of the netlist.
///
/// Deterministic: rank ties break on instance name, slot-distance ties
/// break toward the lowest slot ID (row-major order). Fails with
/// [`PlaceError::Unplaceable`] when a kind runs out of free slots, before
/// anything is written for that instance.
pub fn seed(
    fabric: &Fabric,
    netlist: &Netlist,
    placement: &mut Placement,
) -> Result<(), PlaceError> {
    let fanouts: Vec<usize> = netlist.instances().map(|i| netlist.fanout(i.id)).collect();

    let mut order: Vec<InstId> = netlist.instances().map(|i| i.id).collect();
    order.sort_by(|&a, &b| {
        fanouts[b.index()]
            .cmp(&fanouts[a.index()])
            .then_with(|| netlist.inst(a).name.cmp(&netlist.inst(b).name))
    });

    for inst in order {
        let target = reference_point(fabric, netlist, placement, inst);
        let wanted = slot_kind_for(netlist.inst(inst).kind);

        let slot = nearest_free_slot(fabric, placement, wanted, target).ok_or_else(|| {
            PlaceError::Unplaceable {
                instance: netlist.inst(inst).name.clone(),
                wanted,
            }
        })?;

        placement.bind(fabric, netlist, inst, slot)?;
    }

    Ok(())
}

/// Barycenter of the placed neighbours of `inst`: the drivers of its input
/// nets and the sinks of its output nets. Falls back to the die centre when
/// no neighbour is placed yet.
fn reference_point(
    fabric: &Fabric,
    netlist: &Netlist,
    placement: &Placement,
    inst: InstId,
) -> Point {
    let mut neighbours: Vec<InstId> = Vec::new();
    for &pid in &netlist.inst(inst).pins {
        let pin = netlist.pin(pid);
        let net = netlist.net(pin.net);
        match pin.role {
            PinRole::Sink => neighbours.push(netlist.pin(net.driver).inst),
            PinRole::Driver => {
                neighbours.extend(net.sinks.iter().map(|&s| netlist.pin(s).inst));
            }
        }
    }
    neighbours.sort_unstable();
    neighbours.dedup();

    let mut sum_x = 0i64;
    let mut sum_y = 0i64;
    let mut count = 0i64;
    for nb in neighbours {
        if nb == inst {
            continue;
        }
        if let Some(slot) = placement.slot_of(nb) {
            let pos = fabric.slot(slot).pos;
            sum_x += pos.x;
            sum_y += pos.y;
            count += 1;
        }
    }

    if count == 0 {
        fabric.center()
    } else {
        Point::new(sum_x / count, sum_y / count)
    }
}

/// The free slot of the wanted kind closest to `target` by Manhattan
/// distance. The strict comparison over row-major iteration makes the
/// lowest slot ID win ties.
fn nearest_free_slot(
    fabric: &Fabric,
    placement: &Placement,
    wanted: SlotKind,
    target: Point,
) -> Option<SlotId> {
    let mut best: Option<(i64, SlotId)> = None;
    for &slot in fabric.slots_of_kind(wanted) {
        if !placement.is_free(slot) {
            continue;
        }
        let d = fabric.slot(slot).pos.manhattan(target);
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, slot));
        }
    }
    best.map(|(_, s)| s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::Rect;
    use strata_fabric::{SlotKind, SlotSpec};
    use strata_netlist::{CellKind, DesignSpec, InstanceSpec, NetSpec, PinRef};

    fn logic_grid_2x2() -> Fabric {
        let specs = vec![
            SlotSpec { name: "s00".into(), x: 0, y: 0, kind: SlotKind::Logic },
            SlotSpec { name: "s10".into(), x: 10, y: 0, kind: SlotKind::Logic },
            SlotSpec { name: "s01".into(), x: 0, y: 10, kind: SlotKind::Logic },
            SlotSpec { name: "s11".into(), x: 10, y: 10, kind: SlotKind::Logic },
        ];
        Fabric::new(specs, Rect::from_size(10, 10)).unwrap()
    }

    fn pair_design() -> Netlist {
        let mut d = DesignSpec::new("pair");
        d.instances = vec![
            InstanceSpec::new("a", "buf_1", CellKind::Comb).pin("X", "n"),
            InstanceSpec::new("b", "buf_1", CellKind::Comb).pin("A", "n"),
        ];
        d.nets = vec![NetSpec::new(
            "n",
            PinRef::new("a", "X"),
            vec![PinRef::new("b", "A")],
        )];
        Netlist::build(d).unwrap()
    }

    #[test]
    fn seeds_whole_design() {
        let f = logic_grid_2x2();
        let nl = pair_design();
        let mut p = Placement::new(&f, &nl);
        seed(&f, &nl, &mut p).unwrap();
        assert!(p.is_total());
        assert!(p.is_consistent());
    }

    #[test]
    fn tiny_deterministic_scenario() {
        // `a` drives `b`; `a` has the higher fanout so it places first, at
        // the slot nearest the die centre — lowest id on ties, which is
        // (0, 0). `b` then lands on the nearest free slot to `a`.
        let f = logic_grid_2x2();
        let nl = pair_design();
        let mut p = Placement::new(&f, &nl);
        seed(&f, &nl, &mut p).unwrap();

        let a = nl.instance("a").unwrap().id;
        let b = nl.instance("b").unwrap().id;
        let pos_a = f.slot(p.slot_of(a).unwrap()).pos;
        let pos_b = f.slot(p.slot_of(b).unwrap()).pos;
        assert_eq!(pos_a, Point::new(0, 0));
        assert_eq!(pos_b, Point::new(10, 0));
        assert_eq!(crate::cost::total_hpwl(&f, &nl, &p), 10);
    }

    #[test]
    fn determinism_across_runs() {
        let f = logic_grid_2x2();
        let nl = pair_design();

        let mut p1 = Placement::new(&f, &nl);
        seed(&f, &nl, &mut p1).unwrap();
        let mut p2 = Placement::new(&f, &nl);
        seed(&f, &nl, &mut p2).unwrap();

        for inst in nl.instances() {
            assert_eq!(p1.slot_of(inst.id), p2.slot_of(inst.id));
        }
    }

    #[test]
    fn kind_mismatch_is_unplaceable_before_any_write() {
        // A DFF instance over a logic-only fabric must fail without
        // touching the placement.
        let f = logic_grid_2x2();
        let mut d = DesignSpec::new("ff_only");
        d.instances = vec![
            InstanceSpec::new("ff", "dfxtp_1", CellKind::Seq).pin("Q", "q"),
            InstanceSpec::new("a", "buf_1", CellKind::Comb).pin("A", "q"),
        ];
        d.nets = vec![NetSpec::new(
            "q",
            PinRef::new("ff", "Q"),
            vec![PinRef::new("a", "A")],
        )];
        let nl = Netlist::build(d).unwrap();

        let mut p = Placement::new(&f, &nl);
        let err = seed(&f, &nl, &mut p).unwrap_err();
        assert!(matches!(err, PlaceError::Unplaceable { instance, .. } if instance == "ff"));
        assert_eq!(p.bound_count(), 0);
    }

    #[test]
    fn capacity_exhaustion_is_unplaceable() {
        let specs = vec![SlotSpec {
            name: "only".into(),
            x: 0,
            y: 0,
            kind: SlotKind::Logic,
        }];
        let f = Fabric::new(specs, Rect::from_size(10, 10)).unwrap();
        let nl = pair_design();

        let mut p = Placement::new(&f, &nl);
        let err = seed(&f, &nl, &mut p).unwrap_err();
        assert!(matches!(err, PlaceError::Unplaceable { .. }));
    }

    #[test]
    fn single_instance_single_slot() {
        let specs = vec![SlotSpec {
            name: "only".into(),
            x: 0,
            y: 0,
            kind: SlotKind::Logic,
        }];
        let f = Fabric::new(specs, Rect::from_size(10, 10)).unwrap();

        let mut d = DesignSpec::new("solo");
        d.instances = vec![InstanceSpec::new("u", "buf_1", CellKind::Comb).pin("X", "n")];
        d.nets = vec![NetSpec::new("n", PinRef::new("u", "X"), vec![])];
        let nl = Netlist::build(d).unwrap();

        let mut p = Placement::new(&f, &nl);
        seed(&f, &nl, &mut p).unwrap();
        assert!(p.is_total());
    }

    #[test]
    fn neighbour_barycenter_pulls_placement() {
        // Three-slot column; the sink `c` of high-fanout `hub` should end
        // adjacent to it rather than at the far end.
        let specs = vec![
            SlotSpec { name: "s0".into(), x: 0, y: 0, kind: SlotKind::Logic },
            SlotSpec { name: "s1".into(), x: 0, y: 10, kind: SlotKind::Logic },
            SlotSpec { name: "s2".into(), x: 0, y: 90, kind: SlotKind::Logic },
        ];
        let f = Fabric::new(specs, Rect::from_size(10, 90)).unwrap();

        let mut d = DesignSpec::new("pull");
        d.instances = vec![
            InstanceSpec::new("hub", "buf_1", CellKind::Comb)
                .pin("X", "h1")
                .pin("Y", "h2"),
            InstanceSpec::new("x", "buf_1", CellKind::Comb).pin("A", "h1"),
            InstanceSpec::new("y", "buf_1", CellKind::Comb).pin("A", "h2"),
        ];
        d.nets = vec![
            NetSpec::new("h1", PinRef::new("hub", "X"), vec![PinRef::new("x", "A")]),
            NetSpec::new("h2", PinRef::new("hub", "Y"), vec![PinRef::new("y", "A")]),
        ];
        let nl = Netlist::build(d).unwrap();

        let mut p = Placement::new(&f, &nl);
        seed(&f, &nl, &mut p).unwrap();

        // hub places first (fanout 2) near the die centre: s1 at (0,10).
        let hub = nl.instance("hub").unwrap().id;
        assert_eq!(f.slot(p.slot_of(hub).unwrap()).pos, Point::new(0, 10));
        // x and y then cluster around hub, leaving the far slot last.
        let x = nl.instance("x").unwrap().id;
        assert_eq!(f.slot(p.slot_of(x).unwrap()).pos, Point::new(0, 0));
    }
}
