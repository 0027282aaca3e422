//! Placement state: the instance ↔ slot bijection.
//!
//! Two dense arrays with `None` sentinels, kept in lockstep by every
//! operation. This is the single source of truth for where an instance
//! sits; no other component caches the mapping. All operations are O(1).

use crate::compat::{compatible, slot_kind_for};
use crate::error::PlaceError;
use strata_fabric::{Fabric, SlotId, SlotKind};
use strata_netlist::{InstId, Netlist};

/// A partial bijection from instances to fabric slots.
#[derive(Debug, Clone)]
pub struct Placement {
    slot_of: Vec<Option<SlotId>>,
    inst_of: Vec<Option<InstId>>,
    bound: usize,
}

impl Placement {
    /// Creates an empty placement sized for the given fabric and netlist.
    pub fn new(fabric: &Fabric, netlist: &Netlist) -> Self {
        Self {
            slot_of: vec![None; netlist.inst_count()],
            inst_of: vec![None; fabric.len()],
            bound: 0,
        }
    }

    /// The slot an instance is bound to, if any.
    pub fn slot_of(&self, inst: InstId) -> Option<SlotId> {
        self.slot_of[inst.index()]
    }

    /// The instance occupying a slot, if any.
    pub fn inst_of(&self, slot: SlotId) -> Option<InstId> {
        self.inst_of[slot.index()]
    }

    /// Returns whether a slot is unoccupied.
    pub fn is_free(&self, slot: SlotId) -> bool {
        self.inst_of[slot.index()].is_none()
    }

    /// Number of bound instances.
    pub fn bound_count(&self) -> usize {
        self.bound
    }

    /// Returns whether every instance of the netlist is bound.
    pub fn is_total(&self) -> bool {
        self.bound == self.slot_of.len()
    }

    /// Free slots of the given kind, in row-major fabric order.
    pub fn free_slots_of_kind(&self, fabric: &Fabric, kind: SlotKind) -> Vec<SlotId> {
        fabric
            .slots_of_kind(kind)
            .iter()
            .copied()
            .filter(|&s| self.is_free(s))
            .collect()
    }

    /// Binds an instance to a slot.
    ///
    /// Both sides must be free and the slot kind must match the instance's
    /// cell kind.
    pub fn bind(
        &mut self,
        fabric: &Fabric,
        netlist: &Netlist,
        inst: InstId,
        slot: SlotId,
    ) -> Result<(), PlaceError> {
        let cell = netlist.inst(inst);
        let site = fabric.slot(slot);
        if !compatible(cell.kind, site.kind) {
            return Err(PlaceError::KindMismatch {
                instance: cell.name.clone(),
                slot: site.name.clone(),
                wanted: slot_kind_for(cell.kind),
                actual: site.kind,
            });
        }
        if self.slot_of[inst.index()].is_some() {
            return Err(PlaceError::AlreadyBound {
                instance: cell.name.clone(),
            });
        }
        if self.inst_of[slot.index()].is_some() {
            return Err(PlaceError::SlotOccupied {
                slot: site.name.clone(),
            });
        }
        self.slot_of[inst.index()] = Some(slot);
        self.inst_of[slot.index()] = Some(inst);
        self.bound += 1;
        Ok(())
    }

    /// Unbinds an instance, returning the slot it held.
    pub fn unbind(&mut self, inst: InstId) -> Option<SlotId> {
        let slot = self.slot_of[inst.index()].take()?;
        self.inst_of[slot.index()] = None;
        self.bound -= 1;
        Some(slot)
    }

    /// Exchanges the slots of two bound instances.
    ///
    /// Both instances must be bound and each must be compatible with the
    /// other's slot.
    pub fn swap(
        &mut self,
        fabric: &Fabric,
        netlist: &Netlist,
        a: InstId,
        b: InstId,
    ) -> Result<(), PlaceError> {
        if a == b {
            return Ok(());
        }
        let slot_a = self.slot_of[a.index()].ok_or_else(|| PlaceError::NotBound {
            instance: netlist.inst(a).name.clone(),
        })?;
        let slot_b = self.slot_of[b.index()].ok_or_else(|| PlaceError::NotBound {
            instance: netlist.inst(b).name.clone(),
        })?;

        for (inst, slot) in [(a, slot_b), (b, slot_a)] {
            let cell = netlist.inst(inst);
            let site = fabric.slot(slot);
            if !compatible(cell.kind, site.kind) {
                return Err(PlaceError::KindMismatch {
                    instance: cell.name.clone(),
                    slot: site.name.clone(),
                    wanted: slot_kind_for(cell.kind),
                    actual: site.kind,
                });
            }
        }

        self.slot_of[a.index()] = Some(slot_b);
        self.slot_of[b.index()] = Some(slot_a);
        self.inst_of[slot_a.index()] = Some(b);
        self.inst_of[slot_b.index()] = Some(a);
        Ok(())
    }

    /// Moves a bound instance to a free, kind-compatible slot.
    ///
    /// The degenerate form of a swap where the target side is unbound.
    pub fn relocate(
        &mut self,
        fabric: &Fabric,
        netlist: &Netlist,
        inst: InstId,
        target: SlotId,
    ) -> Result<(), PlaceError> {
        let cell = netlist.inst(inst);
        let from = self.slot_of[inst.index()].ok_or_else(|| PlaceError::NotBound {
            instance: cell.name.clone(),
        })?;
        if from == target {
            return Ok(());
        }
        let site = fabric.slot(target);
        if !compatible(cell.kind, site.kind) {
            return Err(PlaceError::KindMismatch {
                instance: cell.name.clone(),
                slot: site.name.clone(),
                wanted: slot_kind_for(cell.kind),
                actual: site.kind,
            });
        }
        if self.inst_of[target.index()].is_some() {
            return Err(PlaceError::SlotOccupied {
                slot: site.name.clone(),
            });
        }
        self.inst_of[from.index()] = None;
        self.inst_of[target.index()] = Some(inst);
        self.slot_of[inst.index()] = Some(target);
        Ok(())
    }

    /// Checks that the forward and inverse maps agree everywhere.
    ///
    /// O(n); intended for tests and debug sweeps, not the inner loop.
    pub fn is_consistent(&self) -> bool {
        let forward_ok = self.slot_of.iter().enumerate().all(|(i, s)| match s {
            Some(slot) => self.inst_of[slot.index()] == Some(InstId::from_raw(i as u32)),
            None => true,
        });
        let backward_ok = self.inst_of.iter().enumerate().all(|(s, i)| match i {
            Some(inst) => self.slot_of[inst.index()] == Some(SlotId::from_raw(s as u32)),
            None => true,
        });
        let count_ok = self.slot_of.iter().filter(|s| s.is_some()).count() == self.bound;
        forward_ok && backward_ok && count_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::Rect;
    use strata_fabric::data::SlotSpec;
    use strata_netlist::{CellKind, DesignSpec, InstanceSpec, NetSpec, PinRef};

    fn fabric() -> Fabric {
        let specs = vec![
            SlotSpec { name: "l0".into(), x: 0, y: 0, kind: SlotKind::Logic },
            SlotSpec { name: "l1".into(), x: 10, y: 0, kind: SlotKind::Logic },
            SlotSpec { name: "f0".into(), x: 0, y: 10, kind: SlotKind::Dff },
        ];
        Fabric::new(specs, Rect::from_size(10, 10)).unwrap()
    }

    fn netlist() -> Netlist {
        let mut d = DesignSpec::new("t");
        d.instances = vec![
            InstanceSpec::new("a", "inv_1", CellKind::Comb).pin("Y", "n"),
            InstanceSpec::new("b", "inv_1", CellKind::Comb).pin("A", "n"),
            InstanceSpec::new("ff", "dfxtp_1", CellKind::Seq).pin("D", "n"),
        ];
        d.nets = vec![NetSpec::new(
            "n",
            PinRef::new("a", "Y"),
            vec![PinRef::new("b", "A"), PinRef::new("ff", "D")],
        )];
        Netlist::build(d).unwrap()
    }

    fn ids(nl: &Netlist) -> (InstId, InstId, InstId) {
        (
            nl.instance("a").unwrap().id,
            nl.instance("b").unwrap().id,
            nl.instance("ff").unwrap().id,
        )
    }

    #[test]
    fn bind_and_unbind() {
        let f = fabric();
        let nl = netlist();
        let (a, _, _) = ids(&nl);
        let l0 = f.find("l0").unwrap().id;

        let mut p = Placement::new(&f, &nl);
        p.bind(&f, &nl, a, l0).unwrap();
        assert_eq!(p.slot_of(a), Some(l0));
        assert_eq!(p.inst_of(l0), Some(a));
        assert_eq!(p.bound_count(), 1);
        assert!(p.is_consistent());

        assert_eq!(p.unbind(a), Some(l0));
        assert!(p.is_free(l0));
        assert_eq!(p.bound_count(), 0);
        assert!(p.is_consistent());
    }

    #[test]
    fn bind_rejects_kind_mismatch() {
        let f = fabric();
        let nl = netlist();
        let (_, _, ff) = ids(&nl);
        let l0 = f.find("l0").unwrap().id;

        let mut p = Placement::new(&f, &nl);
        let err = p.bind(&f, &nl, ff, l0).unwrap_err();
        assert!(matches!(err, PlaceError::KindMismatch { .. }));
        // Nothing was written.
        assert_eq!(p.bound_count(), 0);
        assert!(p.is_free(l0));
    }

    #[test]
    fn bind_rejects_occupied_slot_and_double_bind() {
        let f = fabric();
        let nl = netlist();
        let (a, b, _) = ids(&nl);
        let l0 = f.find("l0").unwrap().id;
        let l1 = f.find("l1").unwrap().id;

        let mut p = Placement::new(&f, &nl);
        p.bind(&f, &nl, a, l0).unwrap();
        assert!(matches!(
            p.bind(&f, &nl, b, l0),
            Err(PlaceError::SlotOccupied { .. })
        ));
        assert!(matches!(
            p.bind(&f, &nl, a, l1),
            Err(PlaceError::AlreadyBound { .. })
        ));
    }

    #[test]
    fn swap_exchanges_bindings() {
        let f = fabric();
        let nl = netlist();
        let (a, b, _) = ids(&nl);
        let l0 = f.find("l0").unwrap().id;
        let l1 = f.find("l1").unwrap().id;

        let mut p = Placement::new(&f, &nl);
        p.bind(&f, &nl, a, l0).unwrap();
        p.bind(&f, &nl, b, l1).unwrap();
        p.swap(&f, &nl, a, b).unwrap();
        assert_eq!(p.slot_of(a), Some(l1));
        assert_eq!(p.slot_of(b), Some(l0));
        assert!(p.is_consistent());
    }

    #[test]
    fn swap_rejects_cross_kind() {
        let f = fabric();
        let nl = netlist();
        let (a, _, ff) = ids(&nl);
        let l0 = f.find("l0").unwrap().id;
        let f0 = f.find("f0").unwrap().id;

        let mut p = Placement::new(&f, &nl);
        p.bind(&f, &nl, a, l0).unwrap();
        p.bind(&f, &nl, ff, f0).unwrap();
        let err = p.swap(&f, &nl, a, ff).unwrap_err();
        assert!(matches!(err, PlaceError::KindMismatch { .. }));
        // Untouched on failure.
        assert_eq!(p.slot_of(a), Some(l0));
        assert_eq!(p.slot_of(ff), Some(f0));
        assert!(p.is_consistent());
    }

    #[test]
    fn relocate_moves_to_free_slot() {
        let f = fabric();
        let nl = netlist();
        let (a, _, _) = ids(&nl);
        let l0 = f.find("l0").unwrap().id;
        let l1 = f.find("l1").unwrap().id;

        let mut p = Placement::new(&f, &nl);
        p.bind(&f, &nl, a, l0).unwrap();
        p.relocate(&f, &nl, a, l1).unwrap();
        assert_eq!(p.slot_of(a), Some(l1));
        assert!(p.is_free(l0));
        assert!(p.is_consistent());
    }

    #[test]
    fn relocate_rejects_occupied_target() {
        let f = fabric();
        let nl = netlist();
        let (a, b, _) = ids(&nl);
        let l0 = f.find("l0").unwrap().id;
        let l1 = f.find("l1").unwrap().id;

        let mut p = Placement::new(&f, &nl);
        p.bind(&f, &nl, a, l0).unwrap();
        p.bind(&f, &nl, b, l1).unwrap();
        assert!(matches!(
            p.relocate(&f, &nl, a, l1),
            Err(PlaceError::SlotOccupied { .. })
        ));
    }

    #[test]
    fn free_slots_view_tracks_occupancy() {
        let f = fabric();
        let nl = netlist();
        let (a, _, _) = ids(&nl);
        let l0 = f.find("l0").unwrap().id;

        let mut p = Placement::new(&f, &nl);
        assert_eq!(p.free_slots_of_kind(&f, SlotKind::Logic).len(), 2);
        p.bind(&f, &nl, a, l0).unwrap();
        let free = p.free_slots_of_kind(&f, SlotKind::Logic);
        assert_eq!(free.len(), 1);
        assert!(!free.contains(&l0));
    }
}
