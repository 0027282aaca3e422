//! Clock tree materialization and the fabric rename.

use crate::error::EcoError;
use std::collections::{BTreeMap, HashMap, HashSet};
use strata_cts::{ClockTree, CtsNodeId};
use strata_fabric::Fabric;
use strata_netlist::{
    CellKind, DesignSpec, InstId, InstanceSpec, Netlist, NetSpec, PinRef, PinRole,
};
use strata_place::Placement;

/// The full engineering change: insert the clock tree, then rename every
/// instance to its fabric slot name.
///
/// Pure: inputs are untouched; the returned netlist is freshly validated.
/// Fails with [`EcoError::MissingBinding`] if any instance is unplaced and
/// [`EcoError::RenameCollision`] if two instances map to one fabric name.
pub fn rewrite(
    netlist: &Netlist,
    placement: &Placement,
    tree: &ClockTree,
    fabric: &Fabric,
    buffer_cell: &str,
) -> Result<Netlist, EcoError> {
    for inst in netlist.instances() {
        if placement.slot_of(inst.id).is_none() {
            return Err(EcoError::MissingBinding {
                instance: inst.name.clone(),
            });
        }
    }

    let with_tree = insert_clock_tree(netlist, tree, fabric, buffer_cell)?;
    let names = slot_name_map(netlist, placement, fabric);
    rename_instances(&with_tree, &names)
}

/// Net driven by a tree node's buffer output.
fn tree_net_name(id: CtsNodeId) -> String {
    format!("clk_htree_{}", id.as_raw())
}

/// Materializes the clock buffers and rewires the flip-flop clock pins.
///
/// The root buffer's input is the original clock net; every node output is
/// a fresh net; leaf outputs take over the clock pins of their sinks. Any
/// non-sequential consumer of the clock net keeps its original connection.
pub fn insert_clock_tree(
    netlist: &Netlist,
    tree: &ClockTree,
    fabric: &Fabric,
    buffer_cell: &str,
) -> Result<Netlist, EcoError> {
    let clock = netlist.clock().ok_or(EcoError::NoClock)?;
    let clock_name = netlist.net(clock).name.clone();

    // Which leaf net serves each flip-flop.
    let mut leaf_net: HashMap<InstId, String> = HashMap::new();
    for leaf in tree.leaves() {
        for &sink in &leaf.sinks {
            leaf_net.insert(sink, tree_net_name(leaf.id));
        }
    }

    // The clock pins each served flip-flop holds on the clock net.
    let mut clock_pins: HashMap<InstId, Vec<String>> = HashMap::new();
    for &pin_id in &netlist.net(clock).sinks {
        let pin = netlist.pin(pin_id);
        if leaf_net.contains_key(&pin.inst) {
            clock_pins
                .entry(pin.inst)
                .or_default()
                .push(pin.name.clone());
        }
    }

    let buffer_name = |id: CtsNodeId| fabric.slot(tree.node(id).slot).name.clone();

    let mut spec = DesignSpec::new(netlist.name());
    spec.clock = Some(clock_name.clone());

    // Original instances, with served clock pins moved to their leaf nets.
    for inst in netlist.instances() {
        let served = leaf_net.get(&inst.id);
        if served.is_some() && !clock_pins.contains_key(&inst.id) {
            return Err(EcoError::MissingClockPin {
                instance: inst.name.clone(),
            });
        }

        let mut ispec = InstanceSpec::new(&inst.name, &inst.cell, inst.kind);
        for &pid in &inst.pins {
            let pin = netlist.pin(pid);
            let net = match served {
                Some(leaf) if pin.net == clock && pin.role == PinRole::Sink => leaf.clone(),
                _ => netlist.net(pin.net).name.clone(),
            };
            ispec = ispec.pin(&pin.name, net);
        }
        spec.instances.push(ispec);
    }

    // Parent edges give each buffer its input net.
    let mut parent: HashMap<CtsNodeId, CtsNodeId> = HashMap::new();
    for node in tree.nodes() {
        for &child in &node.children {
            parent.insert(child, node.id);
        }
    }

    for node in tree.nodes() {
        let input = match parent.get(&node.id) {
            Some(&p) => tree_net_name(p),
            None => clock_name.clone(),
        };
        spec.instances.push(
            InstanceSpec::new(buffer_name(node.id), buffer_cell, CellKind::Comb)
                .pin("A", input)
                .pin("X", tree_net_name(node.id)),
        );
    }

    // Original nets. The clock net keeps its driver and its non-sequential
    // consumers and gains the root buffer as a sink.
    for net in netlist.nets() {
        let driver_pin = netlist.pin(net.driver);
        let driver = PinRef::new(
            netlist.inst(driver_pin.inst).name.clone(),
            driver_pin.name.clone(),
        );

        let mut sinks: Vec<PinRef> = net
            .sinks
            .iter()
            .map(|&s| netlist.pin(s))
            .filter(|p| !(net.id == clock && leaf_net.contains_key(&p.inst)))
            .map(|p| PinRef::new(netlist.inst(p.inst).name.clone(), p.name.clone()))
            .collect();
        if net.id == clock {
            sinks.push(PinRef::new(buffer_name(tree.root()), "A"));
        }

        spec.nets.push(NetSpec::new(&net.name, driver, sinks));
    }

    // Tree nets: internal edges drive child buffers, leaf edges drive the
    // flip-flop clock pins.
    for node in tree.nodes() {
        let driver = PinRef::new(buffer_name(node.id), "X");
        let mut sinks = Vec::new();
        if node.is_leaf() {
            for &sink in &node.sinks {
                let inst_name = &netlist.inst(sink).name;
                for pin in clock_pins.get(&sink).into_iter().flatten() {
                    sinks.push(PinRef::new(inst_name.clone(), pin.clone()));
                }
            }
        } else {
            for &child in &node.children {
                sinks.push(PinRef::new(buffer_name(child), "A"));
            }
        }
        spec.nets.push(NetSpec::new(tree_net_name(node.id), driver, sinks));
    }

    Ok(Netlist::build(spec)?)
}

/// The logical-name → fabric-slot-name map induced by a placement.
pub fn slot_name_map(
    netlist: &Netlist,
    placement: &Placement,
    fabric: &Fabric,
) -> BTreeMap<String, String> {
    netlist
        .instances()
        .filter_map(|inst| {
            let slot = placement.slot_of(inst.id)?;
            Some((inst.name.clone(), fabric.slot(slot).name.clone()))
        })
        .collect()
}

/// Renames instances through the given map.
///
/// Names absent from the map pass through untouched, which makes the
/// rename idempotent: a second application over already-renamed instances
/// changes nothing. Fails with [`EcoError::RenameCollision`] if two
/// instances end up sharing a name.
pub fn rename_instances(
    netlist: &Netlist,
    names: &BTreeMap<String, String>,
) -> Result<Netlist, EcoError> {
    let renamed = |name: &str| -> String {
        names
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    };

    let mut seen = HashSet::new();
    let mut spec = DesignSpec::new(netlist.name());
    spec.clock = netlist.clock().map(|c| netlist.net(c).name.clone());

    for inst in netlist.instances() {
        let new_name = renamed(&inst.name);
        if !seen.insert(new_name.clone()) {
            return Err(EcoError::RenameCollision { name: new_name });
        }
        let mut ispec = InstanceSpec::new(new_name, &inst.cell, inst.kind);
        for &pid in &inst.pins {
            let pin = netlist.pin(pid);
            ispec = ispec.pin(&pin.name, netlist.net(pin.net).name.clone());
        }
        spec.instances.push(ispec);
    }

    for net in netlist.nets() {
        let driver_pin = netlist.pin(net.driver);
        let driver = PinRef::new(renamed(&netlist.inst(driver_pin.inst).name), &driver_pin.name);
        let sinks = net
            .sinks
            .iter()
            .map(|&s| {
                let pin = netlist.pin(s);
                PinRef::new(renamed(&netlist.inst(pin.inst).name), &pin.name)
            })
            .collect();
        spec.nets.push(NetSpec::new(&net.name, driver, sinks));
    }

    Ok(Netlist::build(spec)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::Rect;
    use strata_cts::{synthesize, CtsParams};
    use strata_fabric::{SlotKind, SlotSpec};
    use strata_place::{place, SaHooks, SaParams};

    fn slot(name: &str, x: i64, y: i64, kind: SlotKind) -> SlotSpec {
        SlotSpec {
            name: name.into(),
            x,
            y,
            kind,
        }
    }

    /// Two flip-flops fed by an inverter loop, plus clock and output pads.
    fn clocked_design() -> (Fabric, Netlist) {
        let fabric = Fabric::new(
            vec![
                slot("L0", 10, 0, SlotKind::Logic),
                slot("L1", 20, 0, SlotKind::Logic),
                slot("L2", 30, 0, SlotKind::Logic),
                slot("L3", 40, 0, SlotKind::Logic),
                slot("F0", 10, 10, SlotKind::Dff),
                slot("F1", 30, 10, SlotKind::Dff),
                slot("IO0", 0, 20, SlotKind::Io),
                slot("IO1", 20, 20, SlotKind::Io),
                slot("IO2", 40, 20, SlotKind::Io),
            ],
            Rect::from_size(40, 20),
        )
        .unwrap();

        let mut d = DesignSpec::new("pair_regs");
        d.instances = vec![
            InstanceSpec::new("p_clk", "inpad", CellKind::Io).pin("PAD", "clk"),
            InstanceSpec::new("inv_a", "sky130_fd_sc_hd__inv_1", CellKind::Comb)
                .pin("A", "q0")
                .pin("Y", "d0"),
            InstanceSpec::new("reg0", "sky130_fd_sc_hd__dfxtp_1", CellKind::Seq)
                .pin("CLK", "clk")
                .pin("D", "d0")
                .pin("Q", "q0"),
            InstanceSpec::new("reg1", "sky130_fd_sc_hd__dfxtp_1", CellKind::Seq)
                .pin("CLK", "clk")
                .pin("D", "q0")
                .pin("Q", "q1"),
            InstanceSpec::new("p_q", "outpad", CellKind::Io).pin("PAD", "q1"),
        ];
        d.nets = vec![
            NetSpec::new(
                "clk",
                PinRef::new("p_clk", "PAD"),
                vec![PinRef::new("reg0", "CLK"), PinRef::new("reg1", "CLK")],
            ),
            NetSpec::new("d0", PinRef::new("inv_a", "Y"), vec![PinRef::new("reg0", "D")]),
            NetSpec::new(
                "q0",
                PinRef::new("reg0", "Q"),
                vec![PinRef::new("inv_a", "A"), PinRef::new("reg1", "D")],
            ),
            NetSpec::new("q1", PinRef::new("reg1", "Q"), vec![PinRef::new("p_q", "PAD")]),
        ];
        (fabric, Netlist::build(d).unwrap())
    }

    fn placed(fabric: &Fabric, netlist: &Netlist) -> Placement {
        let params = SaParams::balanced().with_seed(11);
        let (placement, _) = place(fabric, netlist, &params, &mut SaHooks::default()).unwrap();
        placement
    }

    #[test]
    fn rewrite_inserts_buffers_and_rewires_clocks() {
        let (fabric, netlist) = clocked_design();
        let placement = placed(&fabric, &netlist);
        let tree = synthesize(&fabric, &netlist, &placement, &CtsParams::default()).unwrap();

        let out = rewrite(&netlist, &placement, &tree, &fabric, "sky130_fd_sc_hd__clkbuf_4")
            .unwrap();

        // Both flip-flops and every buffer survive.
        assert_eq!(out.inst_count(), netlist.inst_count() + tree.len());

        // The flat clock net now feeds only the root buffer.
        let clk = out.net_by_name("clk").unwrap();
        assert_eq!(clk.sinks.len(), 1);
        let root_sink = out.pin(clk.sinks[0]);
        assert_eq!(root_sink.name, "A");
        assert_eq!(
            out.inst(root_sink.inst).name,
            fabric.slot(tree.node(tree.root()).slot).name
        );

        // Each flip-flop's clock pin sits on a leaf net.
        for reg_slot in ["reg0", "reg1"] {
            let slot_name = {
                let inst = netlist.instance(reg_slot).unwrap();
                let s = placement.slot_of(inst.id).unwrap();
                fabric.slot(s).name.clone()
            };
            let inst = out.instance(&slot_name).unwrap();
            let clk_pin = inst
                .pins
                .iter()
                .map(|&p| out.pin(p))
                .find(|p| p.name == "CLK")
                .unwrap();
            assert!(out.net(clk_pin.net).name.starts_with("clk_htree_"));
        }
    }

    #[test]
    fn rewrite_renames_to_slot_names() {
        let (fabric, netlist) = clocked_design();
        let placement = placed(&fabric, &netlist);
        let tree = synthesize(&fabric, &netlist, &placement, &CtsParams::default()).unwrap();

        let out = rewrite(&netlist, &placement, &tree, &fabric, "sky130_fd_sc_hd__clkbuf_4")
            .unwrap();

        for inst in out.instances() {
            assert!(
                fabric.find(&inst.name).is_some(),
                "instance `{}` is not a fabric slot name",
                inst.name
            );
        }
    }

    #[test]
    fn rename_is_idempotent() {
        let (fabric, netlist) = clocked_design();
        let placement = placed(&fabric, &netlist);
        let names = slot_name_map(&netlist, &placement, &fabric);

        let once = rename_instances(&netlist, &names).unwrap();
        let twice = rename_instances(&once, &names).unwrap();

        let names_once: Vec<_> = once.instances().map(|i| i.name.clone()).collect();
        let names_twice: Vec<_> = twice.instances().map(|i| i.name.clone()).collect();
        assert_eq!(names_once, names_twice);
        assert_eq!(
            crate::verilog::render_verilog(&once),
            crate::verilog::render_verilog(&twice)
        );
    }

    #[test]
    fn rename_collision_is_fatal() {
        let (_, netlist) = clocked_design();
        let mut names = BTreeMap::new();
        names.insert("reg0".to_string(), "F_SAME".to_string());
        names.insert("reg1".to_string(), "F_SAME".to_string());
        let err = rename_instances(&netlist, &names).unwrap_err();
        assert!(matches!(err, EcoError::RenameCollision { name } if name == "F_SAME"));
    }

    #[test]
    fn missing_binding_is_fatal() {
        let (fabric, netlist) = clocked_design();
        let placement = placed(&fabric, &netlist);
        let tree = synthesize(&fabric, &netlist, &placement, &CtsParams::default()).unwrap();

        let empty = Placement::new(&fabric, &netlist);
        let err = rewrite(&netlist, &empty, &tree, &fabric, "buf").unwrap_err();
        assert!(matches!(err, EcoError::MissingBinding { .. }));
    }

    #[test]
    fn clockless_design_is_fatal() {
        let fabric = Fabric::new(
            vec![slot("L0", 0, 0, SlotKind::Logic), slot("L1", 10, 0, SlotKind::Logic)],
            Rect::from_size(10, 10),
        )
        .unwrap();
        let mut d = DesignSpec::new("comb_only");
        d.instances = vec![
            InstanceSpec::new("u0", "inv_1", CellKind::Comb).pin("Y", "n"),
            InstanceSpec::new("u1", "inv_1", CellKind::Comb).pin("A", "n"),
        ];
        d.nets = vec![NetSpec::new("n", PinRef::new("u0", "Y"), vec![PinRef::new("u1", "A")])];
        let netlist = Netlist::build(d).unwrap();
        let placement = placed(&fabric, &netlist);

        // Borrow a tree from an unrelated clocked design; the clockless
        // netlist must be rejected before the tree is even looked at.
        let (f2, nl2) = clocked_design();
        let p2 = placed(&f2, &nl2);
        let tree = synthesize(&f2, &nl2, &p2, &CtsParams::default()).unwrap();

        let err = insert_clock_tree(&netlist, &tree, &fabric, "buf").unwrap_err();
        assert!(matches!(err, EcoError::NoClock));
        let _ = placement;
    }

    #[test]
    fn inputs_are_not_mutated() {
        let (fabric, netlist) = clocked_design();
        let placement = placed(&fabric, &netlist);
        let tree = synthesize(&fabric, &netlist, &placement, &CtsParams::default()).unwrap();

        let before: Vec<_> = netlist.instances().map(|i| i.name.clone()).collect();
        let _ = rewrite(&netlist, &placement, &tree, &fabric, "buf_x").unwrap();
        let after: Vec<_> = netlist.instances().map(|i| i.name.clone()).collect();
        assert_eq!(before, after);
        assert!(placement.is_consistent());
    }
}
