//! The flow itself: load → place → clock tree → rewrite → artifacts.
//!
//! Artifacts are rendered in memory first and written together at the end,
//! so a failure in any stage leaves nothing half-written on disk.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use strata_cts::CtsParams;
use strata_place::{SaHooks, SaParams, TempStats};

use crate::{Cli, Preset};

/// Runs the full flow. Returns the process exit code.
pub fn run(cli: &Cli) -> Result<i32, Box<dyn Error>> {
    let fabric = strata_fabric::load_fabric(Path::new(&cli.fabric))?;
    if !cli.quiet {
        eprintln!(
            "    Fabric {} slots, die {}x{} um",
            fabric.len(),
            fabric.die().width(),
            fabric.die().height()
        );
    }

    let design_path = PathBuf::from(&cli.designs_dir).join(format!("{}_mapped.json", cli.design));
    let netlist = strata_netlist::load_design_with_clock(&design_path, cli.clock.as_deref())?;
    if !cli.quiet {
        eprintln!(
            "    Design {}: {} instances, {} nets",
            netlist.name(),
            netlist.inst_count(),
            netlist.net_count()
        );
    }

    let params = effective_params(cli);
    let mut hooks = SaHooks {
        reporter: Some(Box::new(progress_reporter(cli.quiet))),
        ..Default::default()
    };
    let (placement, stats) = strata_place::place(&fabric, &netlist, &params, &mut hooks)?;

    if !cli.quiet {
        let gain = stats.initial_cost - stats.final_cost;
        eprintln!(
            "    Placed: HPWL {} -> {} um ({} temps, {}/{} accepted)",
            stats.initial_cost,
            stats.final_cost,
            stats.temps.len(),
            stats.accepts,
            stats.attempts
        );
        if stats.initial_cost > 0 {
            eprintln!(
                "    Improvement {:.1}%",
                gain as f64 * 100.0 / stats.initial_cost as f64
            );
        }
    }

    // Render everything before touching the filesystem.
    let placement_map = strata_place::render_placement_map(&fabric, &netlist, &placement);
    let fabric_map = strata_place::render_fabric_map(&fabric, &netlist, &placement);

    let has_flops = netlist
        .instances()
        .any(|i| i.kind == strata_netlist::CellKind::Seq);

    let (tree_json, final_netlist) = if has_flops {
        let cts_params = CtsParams {
            max_fanout: cli.max_fanout,
            buffer_cell: cli.buffer_cell.clone(),
        };
        let tree = strata_cts::synthesize(&fabric, &netlist, &placement, &cts_params)?;
        if !cli.quiet {
            eprintln!(
                "    Clock tree: {} buffers, depth {}, {} sinks",
                tree.len(),
                tree.depth(),
                tree.all_sinks().len()
            );
        }
        let json = strata_cts::render_json(&tree, &fabric, &netlist);
        let rewritten =
            strata_eco::rewrite(&netlist, &placement, &tree, &fabric, &cli.buffer_cell)?;
        (Some(json), rewritten)
    } else {
        if !cli.quiet {
            eprintln!("    Clock tree: skipped (no flip-flops)");
        }
        let names = strata_eco::slot_name_map(&netlist, &placement, &fabric);
        (None, strata_eco::rename_instances(&netlist, &names)?)
    };

    let verilog = strata_eco::render_verilog(&final_netlist);

    let out_dir = cli
        .out_dir
        .clone()
        .unwrap_or_else(|| format!("build/{}", cli.design));
    let out_dir = Path::new(&out_dir);
    fs::create_dir_all(out_dir)?;

    write_artifact(out_dir, &format!("{}_placement.map", cli.design), &placement_map, cli)?;
    write_artifact(out_dir, &format!("{}_fabric.map", cli.design), &fabric_map, cli)?;
    if let Some(json) = &tree_json {
        write_artifact(out_dir, &format!("{}_clock_tree.json", cli.design), json, cli)?;
    }
    write_artifact(out_dir, &format!("{}_final.v", cli.design), &verilog, cli)?;
    if cli.trace {
        let mut buf = Vec::new();
        strata_place::write_sa_trace(&mut buf, &stats.temps)?;
        write_artifact(
            out_dir,
            &format!("{}_sa_trace.csv", cli.design),
            &String::from_utf8(buf)?,
            cli,
        )?;
    }

    if !cli.quiet {
        eprintln!("    Done.");
    }
    Ok(0)
}

/// Resolves the annealing parameters: preset base, CLI overrides on top.
pub fn effective_params(cli: &Cli) -> SaParams {
    let mut params = match cli.preset {
        Preset::Balanced => SaParams::balanced(),
        Preset::Explorer => SaParams::explorer(),
    };
    params.seed = cli.seed;
    if let Some(t0) = cli.t0 {
        params.t0 = t0;
    }
    if let Some(alpha) = cli.alpha {
        params.alpha = alpha;
    }
    if let Some(moves) = cli.moves_per_temp {
        params.moves_per_temp = moves;
    }
    if let Some(p) = cli.prob_refine {
        params.prob_refine = p;
    }
    if let Some(t_min) = cli.t_min {
        params.t_min = t_min;
    }
    if let Some(stall) = cli.max_stall {
        params.max_stall = stall;
    }
    params
}

/// Prints every tenth temperature step; the full trace goes to the CSV.
fn progress_reporter(quiet: bool) -> impl FnMut(&TempStats) {
    let mut count = 0usize;
    move |ts: &TempStats| {
        count += 1;
        if quiet || count % 10 != 0 {
            return;
        }
        eprintln!(
            "      T={:9.4}  cost={:8}  accept={:3}/{:3}  t={}ms",
            ts.temperature, ts.cost, ts.accepts, ts.attempts, ts.elapsed_ms
        );
    }
}

fn write_artifact(dir: &Path, name: &str, content: &str, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    if !cli.quiet {
        eprintln!("   Wrote {}", path.display());
    }
    Ok(())
}
