//! strata CLI — drives the full physical design flow for one design:
//! load fabric + mapped design, place (greedy seed + simulated annealing),
//! synthesize the clock tree, apply the engineering change, and write the
//! output artifacts.
//!
//! All configuration flows through these flags; the core reads no
//! environment variables.

#![warn(missing_docs)]

mod pipeline;

use clap::{Parser, ValueEnum};
use std::process;

/// strata — structured-ASIC placement, clock tree synthesis, and ECO.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Structured-ASIC physical design flow")]
pub struct Cli {
    /// Design name; reads `<designs-dir>/<design>_mapped.json`.
    #[arg(long)]
    pub design: String,

    /// Path to the fabric description.
    #[arg(long, default_value = "fabric/fabric.json")]
    pub fabric: String,

    /// Directory holding mapped design files.
    #[arg(long, default_value = "designs")]
    pub designs_dir: String,

    /// Output directory. Defaults to `build/<design>`.
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Annealing RNG seed. Identical seeds reproduce identical results.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Annealing schedule preset.
    #[arg(long, value_enum, default_value_t = Preset::Balanced)]
    pub preset: Preset,

    /// Initial temperature (overrides the preset).
    #[arg(long)]
    pub t0: Option<f64>,

    /// Geometric cooling ratio, 0 < alpha < 1 (overrides the preset).
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Moves attempted per temperature (overrides the preset).
    #[arg(long)]
    pub moves_per_temp: Option<u32>,

    /// Probability of a refine move versus an explore move (overrides the
    /// preset).
    #[arg(long)]
    pub prob_refine: Option<f64>,

    /// Stopping temperature (overrides the preset).
    #[arg(long)]
    pub t_min: Option<f64>,

    /// Consecutive zero-accept temperatures before an early exit
    /// (overrides the preset).
    #[arg(long)]
    pub max_stall: Option<u32>,

    /// Clock net name. Defaults to auto-detection (`clk`).
    #[arg(long)]
    pub clock: Option<String>,

    /// Maximum clock-buffer fanout.
    #[arg(long, default_value_t = 4)]
    pub max_fanout: usize,

    /// Library cell for synthesized clock buffers.
    #[arg(long, default_value = "sky130_fd_sc_hd__clkbuf_4")]
    pub buffer_cell: String,

    /// Also write the per-temperature annealing trace CSV.
    #[arg(long)]
    pub trace: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Named annealing schedules.
///
/// `balanced` is the recommended default; `explorer` cools slower with a
/// stronger refine bias and tends to win on larger designs at the price of
/// runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// alpha=0.92, prob_refine=0.50.
    Balanced,
    /// alpha=0.97, prob_refine=0.70.
    Explorer,
}

fn main() {
    let cli = Cli::parse();
    match pipeline::run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
