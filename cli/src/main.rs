//! Command-line runner for the housing market simulator
//!
//! Reads a JSON parameter file (missing keys take their defaults), runs the
//! model and prints one JSON line of monitors per tick.

use anyhow::{Context, Result};
use clap::Parser;
use housing_simulator_core_rs::{ModelConfig, Orchestrator};
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "housing-sim", version, about = "Run the housing market simulator")]
struct Args {
    /// JSON parameter file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 40)]
    ticks: usize,

    /// Override the configured RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Switch the prevailing annual rate (%) at this tick
    #[arg(long, requires = "shock_rate")]
    shock_tick: Option<usize>,

    /// Annual rate (%) applied from `--shock-tick`
    #[arg(long)]
    shock_rate: Option<f64>,

    /// Resume from a checkpoint written by `--snapshot-out`
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Write a checkpoint after the last tick
    #[arg(long)]
    snapshot_out: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<ModelConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ModelConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let config = load_config(&args)?;

    let mut model = match &args.resume {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Orchestrator::load_state(config, &json).context("restoring checkpoint")?
        }
        None => Orchestrator::new(config).context("setting up the city")?,
    };
    let summary = model.setup_summary();
    info!(
        "start at tick {}: {} households, {} houses ({} owner-occupiers and {} tenants at setup)",
        model.current_tick(),
        model.state().num_households(),
        model.state().num_houses(),
        summary.mortgage_households,
        summary.rent_households
    );

    for _ in 0..args.ticks {
        if let (Some(at), Some(rate)) = (args.shock_tick, args.shock_rate) {
            if model.current_tick() + 1 == at {
                model.set_interest_rate(rate)?;
            }
        }
        let result = model.tick()?;
        let line = serde_json::json!({
            "tick": result.tick,
            "households": result.households,
            "houses": result.houses,
            "monitors": model.monitors(),
        });
        println!("{}", line);
    }

    if let Some(path) = &args.snapshot_out {
        fs::write(path, model.save_state()?).with_context(|| format!("writing {}", path.display()))?;
        info!("checkpoint written to {}", path.display());
    }
    Ok(())
}
