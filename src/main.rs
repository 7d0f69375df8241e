use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use companions::demo::{self, DemoOptions};
use server_core::config::FileConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless companion follow service demo", long_about = None)]
struct Args {
    /// Ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Number of simulated owners
    #[arg(long, default_value_t = 4)]
    owners: usize,
    /// RNG seed for owner motion
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Chance per owner per tick of a long jump
    #[arg(long, default_value_t = 0.002)]
    teleport_chance: f64,
    /// Data root (defaults to COMPANIONS_DATA_ROOT or the workspace data/)
    #[arg(long)]
    data: Option<PathBuf>,
    /// Sleep one nominal tick (50 ms) between ticks
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let root = args.data.unwrap_or_else(data_runtime::loader::data_root);
    let telemetry = data_runtime::configs::telemetry::load_from(&root)?;
    let _guard = server_core::telemetry::init_telemetry(&telemetry)?;
    let opts = DemoOptions {
        ticks: args.ticks,
        owners: args.owners,
        seed: args.seed,
        teleport_chance: args.teleport_chance,
        realtime: args.realtime,
    };
    let summary = demo::run(&opts, FileConfig::new(root))?;
    println!(
        "companiond: {} ticks, {} owners, {} teleports, {} active at end, {} objects left",
        summary.ticks, summary.owners, summary.teleports, summary.active_at_end, summary.objects_after_shutdown
    );
    Ok(())
}
