use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use server_core::companion::CompanionDefinition;

#[derive(Parser)]
#[command(author, version, about = "Workspace automation tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// fmt + clippy -D warnings + tests + schema check (workspace)
    Ci,
    /// Validate companion definitions and tuning files under data/
    SchemaCheck {
        /// Data root (defaults to the workspace data/)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn run(cmd: &mut Command) -> Result<()> {
    let status = cmd.status().context("spawn")?;
    if !status.success() {
        bail!("command failed: {:?}", cmd);
    }
    Ok(())
}

fn cargo(args: &[&str]) -> Result<()> {
    let mut c = Command::new("cargo");
    c.args(args).stdout(Stdio::inherit()).stderr(Stdio::inherit());
    run(&mut c)
}

fn workspace_data() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data")
}

fn ci() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"])?;
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
    cargo_deny()?;
    cargo(&["test", "--workspace"])?;
    schema_check(&workspace_data())?;
    Ok(())
}

fn cargo_deny() -> Result<()> {
    // Optional: skip when cargo-deny is not installed.
    let mut cmd = Command::new("cargo");
    cmd.args(["deny", "check"]).stdout(Stdio::inherit()).stderr(Stdio::inherit());
    match cmd.status() {
        Ok(status) if !status.success() => bail!("cargo deny check failed"),
        Ok(_) => {}
        Err(e) => eprintln!("xtask: cargo-deny not found or failed to launch: {e} (skipping)"),
    }
    Ok(())
}

/// Unlike the runtime loader, every rejected definition is an error here.
fn schema_check(root: &Path) -> Result<()> {
    let physics = data_runtime::configs::physics::load_from(root)
        .with_context(|| format!("validate tuning under {}", root.display()))?;
    data_runtime::configs::telemetry::load_from(root).context("validate telemetry config")?;
    let records = data_runtime::companions::load_from(root).context("validate companions file")?;
    if records.is_empty() {
        bail!("no companion definitions under {}", root.display());
    }
    let mut problems = Vec::new();
    let mut ok = 0usize;
    for rec in records {
        let id = rec.id.clone();
        match CompanionDefinition::try_from(rec) {
            Ok(_) => ok += 1,
            Err(e) => problems.push(format!("{id}: {e}")),
        }
    }
    if !problems.is_empty() {
        bail!("invalid companion definitions:\n  {}", problems.join("\n  "));
    }
    println!(
        "xtask: {ok} companion definitions valid (update interval {} ticks, knot {})",
        physics.physics.update_interval_ticks,
        if physics.knot.enabled { "on" } else { "off" }
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Ci => ci(),
        Cmd::SchemaCheck { root } => schema_check(&root.unwrap_or_else(workspace_data)),
    }
}
