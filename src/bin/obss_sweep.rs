use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use obss_sweep::runner::CommandExecutor;
use obss_sweep::sweep::run_sweep;
use obss_sweep::SweepConfig;

#[derive(Debug, Parser)]
#[command(name = "obss-sweep")]
#[command(about = "Sweep an ns-3 OBSS-PD scenario and aggregate per-STA throughput")]
struct Cli {
    /// TOML sweep configuration; falls back to ./obss-sweep.toml when
    /// present, otherwise the built-in 2BSS defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory; each sweep gets a timestamped subdirectory.
    #[arg(long, default_value = "output-obss-sweep")]
    output: PathBuf,

    /// Simulator launcher, overriding the configured one.
    #[arg(long)]
    program: Option<String>,

    /// Repeats per grid point.
    #[arg(long)]
    runs: Option<usize>,

    /// RNG run seed base.
    #[arg(long)]
    seed: Option<u64>,

    /// Per-invocation timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn load_config(path: Option<&Path>) -> Result<SweepConfig> {
    if let Some(path) = path {
        return Ok(SweepConfig::from_toml_file(path)?);
    }

    let local = PathBuf::from("obss-sweep.toml");
    if local.exists() {
        return Ok(SweepConfig::from_toml_file(&local)?);
    }

    Ok(SweepConfig::default())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(program) = cli.program {
        config.program = program;
    }
    if let Some(runs) = cli.runs {
        config.runs = runs;
    }
    if let Some(seed) = cli.seed {
        config.seed_base = Some(seed);
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.timeout_secs = timeout_secs;
    }

    let executor = CommandExecutor::new(&config);
    let report = run_sweep(&config, &executor, &cli.output)?;

    println!();
    println!(
        "Sweep complete. {} combinations, {} trials ({} without a measurement)",
        report.combinations, report.trials, report.absent_trials
    );
    println!("Run directory: {}", report.output_dir.display());
    println!("Results: {}", report.csv_path.display());
    println!("Chart: {}", report.chart_path.display());
    println!("Manifest: {}", report.manifest_path.display());

    Ok(())
}
