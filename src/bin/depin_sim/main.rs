// DePIN Token Economy Simulator: Monte Carlo runner
// Seedable ChaCha8 streams per run, aggregated mean/std per week
//
// Usage:
//   cargo run --release --bin depin-sim                                  # consistent demand, bullish macro
//   cargo run --release --bin depin-sim -- --demand volatile --macro bearish
//   cargo run --release --bin depin-sim -- --burn-fraction 1 --max-mint 5000
//   cargo run --release --bin depin-sim -- --params overrides.json       # partial Params override
//   cargo run --release --bin depin-sim -- --time-series out/ts          # per-run JSONL

mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use depin_engine::{
    aggregate, run_scenario, time_series, DemandRegime, MacroRegime, Params, ScenarioConfig,
};
use report::{final_week, print_summary, RunReport};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "depin-sim", version, about = "Monte Carlo simulation of a DePIN token economy")]
struct Cli {
    /// Demand regime: consistent, growth, high-to-decay or volatile
    #[arg(long, default_value = "consistent")]
    demand: DemandRegime,

    /// Macro regime: bullish, bearish or neutral
    #[arg(long = "macro", default_value = "bullish")]
    macro_regime: MacroRegime,

    /// Maximum tokens minted per week
    #[arg(long, default_value_t = 10_000.0)]
    max_mint: f64,

    /// Share of purchased tokens burned, 0..=1
    #[arg(long, default_value_t = 0.5)]
    burn_fraction: f64,

    #[arg(long, default_value_t = 1_000_000.0)]
    initial_supply: f64,

    /// Weeks per run
    #[arg(long, default_value_t = depin_engine::params::DEFAULT_TIMESTEPS)]
    timesteps: u64,

    /// Monte Carlo runs
    #[arg(long, default_value_t = depin_engine::params::DEFAULT_RUNS)]
    runs: usize,

    /// Base seed; run i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON file with Params fields to override
    #[arg(long)]
    params: Option<PathBuf>,

    /// Where to write the JSON report
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory for per-run JSONL time series
    #[arg(long)]
    time_series: Option<PathBuf>,
}

impl Cli {
    fn scenario(&self) -> ScenarioConfig {
        ScenarioConfig {
            demand_regime: self.demand,
            macro_regime: self.macro_regime,
            max_mint: self.max_mint,
            burn_fraction: self.burn_fraction,
            initial_supply: self.initial_supply,
            timesteps: self.timesteps,
            runs: self.runs,
            seed: self.seed,
        }
    }
}

/// Layer a partial JSON document over the scenario's parameter table.
fn load_params(base: &Params, path: &Path) -> Result<Params, Box<dyn std::error::Error>> {
    let overrides: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    base.with_overrides(&overrides)
        .map_err(|e| format!("{}: {}", path.display(), e).into())
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = cli.scenario();
    let params = match &cli.params {
        Some(path) => load_params(&config.params(), path)?,
        None => config.params(),
    };
    // the report's scenario mirrors whatever the override file changed
    config.demand_regime = params.demand_regime;
    config.macro_regime = params.macro_regime;
    config.max_mint = params.max_mint;
    config.burn_fraction = params.burn_fraction;

    println!("\n  DePIN Token Economy Simulator v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "  PRNG: ChaCha8Rng | Runs: {} | Weeks: {} | Base seed: {}",
        config.runs, config.timesteps, config.seed
    );
    println!(
        "  Demand: {} | Macro: {} | Max mint: {} | Burn: {:.0}%\n",
        params.demand_regime,
        params.macro_regime,
        params.max_mint,
        params.burn_fraction * 100.0
    );

    let start = Instant::now();
    let table = run_scenario(&config, &params)?;
    let elapsed = start.elapsed();

    let summary = final_week(&table);
    print_summary(&summary);
    println!("  Week {} across {} runs | {:.1}ms\n", config.timesteps, config.runs, elapsed.as_secs_f64() * 1000.0);

    if let Some(dir) = &cli.time_series {
        let paths = time_series::write_run_table(&table, dir)?;
        println!("  Time series: {} files in {}", paths.len(), dir.display());
    }

    let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    let report = RunReport {
        timestamp: ts.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        config,
        params,
        final_week: summary,
        report: aggregate(&table),
    };

    let path = match &cli.output {
        Some(path) => path.clone(),
        None => PathBuf::from("simulation-results").join(format!("run-{}.json", ts)),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    println!("  Results saved to: {}\n", path.display());
    Ok(())
}
