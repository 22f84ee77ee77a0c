// Run report written by the CLI: scenario, effective parameters, the
// aggregated series and a final-week summary.

use serde::Serialize;

use depin_engine::{Metric, Params, RunTable, ScenarioConfig, SimulationReport, Stats};

// ─── Final-Week Summary ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FinalWeek {
    pub metric: Metric,
    pub stats: Stats,
}

/// Cross-run statistics of every metric at the last timestep.
pub fn final_week(table: &RunTable) -> Vec<FinalWeek> {
    let t = table.timesteps as usize;
    Metric::ALL
        .iter()
        .map(|&metric| FinalWeek {
            metric,
            stats: Stats::from_samples(&depin_engine::aggregate::samples_at(table, metric, t)),
        })
        .collect()
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub config: ScenarioConfig,
    pub params: Params,
    pub final_week: Vec<FinalWeek>,
    pub report: SimulationReport,
}

/// Metrics shown in the stdout summary table.
pub const SUMMARY_METRICS: [Metric; 8] = [
    Metric::TokenPrice,
    Metric::CirculatingSupply,
    Metric::Demand,
    Metric::ServicePrice,
    Metric::NumProviders,
    Metric::TotalCapacity,
    Metric::RewardRate,
    Metric::NetFlow,
];

pub fn print_summary(final_week: &[FinalWeek]) {
    println!("  {:<20} {:>14} {:>12} {:>14} {:>14}", "Metric", "Mean", "Std", "Min", "Max");
    println!("  {}", "-".repeat(78));
    for row in final_week.iter().filter(|r| SUMMARY_METRICS.contains(&r.metric)) {
        println!(
            "  {:<20} {:>14.4} {:>12.4} {:>14.4} {:>14.4}",
            row.metric.as_str(),
            row.stats.mean,
            row.stats.std_dev,
            row.stats.min,
            row.stats.max,
        );
    }
    println!("  {}", "-".repeat(78));
}
