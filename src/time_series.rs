// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Per-Run Time Series

// Per-timestep JSONL export of raw runs, one file per run, for analysis
// outside the aggregated report.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::engine::RunTable;
use crate::types::SimulationState;

#[derive(Debug, Serialize)]
pub struct StepSnapshot {
    pub run: usize,
    pub timestep: u64,
    pub token_price: f64,
    pub circulating_supply: f64,
    pub demand: f64,
    pub service_price: f64,
    pub total_capacity: f64,
    pub reward_rate: f64,
    pub net_flow: f64,
    #[serde(rename = "macro")]
    pub macro_factor: f64,
    pub tokens_bought: f64,
    pub tokens_sold: f64,
    pub minted_tokens: f64,
    pub burned_tokens: f64,
    pub num_providers: usize,
    pub avg_capacity: f64,
    /// Sum of member token balances; can go negative when cost sales
    /// outrun rewards.
    pub provider_token_balance: f64,
}

impl StepSnapshot {
    pub fn from_state(run: usize, state: &SimulationState) -> Self {
        Self {
            run,
            timestep: state.timestep,
            token_price: state.token_price,
            circulating_supply: state.circulating_supply,
            demand: state.demand,
            service_price: state.service_price,
            total_capacity: state.total_capacity,
            reward_rate: state.reward_rate,
            net_flow: state.net_flow,
            macro_factor: state.macro_factor,
            tokens_bought: state.tokens_bought,
            tokens_sold: state.tokens_sold,
            minted_tokens: state.minted_tokens,
            burned_tokens: state.burned_tokens,
            num_providers: state.providers.len(),
            avg_capacity: state.providers.mean_capacity(),
            provider_token_balance: state.providers.iter().map(|p| p.token_balance).sum(),
        }
    }
}

/// Accumulates snapshots of one run and writes them as JSONL.
pub struct TimeSeriesRecorder {
    run: usize,
    snapshots: Vec<StepSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new(run: usize) -> Self {
        Self { run, snapshots: Vec::new() }
    }

    pub fn record(&mut self, state: &SimulationState) {
        self.snapshots.push(StepSnapshot::from_state(self.run, state));
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

/// Write every run of `table` to `dir/run-<index>.jsonl`. Returns the paths written.
pub fn write_run_table(table: &RunTable, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(table.run_count());
    for (run, states) in table.runs.iter().enumerate() {
        let mut recorder = TimeSeriesRecorder::new(run);
        for state in states {
            recorder.record(state);
        }
        let path = dir.join(format!("run-{:03}.jsonl", run));
        recorder.write_jsonl(&path)?;
        paths.push(path);
    }
    Ok(paths)
}
