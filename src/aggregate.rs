// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Monte Carlo Aggregation

//! Cross-run aggregation.
//!
//! Each state is flattened to scalar metrics (the provider pool becomes a
//! count and a mean capacity) and every metric is reduced per timestep
//! across runs to a mean and a sample standard deviation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::RunTable;
use crate::types::SimulationState;

// ─── Metric ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TokenPrice,
    CirculatingSupply,
    Demand,
    ServicePrice,
    TotalCapacity,
    RewardRate,
    NetFlow,
    #[serde(rename = "macro")]
    Macro,
    TokensBought,
    TokensSold,
    MintedTokens,
    BurnedTokens,
    NumProviders,
    AvgCapacity,
}

impl Metric {
    pub const ALL: [Metric; 14] = [
        Self::TokenPrice,
        Self::CirculatingSupply,
        Self::Demand,
        Self::ServicePrice,
        Self::TotalCapacity,
        Self::RewardRate,
        Self::NetFlow,
        Self::Macro,
        Self::TokensBought,
        Self::TokensSold,
        Self::MintedTokens,
        Self::BurnedTokens,
        Self::NumProviders,
        Self::AvgCapacity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenPrice => "token_price",
            Self::CirculatingSupply => "circulating_supply",
            Self::Demand => "demand",
            Self::ServicePrice => "service_price",
            Self::TotalCapacity => "total_capacity",
            Self::RewardRate => "reward_rate",
            Self::NetFlow => "net_flow",
            Self::Macro => "macro",
            Self::TokensBought => "tokens_bought",
            Self::TokensSold => "tokens_sold",
            Self::MintedTokens => "minted_tokens",
            Self::BurnedTokens => "burned_tokens",
            Self::NumProviders => "num_providers",
            Self::AvgCapacity => "avg_capacity",
        }
    }

    /// Scalar value of this metric in one state.
    pub fn value(&self, state: &SimulationState) -> f64 {
        match self {
            Self::TokenPrice => state.token_price,
            Self::CirculatingSupply => state.circulating_supply,
            Self::Demand => state.demand,
            Self::ServicePrice => state.service_price,
            Self::TotalCapacity => state.total_capacity,
            Self::RewardRate => state.reward_rate,
            Self::NetFlow => state.net_flow,
            Self::Macro => state.macro_factor,
            Self::TokensBought => state.tokens_bought,
            Self::TokensSold => state.tokens_sold,
            Self::MintedTokens => state.minted_tokens,
            Self::BurnedTokens => state.burned_tokens,
            Self::NumProviders => state.providers.len() as f64,
            Self::AvgCapacity => state.providers.mean_capacity(),
        }
    }
}

// ─── Stats ──────────────────────────────────────────────────────────────────

/// Summary statistics of one metric over a sample of runs.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── MetricSeries / SimulationReport ────────────────────────────────────────

/// Per-timestep mean and standard deviation, aligned by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl MetricSeries {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub timesteps: u64,
    pub runs: usize,
    pub metrics: BTreeMap<Metric, MetricSeries>,
}

impl SimulationReport {
    pub fn series(&self, metric: Metric) -> Option<&MetricSeries> {
        self.metrics.get(&metric)
    }
}

// ─── Aggregation ────────────────────────────────────────────────────────────

/// Samples of `metric` at timestep `t`, one per run.
pub fn samples_at(table: &RunTable, metric: Metric, t: usize) -> Vec<f64> {
    table
        .runs
        .iter()
        .filter_map(|run| run.get(t))
        .map(|state| metric.value(state))
        .collect()
}

/// Reduce a run table to per-timestep mean/std for every metric.
pub fn aggregate(table: &RunTable) -> SimulationReport {
    let len = table.timesteps as usize + 1;
    let mut metrics = BTreeMap::new();

    for metric in Metric::ALL {
        let mut series = MetricSeries {
            mean: Vec::with_capacity(len),
            std: Vec::with_capacity(len),
        };
        for t in 0..len {
            let stats = Stats::from_samples(&samples_at(table, metric, t));
            series.mean.push(stats.mean);
            series.std.push(stats.std_dev);
        }
        metrics.insert(metric, series);
    }

    SimulationReport {
        timesteps: table.timesteps,
        runs: table.run_count(),
        metrics,
    }
}
