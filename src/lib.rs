// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite

//! Monte Carlo simulation of a decentralized physical infrastructure
//! network's token economy.
//!
//! Providers join and leave on expected profit, users generate stochastic
//! demand for the metered service, and a burn-and-mint protocol turns that
//! demand into token purchases, burns and capped emissions. [`simulate`]
//! runs a scenario many times and returns per-week mean and standard
//! deviation for every metric; [`run_scenario`] returns the raw runs.

pub mod error;
pub mod random;
pub mod types;
pub mod provider;
pub mod params;
pub mod policy;
pub mod state_update;
pub mod blocks;
pub mod engine;
pub mod aggregate;
pub mod time_series;

pub use aggregate::{aggregate, Metric, MetricSeries, SimulationReport, Stats};
pub use blocks::{state_update_blocks, StateUpdateBlock};
pub use engine::{RunTable, SimulationEngine};
pub use error::{SimError, SimResult};
pub use params::{initial_state, DemandRegime, MacroRegime, Params, ScenarioConfig};
pub use provider::{ProviderAgent, ProviderId, ProviderPool};
pub use random::RandomStream;
pub use types::SimulationState;

use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Offset applied to the scenario seed for the initial provider pool, so it
/// does not replay the draws of run 0.
const INITIAL_STATE_SEED_OFFSET: u64 = 0x9E37_79B9_7F4A_7C15;

// ─── Engine Entry Points ─────────────────────────────────────────────────────

/// Run every Monte Carlo trial of a scenario with explicit parameters.
pub fn run_scenario(config: &ScenarioConfig, params: &Params) -> SimResult<RunTable> {
    config.validate()?;
    params.validate()?;

    let mut rng = RandomStream::new(config.seed.wrapping_add(INITIAL_STATE_SEED_OFFSET));
    let initial = initial_state(params, config.initial_supply, &mut rng)?;
    let blocks = state_update_blocks();

    SimulationEngine::new(params, &blocks).run(&initial, config.timesteps, config.runs, config.seed)
}

/// Run a scenario with its default parameter table and aggregate the runs.
pub fn simulate(config: &ScenarioConfig) -> SimResult<SimulationReport> {
    let params = config.params();
    let table = run_scenario(config, &params)?;
    Ok(aggregate(&table))
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Dashboard entry point: takes a `ScenarioConfig`-shaped object and returns
/// the aggregated report, or throws the configuration error as a string.
#[wasm_bindgen(js_name = runSimulation)]
pub fn run_simulation(config: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));

    let config: ScenarioConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let report = simulate(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    // plain objects rather than `Map`s for the metric table
    report
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Default scenario configuration, for pre-filling dashboard widgets.
#[wasm_bindgen(js_name = defaultConfig)]
pub fn default_config() -> JsValue {
    serde_wasm_bindgen::to_value(&ScenarioConfig::default()).unwrap_or(JsValue::NULL)
}
