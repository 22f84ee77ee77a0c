// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Simulation Engine

//! Multi-run simulation driver.
//!
//! Run `i` of a run set is seeded with `base_seed + i` and starts from its
//! own deep copy of the initial state. Runs share nothing mutable, so on
//! native targets they are spread across the rayon pool; on `wasm32` they
//! run one after another. Results are always ordered by run index.

use serde::Serialize;

use crate::blocks::StateUpdateBlock;
use crate::error::SimResult;
use crate::params::Params;
use crate::random::RandomStream;
use crate::types::SimulationState;

// ─── RunTable ───────────────────────────────────────────────────────────────

/// Raw per-run time series: `runs[r][t]`, each run `timesteps + 1` long.
#[derive(Debug, Clone, Serialize)]
pub struct RunTable {
    pub timesteps: u64,
    pub runs: Vec<Vec<SimulationState>>,
}

impl RunTable {
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }
}

// ─── SimulationEngine ───────────────────────────────────────────────────────

pub struct SimulationEngine<'a> {
    params: &'a Params,
    blocks: &'a [StateUpdateBlock],
}

impl<'a> SimulationEngine<'a> {
    pub fn new(params: &'a Params, blocks: &'a [StateUpdateBlock]) -> Self {
        Self { params, blocks }
    }

    /// Execute `runs` independent runs of `timesteps` weeks each.
    pub fn run(
        &self,
        initial: &SimulationState,
        timesteps: u64,
        runs: usize,
        base_seed: u64,
    ) -> SimResult<RunTable> {
        self.params.validate()?;

        let results = self.dispatch(initial, timesteps, runs, base_seed);
        let runs_out = results.into_iter().collect::<SimResult<Vec<_>>>()?;

        tracing::info!(
            runs,
            timesteps,
            base_seed,
            demand_regime = %self.params.demand_regime,
            macro_regime = %self.params.macro_regime,
            "simulation completed"
        );

        Ok(RunTable {
            timesteps,
            runs: runs_out,
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn dispatch(
        &self,
        initial: &SimulationState,
        timesteps: u64,
        runs: usize,
        base_seed: u64,
    ) -> Vec<SimResult<Vec<SimulationState>>> {
        use rayon::prelude::*;

        (0..runs)
            .into_par_iter()
            .map(|i| {
                let mut rng = RandomStream::new(base_seed.wrapping_add(i as u64));
                self.run_single(initial, timesteps, &mut rng)
            })
            .collect()
    }

    #[cfg(target_arch = "wasm32")]
    fn dispatch(
        &self,
        initial: &SimulationState,
        timesteps: u64,
        runs: usize,
        base_seed: u64,
    ) -> Vec<SimResult<Vec<SimulationState>>> {
        (0..runs)
            .map(|i| {
                let mut rng = RandomStream::new(base_seed.wrapping_add(i as u64));
                self.run_single(initial, timesteps, &mut rng)
            })
            .collect()
    }

    /// One run: the initial state followed by `timesteps` successors.
    pub fn run_single(
        &self,
        initial: &SimulationState,
        timesteps: u64,
        rng: &mut RandomStream,
    ) -> SimResult<Vec<SimulationState>> {
        let mut history = Vec::with_capacity(timesteps as usize + 1);
        let mut state = initial.clone();
        history.push(state.clone());

        for _ in 0..timesteps {
            state = self.step(&state, rng)?;
            history.push(state.clone());
        }

        if let Some(last) = history.last() {
            tracing::debug!(
                seed = rng.seed(),
                providers = last.providers.len(),
                token_price = last.token_price,
                circulating_supply = last.circulating_supply,
                "run finished"
            );
        }
        Ok(history)
    }

    /// Advance one week through every block in order.
    pub fn step(&self, prev: &SimulationState, rng: &mut RandomStream) -> SimResult<SimulationState> {
        let mut state = prev.clone();
        for block in self.blocks {
            state = block.execute(self.params, &state, rng)?;
        }
        state.timestep = prev.timestep + 1;
        Ok(state)
    }
}
