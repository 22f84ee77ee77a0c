// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Block Schedule

//! Ordered state-update blocks.
//!
//! A timestep threads the state through the blocks in declared order. Later
//! blocks consume fields written by earlier ones (`macro`, the updated
//! provider pool and capacity), so the order is part of the model.

use crate::error::SimResult;
use crate::params::Params;
use crate::policy::{GenerateProviders, GenerateWeeklyDemand, Policy, ProtocolService, TokenPriceImpact};
use crate::random::RandomStream;
use crate::state_update::*;
use crate::types::{PolicyInput, SimulationState};

// ─── StateUpdateBlock ───────────────────────────────────────────────────────

pub struct StateUpdateBlock {
    pub label: &'static str,
    pub policies: Vec<Box<dyn Policy>>,
    pub updates: Vec<Box<dyn StateUpdate>>,
}

impl std::fmt::Debug for StateUpdateBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateUpdateBlock")
            .field("label", &self.label)
            .field("policies", &self.policies.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("updates", &self.updates.iter().map(|u| u.field()).collect::<Vec<_>>())
            .finish()
    }
}

impl StateUpdateBlock {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            policies: Vec::new(),
            updates: Vec::new(),
        }
    }

    pub fn policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn update(mut self, update: impl StateUpdate + 'static) -> Self {
        self.updates.push(Box::new(update));
        self
    }

    /// Run one block: every policy against `prev`, then every update into a
    /// copy of `prev`.
    pub fn execute(
        &self,
        params: &Params,
        prev: &SimulationState,
        rng: &mut RandomStream,
    ) -> SimResult<SimulationState> {
        let mut input = PolicyInput::default();
        for policy in &self.policies {
            let signal = policy.evaluate(params, prev, rng)?;
            input.merge(policy.name(), signal)?;
        }

        let mut next = prev.clone();
        for update in &self.updates {
            update.apply(params, prev, &input, rng, &mut next)?;
        }
        Ok(next)
    }
}

// ─── Default Schedule ───────────────────────────────────────────────────────

/// The three-block weekly schedule: provider flow and demand, the protocol
/// mechanism, then token price formation.
pub fn state_update_blocks() -> Vec<StateUpdateBlock> {
    vec![
        StateUpdateBlock::new("macro and provider flow")
            .policy(GenerateProviders)
            .policy(GenerateWeeklyDemand)
            .update(UpdateMacro)
            .update(UpdateProviders)
            .update(UpdateTotalCapacity)
            .update(UpdateDemand)
            .update(UpdateLeavingProviderSelling),
        StateUpdateBlock::new("protocol")
            .policy(ProtocolService)
            .update(UpdateCirculatingSupply)
            .update(UpdateRewardRate)
            .update(UpdateServicePrice)
            .update(UpdateNetFlow)
            .update(UpdateTokensBought)
            .update(UpdateTokensSold)
            .update(UpdateMintedTokens)
            .update(UpdateBurnedTokens)
            .update(UpdateSettledProviders),
        StateUpdateBlock::new("price")
            .policy(TokenPriceImpact)
            .update(UpdateTokenPrice),
    ]
}
