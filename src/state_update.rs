// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - State Update Functions

//! State update functions.
//!
//! Each update owns exactly one field of the next state. It reads the state
//! the block started from and the block's merged policy input, and writes
//! its field into `next`, which starts as a copy of the previous state.

use crate::error::SimResult;
use crate::params::Params;
use crate::random::RandomStream;
use crate::types::{PolicyInput, SimulationState};

/// A named update operation writing one state field.
pub trait StateUpdate: Send + Sync {
    /// Name of the state field this update writes.
    fn field(&self) -> &'static str;

    fn apply(
        &self,
        params: &Params,
        prev: &SimulationState,
        input: &PolicyInput,
        rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()>;
}

// ─── Macro and Provider Flow ────────────────────────────────────────────────

/// Weekly macro factor drawn from the regime band.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateMacro;

impl StateUpdate for UpdateMacro {
    fn field(&self) -> &'static str {
        "macro"
    }

    fn apply(
        &self,
        params: &Params,
        _prev: &SimulationState,
        _input: &PolicyInput,
        rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        let (lo, hi) = params.macro_regime.band();
        next.macro_factor = rng.uniform(lo, hi);
        Ok(())
    }
}

/// Replace the pool with the survivors and new joiners.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateProviders;

impl StateUpdate for UpdateProviders {
    fn field(&self) -> &'static str {
        "providers"
    }

    fn apply(
        &self,
        _params: &Params,
        prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        let flow = input.provider_flow(self.field())?;
        tracing::trace!(
            timestep = prev.timestep + 1,
            joined = flow.joined,
            departed = flow.departed,
            members = flow.providers.len(),
            "provider flow"
        );
        next.providers = flow.providers.clone();
        Ok(())
    }
}

/// Total capacity, recomputed from the new membership.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateTotalCapacity;

impl StateUpdate for UpdateTotalCapacity {
    fn field(&self) -> &'static str {
        "total_capacity"
    }

    fn apply(
        &self,
        _params: &Params,
        _prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.total_capacity = input.provider_flow(self.field())?.providers.total_capacity();
        Ok(())
    }
}

/// Policy demand lifted by the previous week's macro factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateDemand;

impl StateUpdate for UpdateDemand {
    fn field(&self) -> &'static str {
        "demand"
    }

    fn apply(
        &self,
        params: &Params,
        prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        let demand = input.demand(self.field())?;
        next.demand = demand * (1.0 + prev.macro_factor * params.demand_macro_sensitivity);
        Ok(())
    }
}

/// Departing providers' liquidations count as sell pressure.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateLeavingProviderSelling;

impl StateUpdate for UpdateLeavingProviderSelling {
    fn field(&self) -> &'static str {
        "net_flow"
    }

    fn apply(
        &self,
        _params: &Params,
        prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.net_flow = prev.net_flow - input.provider_flow(self.field())?.leaving_sold;
        Ok(())
    }
}

// ─── Protocol ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateCirculatingSupply;

impl StateUpdate for UpdateCirculatingSupply {
    fn field(&self) -> &'static str {
        "circulating_supply"
    }

    fn apply(
        &self,
        _params: &Params,
        prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        let flow = input.protocol(self.field())?;
        next.circulating_supply = prev.circulating_supply + flow.minted_tokens - flow.burned_tokens;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateRewardRate;

impl StateUpdate for UpdateRewardRate {
    fn field(&self) -> &'static str {
        "reward_rate"
    }

    fn apply(
        &self,
        _params: &Params,
        _prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.reward_rate = input.protocol(self.field())?.reward_rate;
        Ok(())
    }
}

/// Market-clearing service price from capacity against baseline demand,
/// clamped to the cost band. Draws its own noise, independent of the
/// demand policy's draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateServicePrice;

impl StateUpdate for UpdateServicePrice {
    fn field(&self) -> &'static str {
        "service_price"
    }

    fn apply(
        &self,
        params: &Params,
        prev: &SimulationState,
        _input: &PolicyInput,
        rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        let noise = rng.noise(params.noise_band);
        let ratio = prev.total_capacity / (params.demand.base_demand * noise);
        // ratio 0 gives +inf, which the ceiling absorbs
        let clearing = ratio.powf(-1.0 / params.demand.price_elasticity);
        next.service_price = clearing.min(params.cost_ceiling).max(params.cost_floor);
        Ok(())
    }
}

/// Purchases add to the running net flow, cost sales subtract.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateNetFlow;

impl StateUpdate for UpdateNetFlow {
    fn field(&self) -> &'static str {
        "net_flow"
    }

    fn apply(
        &self,
        _params: &Params,
        prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        let flow = input.protocol(self.field())?;
        next.net_flow = prev.net_flow + flow.tokens_bought - flow.tokens_sold;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateTokensBought;

impl StateUpdate for UpdateTokensBought {
    fn field(&self) -> &'static str {
        "tokens_bought"
    }

    fn apply(
        &self,
        _params: &Params,
        _prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.tokens_bought = input.protocol(self.field())?.tokens_bought;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateTokensSold;

impl StateUpdate for UpdateTokensSold {
    fn field(&self) -> &'static str {
        "tokens_sold"
    }

    fn apply(
        &self,
        _params: &Params,
        _prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.tokens_sold = input.protocol(self.field())?.tokens_sold;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateMintedTokens;

impl StateUpdate for UpdateMintedTokens {
    fn field(&self) -> &'static str {
        "minted_tokens"
    }

    fn apply(
        &self,
        _params: &Params,
        _prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.minted_tokens = input.protocol(self.field())?.minted_tokens;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateBurnedTokens;

impl StateUpdate for UpdateBurnedTokens {
    fn field(&self) -> &'static str {
        "burned_tokens"
    }

    fn apply(
        &self,
        _params: &Params,
        _prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.burned_tokens = input.protocol(self.field())?.burned_tokens;
        Ok(())
    }
}

/// Providers after settling this week's rewards.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateSettledProviders;

impl StateUpdate for UpdateSettledProviders {
    fn field(&self) -> &'static str {
        "providers"
    }

    fn apply(
        &self,
        _params: &Params,
        _prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.providers = input.protocol(self.field())?.providers.clone();
        Ok(())
    }
}

// ─── Price ──────────────────────────────────────────────────────────────────

/// Flow-adjusted token price scaled by this week's macro factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateTokenPrice;

impl StateUpdate for UpdateTokenPrice {
    fn field(&self) -> &'static str {
        "token_price"
    }

    fn apply(
        &self,
        _params: &Params,
        prev: &SimulationState,
        input: &PolicyInput,
        _rng: &mut RandomStream,
        next: &mut SimulationState,
    ) -> SimResult<()> {
        next.token_price = input.token_price(self.field())? * prev.macro_factor;
        Ok(())
    }
}
