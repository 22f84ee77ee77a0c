// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Provider Agents

//! Service-provider agents and the pool that owns them.
//!
//! A provider sells its weekly capacity to the protocol and is paid in the
//! protocol token. Rewards are monetized immediately to cover the week's
//! operating cost; whatever is left accumulates as a token balance that is
//! dumped on the market when the provider decides to leave.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::params::Params;
use crate::random::RandomStream;
use crate::types::SimulationState;

// ─── ProviderId ─────────────────────────────────────────────────────────────

/// Run-local provider identifier, allocated in increasing order by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub u64);

// ─── RewardRecord ───────────────────────────────────────────────────────────

/// One settled weekly reward: tokens received and their value in local currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub reward: f64,
    pub value: f64,
}

// ─── StayDecision ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StayDecision {
    pub stay: bool,
    /// Tokens liquidated on exit. Zero when staying.
    pub sold: f64,
}

// ─── ProviderAgent ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAgent {
    pub id: ProviderId,
    /// Units of service delivered per week.
    pub capacity: f64,
    /// Operating cost per unit of capacity, in local currency.
    pub cost_per_unit: f64,
    pub token_balance: f64,
    pub reward_history: Vec<RewardRecord>,
    pub onboarded: bool,
}

impl ProviderAgent {
    /// Draw a fresh candidate. Capacity is log-normal scaled by `capacity_bias`,
    /// unit cost is uniform over the configured range.
    pub fn candidate(
        id: ProviderId,
        params: &Params,
        capacity_bias: f64,
        rng: &mut RandomStream,
    ) -> SimResult<Self> {
        let capacity = rng.log_normal(params.capacity_log_mean, params.capacity_log_sd)? * capacity_bias;
        let (lo, hi) = params.cost_per_unit_range;
        let cost_per_unit = rng.uniform(lo, hi);
        Ok(Self {
            id,
            capacity,
            cost_per_unit,
            token_balance: 0.0,
            reward_history: Vec::new(),
            onboarded: false,
        })
    }

    /// Operating cost for one week at full capacity.
    pub fn weekly_cost(&self) -> f64 {
        self.cost_per_unit * self.capacity
    }

    /// Local-currency profit of the latest settled week. A provider with no
    /// history is assumed to clear its cost by one unit.
    pub fn profit(&self) -> f64 {
        let cost = self.weekly_cost();
        let latest = self
            .reward_history
            .last()
            .map(|r| r.value)
            .unwrap_or(cost + 1.0);
        latest - cost
    }

    /// Join if the expected weekly token revenue at the current reward rate
    /// exceeds the weekly cost.
    pub fn decide_onboard(&self, state: &SimulationState) -> bool {
        let revenue = state.token_price * state.reward_rate * self.capacity;
        revenue > self.weekly_cost()
    }

    /// Stay while the latest week was profitable. Leaving liquidates the
    /// whole token balance, reported as `sold` even when negative.
    pub fn decide_to_stay(&mut self, _state: &SimulationState) -> StayDecision {
        if self.profit() > 0.0 {
            return StayDecision { stay: true, sold: 0.0 };
        }
        self.onboarded = false;
        StayDecision {
            stay: false,
            sold: self.token_balance,
        }
    }

    /// Credit a weekly reward and immediately sell enough tokens to cover
    /// the week's cost. Returns the tokens sold.
    pub fn settle_reward(&mut self, state: &SimulationState, reward: f64) -> f64 {
        let price = state.token_price;
        self.reward_history.push(RewardRecord {
            reward,
            value: reward * price,
        });
        self.token_balance += reward;

        let sold = if price > 0.0 { self.weekly_cost() / price } else { 0.0 };
        self.token_balance -= sold;
        sold
    }
}

// ─── ProviderPool ───────────────────────────────────────────────────────────

/// Active providers keyed by id.
///
/// Iteration is in id order so per-provider random draws replay identically
/// for a given seed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderPool {
    members: BTreeMap<ProviderId, ProviderAgent>,
    next_id: u64,
}

impl ProviderPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next id for a candidate. Ids are never reused, even if
    /// the candidate declines to join.
    pub fn allocate_id(&mut self) -> ProviderId {
        let id = ProviderId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Admit a provider as a member.
    pub fn admit(&mut self, mut provider: ProviderAgent) {
        provider.onboarded = true;
        self.next_id = self.next_id.max(provider.id.0 + 1);
        self.members.insert(provider.id, provider);
    }

    /// Remove a departed provider. The instance is dropped.
    pub fn remove(&mut self, id: ProviderId) -> Option<ProviderAgent> {
        self.members.remove(&id)
    }

    pub fn get(&self, id: ProviderId) -> Option<&ProviderAgent> {
        self.members.get(&id)
    }

    pub fn contains(&self, id: ProviderId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderAgent> {
        self.members.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProviderAgent> {
        self.members.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.members.keys().copied()
    }

    /// Sum of member capacities, recomputed on every call.
    pub fn total_capacity(&self) -> f64 {
        self.members.values().map(|p| p.capacity).sum()
    }

    /// Mean member capacity, or zero for an empty pool.
    pub fn mean_capacity(&self) -> f64 {
        if self.members.is_empty() {
            0.0
        } else {
            self.total_capacity() / self.members.len() as f64
        }
    }
}
