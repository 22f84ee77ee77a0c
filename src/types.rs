// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::provider::ProviderPool;

// ─── SimulationState ────────────────────────────────────────────────────────

/// Network state at the end of one timestep of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    pub timestep: u64,
    pub token_price: f64,
    pub circulating_supply: f64,
    pub demand: f64,
    pub service_price: f64,
    pub total_capacity: f64,
    /// Tokens emitted per unit of capacity in the last protocol step.
    pub reward_rate: f64,
    /// Running signed counter of purchases minus sales and liquidations.
    pub net_flow: f64,
    #[serde(rename = "macro")]
    pub macro_factor: f64,
    pub tokens_bought: f64,
    pub tokens_sold: f64,
    pub minted_tokens: f64,
    pub burned_tokens: f64,
    pub providers: ProviderPool,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            timestep: 0,
            token_price: 1.0,
            circulating_supply: 0.0,
            demand: 0.0,
            service_price: 1.0,
            total_capacity: 0.0,
            reward_rate: 0.0,
            net_flow: 0.0,
            macro_factor: 1.0,
            tokens_bought: 0.0,
            tokens_sold: 0.0,
            minted_tokens: 0.0,
            burned_tokens: 0.0,
            providers: ProviderPool::new(),
        }
    }
}

// ─── Policy Signals ─────────────────────────────────────────────────────────

/// Output of the arrival/retention policy.
#[derive(Debug, Clone)]
pub struct ProviderFlow {
    /// Survivors plus onboarded candidates.
    pub providers: ProviderPool,
    /// Tokens liquidated by departing providers.
    pub leaving_sold: f64,
    pub joined: usize,
    pub departed: usize,
}

/// Output of the protocol mechanism for one week.
#[derive(Debug, Clone)]
pub struct ProtocolFlow {
    pub tokens_bought: f64,
    pub tokens_sold: f64,
    pub reward_rate: f64,
    pub minted_tokens: f64,
    pub burned_tokens: f64,
    /// Providers after reward settlement.
    pub providers: ProviderPool,
}

/// One policy's contribution to the merged block input.
#[derive(Debug, Clone)]
pub enum PolicySignal {
    ProviderFlow(ProviderFlow),
    Demand(f64),
    Protocol(ProtocolFlow),
    TokenPrice(f64),
}

impl PolicySignal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProviderFlow(_) => "provider_flow",
            Self::Demand(_) => "demand",
            Self::Protocol(_) => "protocol",
            Self::TokenPrice(_) => "token_price",
        }
    }
}

// ─── PolicyInput ────────────────────────────────────────────────────────────

/// Merged policy output for one block. Each slot is written by at most one
/// policy; update functions read the slots they depend on.
#[derive(Debug, Clone, Default)]
pub struct PolicyInput {
    provider_flow: Option<ProviderFlow>,
    demand: Option<f64>,
    protocol: Option<ProtocolFlow>,
    token_price: Option<f64>,
}

impl PolicyInput {
    /// Fold one policy's signal in. A slot written twice is a schedule error.
    pub fn merge(&mut self, policy: &'static str, signal: PolicySignal) -> SimResult<()> {
        let duplicate = SimError::DuplicatePolicyInput {
            policy,
            signal: signal.name(),
        };
        let occupied = match signal {
            PolicySignal::ProviderFlow(v) => self.provider_flow.replace(v).is_some(),
            PolicySignal::Demand(v) => self.demand.replace(v).is_some(),
            PolicySignal::Protocol(v) => self.protocol.replace(v).is_some(),
            PolicySignal::TokenPrice(v) => self.token_price.replace(v).is_some(),
        };
        if occupied {
            return Err(duplicate);
        }
        Ok(())
    }

    pub fn provider_flow(&self, update: &'static str) -> SimResult<&ProviderFlow> {
        self.provider_flow
            .as_ref()
            .ok_or(SimError::MissingPolicyInput { update, signal: "provider_flow" })
    }

    pub fn demand(&self, update: &'static str) -> SimResult<f64> {
        self.demand
            .ok_or(SimError::MissingPolicyInput { update, signal: "demand" })
    }

    pub fn protocol(&self, update: &'static str) -> SimResult<&ProtocolFlow> {
        self.protocol
            .as_ref()
            .ok_or(SimError::MissingPolicyInput { update, signal: "protocol" })
    }

    pub fn token_price(&self, update: &'static str) -> SimResult<f64> {
        self.token_price
            .ok_or(SimError::MissingPolicyInput { update, signal: "token_price" })
    }
}
