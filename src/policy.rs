// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Policy Functions

//! Policy functions.
//!
//! A policy reads the state a block starts from and proposes a signal. It
//! never writes state: the block's update functions fold the merged signals
//! into the next state. Policies in one block see the same snapshot, so
//! their evaluation order only matters for the random stream.

use crate::error::SimResult;
use crate::params::{DemandRegime, Params};
use crate::provider::ProviderAgent;
use crate::random::RandomStream;
use crate::types::{PolicySignal, ProtocolFlow, ProviderFlow, SimulationState};

/// A named policy operation.
pub trait Policy: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        params: &Params,
        prev: &SimulationState,
        rng: &mut RandomStream,
    ) -> SimResult<PolicySignal>;
}

// ─── Provider Arrivals / Retention ──────────────────────────────────────────

/// Poisson arrivals of candidate providers plus the retention check of every
/// current member. Departing members dump their balance on the market.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateProviders;

impl Policy for GenerateProviders {
    fn name(&self) -> &'static str {
        "generate_providers"
    }

    fn evaluate(
        &self,
        params: &Params,
        prev: &SimulationState,
        rng: &mut RandomStream,
    ) -> SimResult<PolicySignal> {
        let mut providers = prev.providers.clone();

        let num_candidates = rng.poisson(params.provider_inflow_rate)?;
        let mut joined = Vec::new();
        for _ in 0..num_candidates {
            let id = providers.allocate_id();
            let candidate = ProviderAgent::candidate(id, params, 1.0, rng)?;
            if candidate.decide_onboard(prev) {
                joined.push(candidate);
            }
        }

        let mut leaving = Vec::new();
        let mut leaving_sold = 0.0;
        for provider in providers.iter_mut() {
            let decision = provider.decide_to_stay(prev);
            if !decision.stay {
                leaving.push(provider.id);
                leaving_sold += decision.sold;
            }
        }

        for id in &leaving {
            providers.remove(*id);
        }
        let joined_count = joined.len();
        for candidate in joined {
            providers.admit(candidate);
        }

        Ok(PolicySignal::ProviderFlow(ProviderFlow {
            providers,
            leaving_sold,
            joined: joined_count,
            departed: leaving.len(),
        }))
    }
}

// ─── Weekly Demand ──────────────────────────────────────────────────────────

/// Demand-side price response, `service_price^(-elasticity / 2)`, evaluated
/// in log space.
pub fn price_adjustment(service_price: f64, elasticity: f64) -> f64 {
    if service_price <= 0.0 {
        return 1.0;
    }
    (-0.5 * elasticity * service_price.ln()).exp()
}

/// Regime-dependent weekly demand before the macro lift.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateWeeklyDemand;

impl Policy for GenerateWeeklyDemand {
    fn name(&self) -> &'static str {
        "generate_weekly_demand"
    }

    fn evaluate(
        &self,
        params: &Params,
        prev: &SimulationState,
        rng: &mut RandomStream,
    ) -> SimResult<PolicySignal> {
        let profile = &params.demand;
        let price_adj = price_adjustment(prev.service_price, profile.price_elasticity);
        let noise = rng.noise(params.noise_band);

        let demand = match params.demand_regime {
            DemandRegime::Consistent => profile.base_demand * price_adj * noise,
            DemandRegime::Growth => {
                prev.demand * (1.0 + profile.growth_rate * price_adj) * noise
            }
            DemandRegime::HighToDecay => {
                let elapsed = (prev.timestep + 1) as f64;
                profile.base_demand * (-profile.decay_rate * elapsed).exp() * price_adj * noise
            }
            DemandRegime::Volatile => {
                let v = profile.volatility;
                let shock = rng.uniform(-v, v);
                profile.base_demand * (1.0 + shock) * price_adj * noise
            }
        };

        Ok(PolicySignal::Demand(demand.max(0.0)))
    }
}

// ─── Protocol Service ───────────────────────────────────────────────────────

/// Burn-and-mint mechanism: users buy tokens to pay for service, a share of
/// the purchase is burned, and emissions track purchases up to the weekly
/// cap. Emissions are paid out pro rata to capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolService;

impl Policy for ProtocolService {
    fn name(&self) -> &'static str {
        "protocol_service"
    }

    fn evaluate(
        &self,
        params: &Params,
        prev: &SimulationState,
        _rng: &mut RandomStream,
    ) -> SimResult<PolicySignal> {
        let tokens_bought = if prev.token_price > 0.0 {
            prev.demand * prev.service_price / prev.token_price
        } else {
            tracing::warn!(timestep = prev.timestep, "non-positive token price, no purchases");
            0.0
        };
        let minted_tokens = tokens_bought.min(params.max_mint);
        // cannot burn more than exists after this week's emission
        let burnable = prev.circulating_supply + minted_tokens;
        let burned_tokens = (tokens_bought * params.burn_fraction).min(burnable.max(0.0));
        if burned_tokens < tokens_bought * params.burn_fraction {
            tracing::debug!(timestep = prev.timestep, burnable, "burn capped at circulating supply");
        }

        let reward_rate = if prev.total_capacity > 0.0 {
            minted_tokens / prev.total_capacity
        } else {
            0.0
        };

        let mut providers = prev.providers.clone();
        let mut tokens_sold = 0.0;
        for provider in providers.iter_mut() {
            let reward = reward_rate * provider.capacity;
            tokens_sold += provider.settle_reward(prev, reward);
        }

        Ok(PolicySignal::Protocol(ProtocolFlow {
            tokens_bought,
            tokens_sold,
            reward_rate,
            minted_tokens,
            burned_tokens,
            providers,
        }))
    }
}

// ─── Token Price Impact ─────────────────────────────────────────────────────

/// Bound on the weekly flow exponent `flows_sensitivity * net_flow / supply`.
pub const MAX_FLOW_EXPONENT: f64 = 10.0;
/// Bounds on the flow-adjusted token price, before the macro factor.
pub const MIN_TOKEN_PRICE: f64 = 1e-9;
pub const MAX_TOKEN_PRICE: f64 = 1e9;

/// Price impact of the running net flow relative to circulating supply.
/// The macro factor is applied by the update.
///
/// The net flow is cumulative, so on a thin supply the exponent grows every
/// week. Both the exponent and the resulting price are clamped to keep the
/// price finite and positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenPriceImpact;

impl Policy for TokenPriceImpact {
    fn name(&self) -> &'static str {
        "get_token_price"
    }

    fn evaluate(
        &self,
        params: &Params,
        prev: &SimulationState,
        _rng: &mut RandomStream,
    ) -> SimResult<PolicySignal> {
        let exponent = if prev.circulating_supply > 0.0 {
            params.flows_sensitivity * prev.net_flow / prev.circulating_supply
        } else {
            0.0
        };
        let bounded = exponent.clamp(-MAX_FLOW_EXPONENT, MAX_FLOW_EXPONENT);
        let raw = prev.token_price * bounded.exp();
        let price = raw.clamp(MIN_TOKEN_PRICE, MAX_TOKEN_PRICE);

        if bounded != exponent || price != raw {
            tracing::warn!(
                timestep = prev.timestep,
                exponent,
                price,
                "token price impact clamped"
            );
        }
        Ok(PolicySignal::TokenPrice(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MacroRegime;
    use crate::provider::{ProviderId, ProviderPool, RewardRecord};

    fn member(id: u64, capacity: f64, cost_per_unit: f64) -> ProviderAgent {
        ProviderAgent {
            id: ProviderId(id),
            capacity,
            cost_per_unit,
            token_balance: 0.0,
            reward_history: Vec::new(),
            onboarded: true,
        }
    }

    fn state_with(providers: ProviderPool) -> SimulationState {
        SimulationState {
            token_price: 2.0,
            circulating_supply: 10_000.0,
            demand: 1_000.0,
            service_price: 0.5,
            total_capacity: providers.total_capacity(),
            reward_rate: 0.3,
            providers,
            ..SimulationState::default()
        }
    }

    #[test]
    fn price_adjustment_is_half_elasticity_power() {
        let adj = price_adjustment(0.25, 1.0);
        assert!((adj - 2.0).abs() < 1e-12, "0.25^-0.5 should be 2, got {adj}");
        assert_eq!(price_adjustment(1.0, 3.0), 1.0);
    }

    #[test]
    fn growth_with_fixed_noise_is_exact() {
        let mut params = Params::for_regimes(DemandRegime::Growth, MacroRegime::Neutral, 1e6, 0.0);
        params.demand.volatility = 0.0;
        let prev = state_with(ProviderPool::new());
        let mut rng = RandomStream::new(5).with_fixed_noise(1.0);

        let signal = GenerateWeeklyDemand.evaluate(&params, &prev, &mut rng).unwrap();
        let PolicySignal::Demand(demand) = signal else { panic!("expected demand signal") };

        let adj = price_adjustment(prev.service_price, params.demand.price_elasticity);
        assert_eq!(demand, prev.demand * (1.0 + params.demand.growth_rate * adj));
    }

    #[test]
    fn decay_uses_elapsed_weeks() {
        let params = Params::for_regimes(DemandRegime::HighToDecay, MacroRegime::Neutral, 1e6, 0.0);
        let mut prev = state_with(ProviderPool::new());
        prev.service_price = 1.0;
        prev.timestep = 9;
        let mut rng = RandomStream::new(5).with_fixed_noise(1.0);

        let PolicySignal::Demand(demand) = GenerateWeeklyDemand.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected demand signal")
        };
        let expected = 15_000.0 * (-0.02_f64 * 10.0).exp();
        assert!((demand - expected).abs() < 1e-9);
    }

    #[test]
    fn volatile_demand_stays_in_band() {
        let params = Params::for_regimes(DemandRegime::Volatile, MacroRegime::Neutral, 1e6, 0.0);
        let mut prev = state_with(ProviderPool::new());
        prev.service_price = 1.0;
        let mut rng = RandomStream::new(8);
        for _ in 0..200 {
            let PolicySignal::Demand(d) = GenerateWeeklyDemand.evaluate(&params, &prev, &mut rng).unwrap() else {
                panic!("expected demand signal")
            };
            // base * (1 + U(-1.2, 1.2)) * noise, floored at zero
            assert!(d >= 0.0 && d <= 12_000.0 * 2.2 * 1.03 + 1e-6, "demand {d} out of band");
        }
    }

    #[test]
    fn protocol_caps_emission_and_splits_burn() {
        let mut pool = ProviderPool::new();
        pool.admit(member(0, 100.0, 0.1));
        pool.admit(member(1, 300.0, 0.1));
        let prev = state_with(pool);
        // bought = 1000 * 0.5 / 2 = 250
        let params = Params::for_regimes(DemandRegime::Consistent, MacroRegime::Neutral, 100.0, 0.4);
        let mut rng = RandomStream::new(1);

        let PolicySignal::Protocol(flow) = ProtocolService.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected protocol signal")
        };
        assert_eq!(flow.tokens_bought, 250.0);
        assert_eq!(flow.burned_tokens, 100.0);
        assert_eq!(flow.minted_tokens, 100.0);
        assert_eq!(flow.reward_rate, 0.25);

        let big = flow.providers.get(ProviderId(1)).unwrap();
        assert_eq!(big.reward_history, vec![RewardRecord { reward: 75.0, value: 150.0 }]);
        // each sells cost / price = 0.1 * cap / 2
        assert!((flow.tokens_sold - (5.0 + 15.0)).abs() < 1e-12);
        // the incoming snapshot is untouched
        assert!(prev.providers.get(ProviderId(1)).unwrap().reward_history.is_empty());
    }

    #[test]
    fn protocol_with_no_capacity_pays_nothing() {
        let prev = state_with(ProviderPool::new());
        let params = Params::default();
        let mut rng = RandomStream::new(1);
        let PolicySignal::Protocol(flow) = ProtocolService.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected protocol signal")
        };
        assert_eq!(flow.reward_rate, 0.0);
        assert_eq!(flow.tokens_sold, 0.0);
        assert!(flow.minted_tokens > 0.0);
    }

    #[test]
    fn unprofitable_members_leave() {
        let mut pool = ProviderPool::new();
        let mut loser = member(0, 100.0, 0.2);
        loser.token_balance = 12.0;
        loser.reward_history.push(RewardRecord { reward: 1.0, value: 1.0 });
        pool.admit(loser);
        pool.admit(member(1, 50.0, 0.1));
        let mut prev = state_with(pool);
        // nobody onboards at zero reward rate
        prev.reward_rate = 0.0;

        let params = Params::default();
        let mut rng = RandomStream::new(2);
        let PolicySignal::ProviderFlow(flow) = GenerateProviders.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected provider flow")
        };
        assert_eq!(flow.departed, 1);
        assert_eq!(flow.joined, 0);
        assert_eq!(flow.leaving_sold, 12.0);
        assert!(!flow.providers.contains(ProviderId(0)));
        assert!(flow.providers.contains(ProviderId(1)));
    }

    #[test]
    fn indebted_leaver_reports_negative_liquidation() {
        let mut pool = ProviderPool::new();
        let mut debtor = member(0, 100.0, 0.2);
        debtor.token_balance = -30.0;
        debtor.reward_history.push(RewardRecord { reward: 1.0, value: 1.0 });
        pool.admit(debtor);
        let mut prev = state_with(pool);
        prev.reward_rate = 0.0;

        let mut rng = RandomStream::new(2);
        let PolicySignal::ProviderFlow(flow) = GenerateProviders.evaluate(&Params::default(), &prev, &mut rng).unwrap() else {
            panic!("expected provider flow")
        };
        assert_eq!(flow.departed, 1);
        assert_eq!(flow.leaving_sold, -30.0);
    }

    #[test]
    fn attractive_reward_rate_onboards_candidates() {
        let mut prev = state_with(ProviderPool::new());
        prev.reward_rate = 10.0;
        let params = Params::default();
        let mut rng = RandomStream::new(9);
        let PolicySignal::ProviderFlow(flow) = GenerateProviders.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected provider flow")
        };
        // revenue 2 * 10 per unit dwarfs any unit cost in [0.05, 0.2)
        assert_eq!(flow.providers.len(), flow.joined);
        assert!(flow.providers.iter().all(|p| p.onboarded));
    }

    #[test]
    fn net_flow_drives_token_price() {
        let params = Params::default();
        let mut prev = state_with(ProviderPool::new());
        let mut rng = RandomStream::new(1);

        prev.net_flow = 0.0;
        let PolicySignal::TokenPrice(flat) = TokenPriceImpact.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected token price")
        };
        assert_eq!(flat, 2.0);

        prev.net_flow = 1_000.0;
        let PolicySignal::TokenPrice(up) = TokenPriceImpact.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected token price")
        };
        assert!((up - 2.0 * 0.1_f64.exp()).abs() < 1e-12);

        prev.circulating_supply = 0.0;
        let PolicySignal::TokenPrice(guarded) = TokenPriceImpact.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected token price")
        };
        assert_eq!(guarded, 2.0);
    }

    #[test]
    fn runaway_flow_keeps_price_finite() {
        let params = Params::default();
        let mut prev = state_with(ProviderPool::new());
        prev.circulating_supply = 100.0;
        let mut rng = RandomStream::new(1);

        // exponent 1e6 would overflow exp()
        prev.net_flow = 1e8;
        let PolicySignal::TokenPrice(high) = TokenPriceImpact.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected token price")
        };
        assert_eq!(high, 2.0 * MAX_FLOW_EXPONENT.exp());

        prev.token_price = MAX_TOKEN_PRICE;
        let PolicySignal::TokenPrice(capped) = TokenPriceImpact.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected token price")
        };
        assert_eq!(capped, MAX_TOKEN_PRICE);

        prev.token_price = 2.0;
        prev.net_flow = -1e8;
        let PolicySignal::TokenPrice(low) = TokenPriceImpact.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected token price")
        };
        assert!(low > 0.0 && low >= MIN_TOKEN_PRICE);
    }

    #[test]
    fn burn_is_bounded_by_available_supply() {
        let mut prev = state_with(ProviderPool::new());
        prev.circulating_supply = 100.0;
        // bought = 1000 * 0.5 / 2 = 250
        let params = Params::for_regimes(DemandRegime::Consistent, MacroRegime::Neutral, 20.0, 1.0);
        let mut rng = RandomStream::new(1);

        let PolicySignal::Protocol(flow) = ProtocolService.evaluate(&params, &prev, &mut rng).unwrap() else {
            panic!("expected protocol signal")
        };
        assert_eq!(flow.tokens_bought, 250.0);
        assert_eq!(flow.minted_tokens, 20.0);
        assert_eq!(flow.burned_tokens, 120.0);
        assert_eq!(prev.circulating_supply + flow.minted_tokens - flow.burned_tokens, 0.0);
    }
}
