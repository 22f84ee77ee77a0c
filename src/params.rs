// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Scenario Parameters

//! Scenario configuration and the initial network state.
//!
//! [`ScenarioConfig`] is what a caller chooses: the demand and macro
//! regimes, the emission cap, the burn fraction and the run shape.
//! [`Params`] expands it into the full table of elasticities and
//! sensitivities the policies read. Every `Params` field has a default, so
//! a partial JSON document can override individual values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::provider::{ProviderAgent, ProviderPool};
use crate::random::RandomStream;
use crate::types::SimulationState;

/// Weeks simulated per run.
pub const DEFAULT_TIMESTEPS: u64 = 52;
/// Monte Carlo runs per scenario.
pub const DEFAULT_RUNS: usize = 20;
pub const MIN_INITIAL_SUPPLY: f64 = 100.0;

const INITIAL_PROVIDERS: usize = 10;
const INITIAL_CAPACITY_BIAS: f64 = 1.3;
const INITIAL_TOKEN_PRICE: f64 = 3.0;
const INITIAL_SERVICE_PRICE: f64 = 0.5;
const INITIAL_REWARD_RATE: f64 = 0.3;

// ─── DemandRegime ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemandRegime {
    Consistent,
    Growth,
    HighToDecay,
    Volatile,
}

impl DemandRegime {
    pub const ALL: [DemandRegime; 4] = [
        Self::Consistent,
        Self::Growth,
        Self::HighToDecay,
        Self::Volatile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consistent => "consistent",
            Self::Growth => "growth",
            Self::HighToDecay => "high-to-decay",
            Self::Volatile => "volatile",
        }
    }

    /// Baseline demand curve for the regime.
    pub fn profile(&self) -> DemandProfile {
        match self {
            Self::Consistent => DemandProfile {
                base_demand: 12_000.0,
                price_elasticity: 0.1,
                growth_rate: 0.025,
                decay_rate: 0.0,
                volatility: 0.0,
            },
            Self::Growth => DemandProfile {
                base_demand: 4_000.0,
                price_elasticity: 0.4,
                growth_rate: 0.001,
                decay_rate: 0.0,
                volatility: 0.0,
            },
            Self::HighToDecay => DemandProfile {
                base_demand: 15_000.0,
                price_elasticity: 0.4,
                growth_rate: 0.0,
                decay_rate: 0.02,
                volatility: 0.0,
            },
            Self::Volatile => DemandProfile {
                base_demand: 12_000.0,
                price_elasticity: 1.2,
                growth_rate: 0.0,
                decay_rate: 0.0,
                volatility: 1.2,
            },
        }
    }
}

impl FromStr for DemandRegime {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "consistent" => Ok(Self::Consistent),
            "growth" => Ok(Self::Growth),
            "high-to-decay" => Ok(Self::HighToDecay),
            "volatile" => Ok(Self::Volatile),
            _ => Err(SimError::UnknownDemandRegime(s.to_string())),
        }
    }
}

impl fmt::Display for DemandRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── MacroRegime ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MacroRegime {
    Bullish,
    Bearish,
    Neutral,
}

impl MacroRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }

    /// Half-open uniform band the weekly macro factor is drawn from.
    pub fn band(&self) -> (f64, f64) {
        match self {
            Self::Bullish => (0.995, 1.011),
            Self::Bearish => (0.995, 1.0049),
            Self::Neutral => (0.998, 1.002),
        }
    }
}

impl FromStr for MacroRegime {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Ok(Self::Bullish),
            "bearish" => Ok(Self::Bearish),
            "neutral" => Ok(Self::Neutral),
            _ => Err(SimError::UnknownMacroRegime(s.to_string())),
        }
    }
}

impl fmt::Display for MacroRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── DemandProfile ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandProfile {
    pub base_demand: f64,
    pub price_elasticity: f64,
    pub growth_rate: f64,
    pub decay_rate: f64,
    pub volatility: f64,
}

// ─── Params ─────────────────────────────────────────────────────────────────

/// Full parameter table, immutable for the duration of a run set.
///
/// Every field may be omitted from a JSON document. An omitted `demand`
/// profile is derived from the document's `demand_regime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParamsDocument")]
pub struct Params {
    pub demand_regime: DemandRegime,
    pub macro_regime: MacroRegime,
    /// Hard cap on tokens emitted per week.
    pub max_mint: f64,
    /// Share of purchased tokens burned, in [0, 1].
    pub burn_fraction: f64,
    pub demand: DemandProfile,

    /// Expected candidate providers per week.
    pub provider_inflow_rate: f64,
    /// Token price response to net flow relative to supply.
    pub flows_sensitivity: f64,
    /// Demand lift per unit of the previous macro factor.
    pub demand_macro_sensitivity: f64,
    pub cost_floor: f64,
    pub cost_ceiling: f64,
    pub noise_band: (f64, f64),

    pub capacity_log_mean: f64,
    pub capacity_log_sd: f64,
    pub cost_per_unit_range: (f64, f64),
}

impl Default for Params {
    fn default() -> Self {
        Self::for_regimes(DemandRegime::Consistent, MacroRegime::Bullish, 10_000.0, 0.5)
    }
}

/// Wire shape of [`Params`]: the same fields, with the demand profile optional.
#[derive(Deserialize)]
#[serde(default)]
struct ParamsDocument {
    demand_regime: DemandRegime,
    macro_regime: MacroRegime,
    max_mint: f64,
    burn_fraction: f64,
    demand: Option<DemandProfile>,
    provider_inflow_rate: f64,
    flows_sensitivity: f64,
    demand_macro_sensitivity: f64,
    cost_floor: f64,
    cost_ceiling: f64,
    noise_band: (f64, f64),
    capacity_log_mean: f64,
    capacity_log_sd: f64,
    cost_per_unit_range: (f64, f64),
}

impl Default for ParamsDocument {
    fn default() -> Self {
        let p = Params::default();
        Self {
            demand_regime: p.demand_regime,
            macro_regime: p.macro_regime,
            max_mint: p.max_mint,
            burn_fraction: p.burn_fraction,
            demand: None,
            provider_inflow_rate: p.provider_inflow_rate,
            flows_sensitivity: p.flows_sensitivity,
            demand_macro_sensitivity: p.demand_macro_sensitivity,
            cost_floor: p.cost_floor,
            cost_ceiling: p.cost_ceiling,
            noise_band: p.noise_band,
            capacity_log_mean: p.capacity_log_mean,
            capacity_log_sd: p.capacity_log_sd,
            cost_per_unit_range: p.cost_per_unit_range,
        }
    }
}

impl From<ParamsDocument> for Params {
    fn from(doc: ParamsDocument) -> Self {
        Self {
            demand_regime: doc.demand_regime,
            macro_regime: doc.macro_regime,
            max_mint: doc.max_mint,
            burn_fraction: doc.burn_fraction,
            demand: doc.demand.unwrap_or_else(|| doc.demand_regime.profile()),
            provider_inflow_rate: doc.provider_inflow_rate,
            flows_sensitivity: doc.flows_sensitivity,
            demand_macro_sensitivity: doc.demand_macro_sensitivity,
            cost_floor: doc.cost_floor,
            cost_ceiling: doc.cost_ceiling,
            noise_band: doc.noise_band,
            capacity_log_mean: doc.capacity_log_mean,
            capacity_log_sd: doc.capacity_log_sd,
            cost_per_unit_range: doc.cost_per_unit_range,
        }
    }
}

impl Params {
    pub fn for_regimes(
        demand_regime: DemandRegime,
        macro_regime: MacroRegime,
        max_mint: f64,
        burn_fraction: f64,
    ) -> Self {
        Self {
            demand_regime,
            macro_regime,
            max_mint,
            burn_fraction,
            demand: demand_regime.profile(),
            provider_inflow_rate: 10.0,
            flows_sensitivity: 1.0,
            demand_macro_sensitivity: 0.02,
            cost_floor: 0.1,
            cost_ceiling: 1.0,
            noise_band: (0.97, 1.03),
            capacity_log_mean: 5.0,
            capacity_log_sd: 0.7,
            cost_per_unit_range: (0.05, 0.2),
        }
    }

    /// Layer a partial JSON object over this table. Nested objects (the
    /// demand profile) merge field by field. Switching `demand_regime`
    /// rebases the profile on the new regime before the document's own
    /// `demand` fields apply.
    pub fn with_overrides(&self, overrides: &serde_json::Value) -> Result<Params, serde_json::Error> {
        use serde::de::Error as _;
        use serde_json::Value;

        let source = overrides
            .as_object()
            .ok_or_else(|| serde_json::Error::custom("parameter overrides must be a JSON object"))?;

        let mut base = self.clone();
        if let Some(tag) = source.get("demand_regime") {
            let regime: DemandRegime = serde_json::from_value(tag.clone())?;
            base.demand_regime = regime;
            base.demand = regime.profile();
        }

        let mut merged = match serde_json::to_value(&base)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for (key, value) in source {
            match (merged.get_mut(key), value) {
                (Some(Value::Object(target)), Value::Object(fields)) => {
                    for (k, v) in fields {
                        target.insert(k.clone(), v.clone());
                    }
                }
                _ => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        serde_json::from_value(Value::Object(merged))
    }

    /// Reject values the update formulas cannot handle.
    pub fn validate(&self) -> SimResult<()> {
        fn finite(name: &'static str, value: f64) -> SimResult<f64> {
            if value.is_finite() {
                Ok(value)
            } else {
                Err(SimError::invalid(name, value))
            }
        }

        if finite("max_mint", self.max_mint)? < 0.0 {
            return Err(SimError::invalid("max_mint", self.max_mint));
        }
        let burn = finite("burn_fraction", self.burn_fraction)?;
        if !(0.0..=1.0).contains(&burn) {
            return Err(SimError::invalid("burn_fraction", burn));
        }
        if finite("base_demand", self.demand.base_demand)? <= 0.0 {
            return Err(SimError::invalid("base_demand", self.demand.base_demand));
        }
        if finite("price_elasticity", self.demand.price_elasticity)? <= 0.0 {
            return Err(SimError::invalid("price_elasticity", self.demand.price_elasticity));
        }
        finite("growth_rate", self.demand.growth_rate)?;
        finite("decay_rate", self.demand.decay_rate)?;
        if finite("volatility", self.demand.volatility)? < 0.0 {
            return Err(SimError::invalid("volatility", self.demand.volatility));
        }
        if finite("provider_inflow_rate", self.provider_inflow_rate)? < 0.0 {
            return Err(SimError::invalid("provider_inflow_rate", self.provider_inflow_rate));
        }
        finite("flows_sensitivity", self.flows_sensitivity)?;
        finite("demand_macro_sensitivity", self.demand_macro_sensitivity)?;
        if finite("cost_floor", self.cost_floor)? <= 0.0 {
            return Err(SimError::invalid("cost_floor", self.cost_floor));
        }
        if finite("cost_ceiling", self.cost_ceiling)? < self.cost_floor {
            return Err(SimError::invalid("cost_ceiling", self.cost_ceiling));
        }
        let (lo, hi) = self.noise_band;
        if finite("noise_band", lo)? <= 0.0 || finite("noise_band", hi)? < lo {
            return Err(SimError::invalid("noise_band", hi));
        }
        finite("capacity_log_mean", self.capacity_log_mean)?;
        if finite("capacity_log_sd", self.capacity_log_sd)? < 0.0 {
            return Err(SimError::invalid("capacity_log_sd", self.capacity_log_sd));
        }
        let (lo, hi) = self.cost_per_unit_range;
        if finite("cost_per_unit_range", lo)? < 0.0 || finite("cost_per_unit_range", hi)? < lo {
            return Err(SimError::invalid("cost_per_unit_range", hi));
        }
        Ok(())
    }
}

// ─── ScenarioConfig ─────────────────────────────────────────────────────────

/// Caller-facing knobs for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub demand_regime: DemandRegime,
    pub macro_regime: MacroRegime,
    pub max_mint: f64,
    pub burn_fraction: f64,
    pub initial_supply: f64,
    pub timesteps: u64,
    pub runs: usize,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            demand_regime: DemandRegime::Consistent,
            macro_regime: MacroRegime::Bullish,
            max_mint: 10_000.0,
            burn_fraction: 0.5,
            initial_supply: 1_000_000.0,
            timesteps: DEFAULT_TIMESTEPS,
            runs: DEFAULT_RUNS,
            seed: 0,
        }
    }
}

impl ScenarioConfig {
    pub fn params(&self) -> Params {
        Params::for_regimes(
            self.demand_regime,
            self.macro_regime,
            self.max_mint,
            self.burn_fraction,
        )
    }

    pub fn validate(&self) -> SimResult<()> {
        if !self.initial_supply.is_finite() || self.initial_supply < MIN_INITIAL_SUPPLY {
            return Err(SimError::invalid("initial_supply", self.initial_supply));
        }
        self.params().validate()
    }
}

// ─── Initial State ──────────────────────────────────────────────────────────

/// Seed the network: a small pool of above-average providers, baseline
/// demand for the regime, and zeroed flow counters.
pub fn initial_state(
    params: &Params,
    initial_supply: f64,
    rng: &mut RandomStream,
) -> SimResult<SimulationState> {
    if !initial_supply.is_finite() || initial_supply < 0.0 {
        return Err(SimError::invalid("initial_supply", initial_supply));
    }

    let mut providers = ProviderPool::new();
    for _ in 0..INITIAL_PROVIDERS {
        let id = providers.allocate_id();
        let candidate = ProviderAgent::candidate(id, params, INITIAL_CAPACITY_BIAS, rng)?;
        providers.admit(candidate);
    }

    Ok(SimulationState {
        timestep: 0,
        token_price: INITIAL_TOKEN_PRICE,
        circulating_supply: initial_supply,
        demand: params.demand.base_demand,
        service_price: INITIAL_SERVICE_PRICE,
        total_capacity: providers.total_capacity(),
        reward_rate: INITIAL_REWARD_RATE,
        net_flow: 0.0,
        macro_factor: 1.0,
        tokens_bought: 0.0,
        tokens_sold: 0.0,
        minted_tokens: 0.0,
        burned_tokens: 0.0,
        providers,
    })
}
