// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Error Taxonomy

//! Fatal configuration errors.
//!
//! Every variant aborts the run set that raised it. None of them are
//! transient: they point at a bad parameter or a miswired block schedule,
//! so the engine surfaces them to the caller with the offending value and
//! never retries.

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while configuring or executing a simulation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("unknown demand regime: {0:?} (expected consistent, growth, high-to-decay or volatile)")]
    UnknownDemandRegime(String),

    #[error("unknown macro regime: {0:?} (expected bullish, bearish or neutral)")]
    UnknownMacroRegime(String),

    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("update `{update}` requires policy signal `{signal}`, which no policy in its block produced")]
    MissingPolicyInput {
        update: &'static str,
        signal: &'static str,
    },

    #[error("policy `{policy}` wrote signal `{signal}`, which another policy in the same block already wrote")]
    DuplicatePolicyInput {
        policy: &'static str,
        signal: &'static str,
    },
}

impl SimError {
    /// Shorthand for [`SimError::InvalidParameter`].
    pub fn invalid(name: &'static str, value: f64) -> Self {
        Self::InvalidParameter { name, value }
    }
}

pub type SimResult<T> = Result<T, SimError>;
