// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Token Economy Simulation Suite - Random Stream

//! Per-run random stream.
//!
//! Every run owns one `RandomStream` seeded from the run-set base seed plus
//! its run index. Nothing in the engine touches a global generator, so a run
//! is reproducible from its seed alone and runs can execute on any thread.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal, Poisson};

use crate::error::{SimError, SimResult};

/// Seeded ChaCha8 stream with an optional fixed multiplicative noise.
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: ChaCha8Rng,
    seed: u64,
    fixed_noise: Option<f64>,
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fixed_noise: None,
        }
    }

    /// Pin every [`noise`](Self::noise) draw to `value`. Other draws stay random.
    pub fn with_fixed_noise(mut self, value: f64) -> Self {
        self.fixed_noise = Some(value);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Multiplicative noise factor, uniform in `[lo, hi)`.
    pub fn noise(&mut self, (lo, hi): (f64, f64)) -> f64 {
        match self.fixed_noise {
            Some(value) => value,
            None => self.uniform(lo, hi),
        }
    }

    /// Uniform draw in `[lo, hi)`. A degenerate band returns `lo`.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    /// Poisson-distributed count. A non-positive rate yields no arrivals.
    pub fn poisson(&mut self, rate: f64) -> SimResult<u64> {
        if !rate.is_finite() {
            return Err(SimError::invalid("provider_inflow_rate", rate));
        }
        if rate <= 0.0 {
            return Ok(0);
        }
        let dist = Poisson::new(rate).map_err(|_| SimError::invalid("provider_inflow_rate", rate))?;
        Ok(dist.sample(&mut self.rng) as u64)
    }

    /// Log-normal draw with the given underlying normal mean and deviation.
    pub fn log_normal(&mut self, mu: f64, sigma: f64) -> SimResult<f64> {
        let dist = LogNormal::new(mu, sigma).map_err(|_| SimError::invalid("capacity_log_sd", sigma))?;
        Ok(dist.sample(&mut self.rng))
    }
}
