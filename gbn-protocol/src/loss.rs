//! Receiver-side loss simulator
//!
//! Fault injector used to exercise timeout-driven recovery: each arriving
//! datagram is dropped with a fixed probability, independently of every other
//! datagram. A dropped datagram is invisible to all later processing steps,
//! as if it had never arrived.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Drops datagrams with a fixed probability
pub struct LossSimulator {
    drop_probability: f64,
    rng: StdRng,
}

impl LossSimulator {
    /// Create a simulator seeded from the system entropy source
    pub fn new(drop_probability: f64) -> Self {
        Self::with_rng(drop_probability, StdRng::from_entropy())
    }

    /// Create a simulator with a fixed seed, for reproducible tests
    pub fn from_seed(drop_probability: f64, seed: u64) -> Self {
        Self::with_rng(drop_probability, StdRng::seed_from_u64(seed))
    }

    /// A pass-through simulator that never drops anything
    pub fn disabled() -> Self {
        Self::new(0.0)
    }

    fn with_rng(drop_probability: f64, rng: StdRng) -> Self {
        LossSimulator {
            drop_probability: drop_probability.clamp(0.0, 1.0),
            rng,
        }
    }

    /// The configured drop probability in `[0, 1]`
    pub fn drop_probability(&self) -> f64 {
        self.drop_probability
    }

    /// Decide the fate of one datagram
    ///
    /// Draws a uniform value in `[0, 1)` and drops when it is at or below the
    /// drop probability. Probability 0 never drops; probability 1 always
    /// drops.
    pub fn should_drop(&mut self) -> bool {
        if self.drop_probability <= 0.0 {
            return false;
        }
        self.rng.gen::<f64>() <= self.drop_probability
    }
}
