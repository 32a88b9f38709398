use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::core::ValueSource;

/// Uniform random values in `[min, max)`
pub struct RandomSource {
    min: f64,
    max: f64,
    rng: StdRng,
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

impl RandomSource {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic stream, used by tests and demos
    pub fn seeded(min: f64, max: f64, seed: u64) -> Self {
        Self {
            min,
            max,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

#[async_trait]
impl ValueSource for RandomSource {
    fn name(&self) -> &str {
        "random"
    }

    async fn next_value(&mut self, _sequence: u64) -> Result<f64> {
        if self.max <= self.min {
            return Ok(self.min);
        }
        Ok(self.rng.random_range(self.min..self.max))
    }
}
