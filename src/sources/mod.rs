pub mod random;
pub mod sine;

pub use random::RandomSource;
pub use sine::SineSource;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::core::ValueSource;
use crate::error::{LiveError, LiveResult};

/// Which value source the producer samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceConfig {
    #[serde(rename_all = "camelCase")]
    Random {
        #[serde(default)]
        min: f64,
        #[serde(default = "default_random_max")]
        max: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    Sine {
        frequency_hz: f64,
        #[serde(default = "default_amplitude")]
        amplitude: f64,
    },
}

fn default_random_max() -> f64 {
    1.0
}

fn default_amplitude() -> f64 {
    1.0
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Random {
            min: 0.0,
            max: default_random_max(),
            seed: None,
        }
    }
}

/// Build the configured source; `tick` is the producer interval
pub fn create_source(config: &SourceConfig, tick: Duration) -> LiveResult<Box<dyn ValueSource>> {
    match config {
        SourceConfig::Random { min, max, seed } => {
            if !(min < max) {
                return Err(LiveError::InvalidConfig(format!(
                    "random source needs min < max, got [{}, {})",
                    min, max
                )));
            }
            let source = match seed {
                Some(seed) => RandomSource::seeded(*min, *max, *seed),
                None => RandomSource::new(*min, *max),
            };
            Ok(Box::new(source))
        }
        SourceConfig::Sine {
            frequency_hz,
            amplitude,
        } => Ok(Box::new(SineSource::new(
            *frequency_hz,
            *amplitude,
            tick.as_secs_f64(),
        ))),
    }
}

/// Adapter turning a closure into a source
pub struct FnSource<F> {
    name: String,
    f: F,
}

impl<F> FnSource<F>
where
    F: FnMut(u64) -> Result<f64> + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> ValueSource for FnSource<F>
where
    F: FnMut(u64) -> Result<f64> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_value(&mut self, sequence: u64) -> Result<f64> {
        (self.f)(sequence)
    }
}
