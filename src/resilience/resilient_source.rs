use crate::core::ValueSource;
use crate::error::{LiveError, LiveResult};
use crate::observability::ProducerMetrics;
use std::sync::Arc;

/// Wraps a value source so a failing tick is counted and reported
/// instead of propagating into the producer loop
pub struct ResilientSource {
    inner: Box<dyn ValueSource>,
    metrics: Arc<ProducerMetrics>,
}

impl ResilientSource {
    pub fn new(inner: Box<dyn ValueSource>, metrics: Arc<ProducerMetrics>) -> Self {
        Self { inner, metrics }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn metrics(&self) -> &Arc<ProducerMetrics> {
        &self.metrics
    }

    /// Sample the inner source for `sequence`
    ///
    /// Non-finite values count as failures too: they would poison every
    /// chart downstream.
    pub async fn sample(&mut self, sequence: u64) -> LiveResult<f64> {
        let start = self.metrics.start_tick();
        let result = self.inner.next_value(sequence).await;
        self.metrics.finish_tick(start);

        match result {
            Ok(value) if value.is_finite() => {
                self.metrics.record_tick_produced();
                Ok(value)
            }
            Ok(value) => {
                self.metrics.record_tick_failure();
                Err(LiveError::ProducerTickFailure {
                    sequence,
                    reason: format!("{} returned non-finite value {}", self.inner.name(), value),
                })
            }
            Err(e) => {
                self.metrics.record_tick_failure();
                Err(LiveError::ProducerTickFailure {
                    sequence,
                    reason: format!("{}: {}", self.inner.name(), e),
                })
            }
        }
    }
}
