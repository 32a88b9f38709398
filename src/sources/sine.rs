use async_trait::async_trait;
use anyhow::Result;
use std::f64::consts::PI;
use crate::core::ValueSource;

/// Sine wave sampled once per producer tick
///
/// Phase advances with the sequence number, so a skipped tick does not
/// shift the waveform.
pub struct SineSource {
    frequency_hz: f64,
    amplitude: f64,
    tick_secs: f64,
}

impl Default for SineSource {
    fn default() -> Self {
        Self::new(0.1, 1.0, 1.0)
    }
}

impl SineSource {
    pub fn new(frequency_hz: f64, amplitude: f64, tick_secs: f64) -> Self {
        Self {
            frequency_hz,
            amplitude,
            tick_secs,
        }
    }
}

#[async_trait]
impl ValueSource for SineSource {
    fn name(&self) -> &str {
        "sine"
    }

    async fn next_value(&mut self, sequence: u64) -> Result<f64> {
        let phase = 2.0 * PI * self.frequency_hz * (sequence as f64) * self.tick_secs;
        Ok(self.amplitude * phase.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_quarter_period_peaks() {
        // 0.25 Hz sampled every second: peak at sequence 1, trough at 3
        let mut sine = SineSource::new(0.25, 2.0, 1.0);
        assert!(sine.next_value(0).await.unwrap().abs() < 1e-9);
        assert!((sine.next_value(1).await.unwrap() - 2.0).abs() < 1e-9);
        assert!((sine.next_value(3).await.unwrap() + 2.0).abs() < 1e-9);
    }
}
