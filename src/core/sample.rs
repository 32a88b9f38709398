use serde::{Deserialize, Serialize};

/// One data point produced per producer tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Position in the series, contiguous from 0 within an epoch
    pub sequence: u64,

    /// Sampled value
    pub value: f64,
}

impl Sample {
    pub fn new(sequence: u64, value: f64) -> Self {
        Self { sequence, value }
    }
}
