use crate::core::Sample;
use crate::error::{LiveError, LiveResult};
use serde::{Deserialize, Serialize};

/// Process-wide window size; serialized as the bare `maxPoints` number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct WindowSpec {
    max_points: usize,
}

impl WindowSpec {
    pub fn new(max_points: usize) -> LiveResult<Self> {
        if max_points == 0 {
            return Err(LiveError::InvalidConfig(
                "maxPoints must be greater than 0".to_string(),
            ));
        }
        Ok(Self { max_points })
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }
}

impl TryFrom<usize> for WindowSpec {
    type Error = LiveError;

    fn try_from(max_points: usize) -> LiveResult<Self> {
        Self::new(max_points)
    }
}

impl From<WindowSpec> for usize {
    fn from(spec: WindowSpec) -> usize {
        spec.max_points
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self { max_points: 30 }
    }
}

/// Inclusive x-axis range `[start, end]` in sequence numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRange {
    pub start: u64,
    pub end: u64,
}

/// Slice of samples to display plus the axis range to apply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowView<'a> {
    pub samples: &'a [Sample],
    pub range: Option<WindowRange>,
}

/// Windowing policy: the last `max_points` samples and their axis range
///
/// When everything fits no truncation happens and the range spans all
/// samples, which for a full series is `[0, last]`. `range` is `None` only
/// for an empty input.
pub fn apply_window(samples: &[Sample], spec: WindowSpec) -> WindowView<'_> {
    let skip = samples.len().saturating_sub(spec.max_points());
    let shown = &samples[skip..];
    let range = match (shown.first(), shown.last()) {
        (Some(first), Some(last)) => Some(WindowRange {
            start: first.sequence,
            end: last.sequence,
        }),
        _ => None,
    };

    WindowView {
        samples: shown,
        range,
    }
}
