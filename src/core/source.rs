use anyhow::Result;
use async_trait::async_trait;

/// Base trait for anything the producer can sample once per tick
#[async_trait]
pub trait ValueSource: Send {
    /// Short name used in logs and metrics
    fn name(&self) -> &str;

    /// Produce the value for the sample that will receive `sequence`.
    /// An error skips the tick; the schedule is not affected.
    async fn next_value(&mut self, sequence: u64) -> Result<f64>;
}

