use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::core::{Sample, SeriesBuffer, ValueSource};
use crate::observability::ProducerMetrics;
use crate::resilience::ResilientSource;

/// Receives every appended sample right after it lands in the buffer
///
/// Implementations must not block: the producer calls this inline.
pub trait SampleSink: Send + Sync {
    fn on_sample(&self, epoch: u64, sample: Sample);
}

/// The single writer of a `SeriesBuffer`
///
/// Ticks at a fixed rate. A slow tick skips the missed deadlines instead of
/// bursting to catch up, and a failing source only costs its own tick.
pub struct Producer {
    buffer: Arc<SeriesBuffer>,
    source: ResilientSource,
    sinks: Vec<Arc<dyn SampleSink>>,
    interval: Duration,
}

impl Producer {
    pub fn new(buffer: Arc<SeriesBuffer>, source: Box<dyn ValueSource>, interval: Duration) -> Self {
        let metrics = Arc::new(ProducerMetrics::new(source.name()));
        Self {
            buffer,
            source: ResilientSource::new(source, metrics),
            sinks: Vec::new(),
            interval,
        }
    }

    /// Add a sink notified after each append
    pub fn with_sink(mut self, sink: Arc<dyn SampleSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn metrics(&self) -> Arc<ProducerMetrics> {
        self.source.metrics().clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one tick: sample, append, notify. `None` if the tick was skipped.
    pub async fn tick(&mut self) -> Option<Sample> {
        let sequence = self.buffer.next_sequence();
        match self.source.sample(sequence).await {
            Ok(value) => {
                let (epoch, sample) = self.buffer.append_tagged(value);
                for sink in &self.sinks {
                    sink.on_sample(epoch, sample);
                }
                debug!(sequence = sample.sequence, value = sample.value, "sample produced");
                Some(sample)
            }
            Err(e) => {
                warn!("Skipping producer tick: {}", e);
                None
            }
        }
    }

    /// Tick until `shutdown` fires or its sender is dropped
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Producer started: source={}, interval={:?}",
            self.source.name(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => break,
            }
        }

        info!(
            "Producer stopped after {} samples",
            self.source.metrics().ticks_produced()
        );
    }

    /// Run on a dedicated background task
    pub fn spawn(self) -> ProducerHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let metrics = self.metrics();
        let handle = tokio::spawn(self.run(shutdown_rx));
        ProducerHandle {
            shutdown_tx,
            handle: Some(handle),
            metrics,
        }
    }
}

/// Owner of a spawned producer task
pub struct ProducerHandle {
    shutdown_tx: broadcast::Sender<()>,
    handle: Option<JoinHandle<()>>,
    metrics: Arc<ProducerMetrics>,
}

impl ProducerHandle {
    pub fn metrics(&self) -> &Arc<ProducerMetrics> {
        &self.metrics
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Stop the loop and wait for the task to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Producer task ended abnormally: {}", e);
            }
        }
    }
}

/// Dropping without `shutdown()` still signals the loop, but cannot await it.
impl Drop for ProducerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FnSource;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<(u64, Sample)>>,
    }

    impl SampleSink for RecordingSink {
        fn on_sample(&self, epoch: u64, sample: Sample) {
            self.seen.lock().push((epoch, sample));
        }
    }

    #[tokio::test]
    async fn test_tick_appends_and_notifies() {
        let buffer = Arc::new(SeriesBuffer::new());
        let sink = Arc::new(RecordingSink::default());
        let mut producer = Producer::new(
            buffer.clone(),
            Box::new(FnSource::new("const", |_| Ok(0.5))),
            Duration::from_millis(10),
        )
        .with_sink(sink.clone());

        let sample = producer.tick().await.unwrap();
        assert_eq!(sample, Sample::new(0, 0.5));
        assert_eq!(buffer.len(), 1);
        assert_eq!(sink.seen.lock().as_slice(), &[(0, Sample::new(0, 0.5))]);
    }

    #[tokio::test]
    async fn test_sink_sees_epoch_of_the_append() {
        let buffer = Arc::new(SeriesBuffer::new());
        let sink = Arc::new(RecordingSink::default());
        let mut producer = Producer::new(
            buffer.clone(),
            Box::new(FnSource::new("const", |_| Ok(1.0))),
            Duration::from_millis(10),
        )
        .with_sink(sink.clone());

        producer.tick().await.unwrap();
        let epoch = buffer.reset();
        producer.tick().await.unwrap();

        assert_eq!(
            sink.seen.lock().as_slice(),
            &[(0, Sample::new(0, 1.0)), (epoch, Sample::new(0, 1.0))]
        );
    }

    #[tokio::test]
    async fn test_failed_tick_leaves_buffer_untouched() {
        let buffer = Arc::new(SeriesBuffer::new());
        let mut producer = Producer::new(
            buffer.clone(),
            Box::new(FnSource::new("broken", |_| Err(anyhow::anyhow!("sensor offline")))),
            Duration::from_millis(10),
        );

        assert!(producer.tick().await.is_none());
        assert!(buffer.is_empty());
        assert_eq!(producer.metrics().tick_failures(), 1);
    }
}
