use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for the producer loop
pub struct ProducerMetrics {
    source_name: String,
    ticks_produced: AtomicU64,
    tick_failures: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl ProducerMetrics {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ticks_produced: AtomicU64::new(0),
            tick_failures: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn ticks_produced(&self) -> u64 {
        self.ticks_produced.load(Ordering::Relaxed)
    }

    pub fn tick_failures(&self) -> u64 {
        self.tick_failures.load(Ordering::Relaxed)
    }

    pub fn record_tick_produced(&self) {
        self.ticks_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_failure(&self) {
        self.tick_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_tick(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_tick(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }
}

/// Counters for one viewer session
pub struct SessionMetrics {
    session_id: u64,
    delivered: AtomicU64,
    duplicates_ignored: AtomicU64,
    overflow_dropped: AtomicU64,
    catch_ups: AtomicU64,
    resyncs: AtomicU64,
}

impl SessionMetrics {
    pub fn new(session_id: u64) -> Self {
        Self {
            session_id,
            delivered: AtomicU64::new(0),
            duplicates_ignored: AtomicU64::new(0),
            overflow_dropped: AtomicU64::new(0),
            catch_ups: AtomicU64::new(0),
            resyncs: AtomicU64::new(0),
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn duplicates_ignored(&self) -> u64 {
        self.duplicates_ignored.load(Ordering::Relaxed)
    }

    pub fn overflow_dropped(&self) -> u64 {
        self.overflow_dropped.load(Ordering::Relaxed)
    }

    pub fn catch_ups(&self) -> u64 {
        self.catch_ups.load(Ordering::Relaxed)
    }

    pub fn resyncs(&self) -> u64 {
        self.resyncs.load(Ordering::Relaxed)
    }

    pub fn record_delivered(&self, count: u64) {
        self.delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overflow(&self, dropped: u64) {
        self.overflow_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    pub fn record_catch_up(&self) {
        self.catch_ups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resync(&self) {
        self.resyncs.fetch_add(1, Ordering::Relaxed);
    }
}
