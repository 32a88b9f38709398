use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use super::{ProducerMetrics, SessionMetrics};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerSnapshot {
    pub source_name: String,
    pub ticks_produced: u64,
    pub tick_failures: u64,
    pub avg_latency_us: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: u64,
    pub delivered: u64,
    pub duplicates_ignored: u64,
    pub overflow_dropped: u64,
    pub catch_ups: u64,
    pub resyncs: u64,
}

/// Registry of live metric handles; sessions come and go, the producer stays
#[derive(Clone, Default)]
pub struct MetricsCollector {
    producer: Arc<RwLock<Option<Arc<ProducerMetrics>>>>,
    sessions: Arc<RwLock<BTreeMap<u64, Arc<SessionMetrics>>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_producer(&self, metrics: Arc<ProducerMetrics>) {
        *self.producer.write() = Some(metrics);
    }

    pub fn register_session(&self, metrics: Arc<SessionMetrics>) {
        self.sessions.write().insert(metrics.session_id(), metrics);
    }

    pub fn unregister_session(&self, session_id: u64) {
        self.sessions.write().remove(&session_id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn get_session_metrics(&self, session_id: u64) -> Option<Arc<SessionMetrics>> {
        self.sessions.read().get(&session_id).cloned()
    }

    pub fn producer_snapshot(&self) -> Option<ProducerSnapshot> {
        self.producer.read().as_ref().map(|m| ProducerSnapshot {
            source_name: m.source_name().to_string(),
            ticks_produced: m.ticks_produced(),
            tick_failures: m.tick_failures(),
            avg_latency_us: m.avg_latency_us(),
        })
    }

    pub fn session_snapshots(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .read()
            .values()
            .map(|m| SessionSnapshot {
                session_id: m.session_id(),
                delivered: m.delivered(),
                duplicates_ignored: m.duplicates_ignored(),
                overflow_dropped: m.overflow_dropped(),
                catch_ups: m.catch_ups(),
                resyncs: m.resyncs(),
            })
            .collect()
    }
}
