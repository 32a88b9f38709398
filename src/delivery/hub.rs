use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::{Sample, SeriesBuffer, WindowSpec};
use crate::engine::SampleSink;
use crate::error::{LiveError, LiveResult};
use crate::observability::{MetricsCollector, SessionMetrics};
use crate::protocol::WindowSnapshot;
use crate::session::{DisplayState, ViewerSession};
use super::queue::{Delivery, OverflowPolicy, SessionQueue};
use super::subscription::Subscription;

/// How samples reach viewers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStrategy {
    /// The producer's append is fanned out to a queue per viewer
    #[default]
    Push,

    /// Each viewer polls the buffer on its own timer
    Pull,
}

#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub strategy: DeliveryStrategy,
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    pub client_refresh: Duration,
    pub window: WindowSpec,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            strategy: DeliveryStrategy::Push,
            queue_capacity: 64,
            overflow: OverflowPolicy::DropOldest,
            client_refresh: Duration::from_millis(1000),
            window: WindowSpec::default(),
        }
    }
}

struct SessionEntry {
    view: Arc<Mutex<ViewerSession>>,
    queue: Option<Arc<SessionQueue>>,
    cancel: CancellationToken,
}

struct ChannelInner {
    buffer: Arc<SeriesBuffer>,
    settings: DeliverySettings,
    sessions: RwLock<HashMap<u64, SessionEntry>>,
    next_id: AtomicU64,
    collector: MetricsCollector,
    shutdown: CancellationToken,
}

/// Connects viewer sessions to the series
///
/// Registered with the producer as a `SampleSink`. Cloning is cheap and all
/// clones share the same session table.
#[derive(Clone)]
pub struct DeliveryChannel {
    inner: Arc<ChannelInner>,
}

impl DeliveryChannel {
    pub fn new(buffer: Arc<SeriesBuffer>, settings: DeliverySettings, collector: MetricsCollector) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                buffer,
                settings,
                sessions: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                collector,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn buffer(&self) -> &Arc<SeriesBuffer> {
        &self.inner.buffer
    }

    pub fn settings(&self) -> &DeliverySettings {
        &self.inner.settings
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.inner.collector
    }

    /// Open a viewer session
    ///
    /// The session is registered for fan-out before its initial window is
    /// read, so nothing appended in between is missed. Samples that end up
    /// both in the window and in the queue are dropped as duplicates.
    pub fn connect(&self) -> LiveResult<Subscription> {
        if self.inner.shutdown.is_cancelled() {
            return Err(LiveError::InvalidTransition {
                from: "ShuttingDown".to_string(),
                to: "Connecting".to_string(),
            });
        }

        let settings = &self.inner.settings;
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let metrics = Arc::new(SessionMetrics::new(id));
        self.inner.collector.register_session(metrics.clone());

        let view = Arc::new(Mutex::new(ViewerSession::new(id, settings.window, metrics.clone())));
        let queue = match settings.strategy {
            DeliveryStrategy::Push => Some(Arc::new(SessionQueue::new(
                settings.queue_capacity,
                settings.overflow,
                metrics,
            ))),
            DeliveryStrategy::Pull => None,
        };
        let cancel = self.inner.shutdown.child_token();

        self.inner.sessions.write().insert(
            id,
            SessionEntry {
                view: view.clone(),
                queue: queue.clone(),
                cancel: cancel.clone(),
            },
        );

        let activated = view.lock().activate(&self.inner.buffer);
        let snapshot = match activated {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.disconnect(id);
                return Err(e);
            }
        };

        info!(
            "Viewer {} connected ({:?}), seeded with {} samples",
            id,
            settings.strategy,
            snapshot.samples.len()
        );

        Ok(Subscription::new(
            self.clone(),
            id,
            snapshot,
            view,
            queue,
            cancel,
            settings.client_refresh,
        ))
    }

    /// Tear down a session; queued deliveries are discarded.
    /// Returns false if the session was already gone.
    pub fn disconnect(&self, id: u64) -> bool {
        let entry = self.inner.sessions.write().remove(&id);
        let Some(entry) = entry else {
            return false;
        };

        entry.cancel.cancel();
        if let Some(queue) = &entry.queue {
            queue.close();
        }
        entry.view.lock().disconnect();
        self.inner.collector.unregister_session(id);
        info!("Viewer {} disconnected", id);
        true
    }

    pub fn display_state(&self, id: u64) -> LiveResult<DisplayState> {
        let sessions = self.inner.sessions.read();
        let entry = sessions.get(&id).ok_or(LiveError::SessionNotFound(id))?;
        let state = entry.view.lock().display_state();
        Ok(state)
    }

    pub fn session_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.inner.sessions.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.read().len()
    }

    /// Current window for viewers that fetch it themselves
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot::capture(&self.inner.buffer, self.inner.settings.window)
    }

    pub fn delta(&self, after: Option<u64>, epoch: u64) -> LiveResult<Vec<Sample>> {
        self.inner.buffer.delta(after, epoch)
    }

    /// Disconnect everyone and refuse new sessions
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        for id in self.session_ids() {
            self.disconnect(id);
        }
    }
}

impl SampleSink for DeliveryChannel {
    fn on_sample(&self, epoch: u64, sample: Sample) {
        if self.inner.settings.strategy != DeliveryStrategy::Push {
            return;
        }

        let sessions = self.inner.sessions.read();
        for entry in sessions.values() {
            if let Some(queue) = &entry.queue {
                if let Err(e) = queue.push(Delivery { epoch, sample }) {
                    debug!("{}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(strategy: DeliveryStrategy) -> DeliveryChannel {
        let settings = DeliverySettings {
            strategy,
            ..Default::default()
        };
        DeliveryChannel::new(Arc::new(SeriesBuffer::new()), settings, MetricsCollector::new())
    }

    #[tokio::test]
    async fn test_connect_registers_session() {
        let channel = channel(DeliveryStrategy::Push);
        let sub = channel.connect().unwrap();

        assert_eq!(channel.session_count(), 1);
        assert_eq!(channel.collector().session_count(), 1);
        assert!(channel.display_state(sub.id()).is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_unknown_session() {
        let channel = channel(DeliveryStrategy::Push);
        assert!(!channel.disconnect(99));
        assert!(matches!(
            channel.display_state(99),
            Err(LiveError::SessionNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_pull_mode_ignores_fan_out() {
        let channel = channel(DeliveryStrategy::Pull);
        let sub = channel.connect().unwrap();

        let sample = channel.buffer().append(1.0);
        channel.on_sample(0, sample);

        // Nothing is delivered until the viewer polls
        let display = channel.display_state(sub.id()).unwrap();
        assert!(display.labels.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_refuses_new_sessions() {
        let channel = channel(DeliveryStrategy::Push);
        let _sub = channel.connect().unwrap();
        channel.shutdown();

        assert_eq!(channel.session_count(), 0);
        assert!(channel.connect().is_err());
    }
}
