use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::core::Sample;
use crate::error::{LiveError, LiveResult};
use crate::observability::SessionMetrics;

/// What a full session queue does with a new delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverflowPolicy {
    /// Evict the oldest queued delivery to make room
    #[default]
    DropOldest,

    /// Discard everything queued and keep only the newest delivery
    CoalesceLatest,
}

/// One pushed sample tagged with the epoch it was appended under
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delivery {
    pub epoch: u64,
    pub sample: Sample,
}

/// Bounded single-consumer queue between the fan-out and one viewer
///
/// `push` never waits. Whatever gets dropped on overflow leaves a gap that
/// the viewer repairs from the buffer when it next receives a delivery.
pub struct SessionQueue {
    items: Mutex<VecDeque<Delivery>>,
    capacity: usize,
    policy: OverflowPolicy,
    notify: Notify,
    closed: AtomicBool,
    metrics: Arc<SessionMetrics>,
}

impl SessionQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy, metrics: Arc<SessionMetrics>) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            policy,
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            metrics,
        }
    }

    /// Enqueue without blocking
    ///
    /// The delivery is always enqueued. `ViewerQueueOverflow` reports what the
    /// policy dropped to make room.
    pub fn push(&self, delivery: Delivery) -> LiveResult<()> {
        if self.is_closed() {
            return Ok(());
        }

        let dropped = {
            let mut items = self.items.lock();
            let dropped = if items.len() >= self.capacity {
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        items.pop_front();
                        1
                    }
                    OverflowPolicy::CoalesceLatest => {
                        let n = items.len();
                        items.clear();
                        n
                    }
                }
            } else {
                0
            };
            items.push_back(delivery);
            dropped
        };
        self.notify.notify_one();

        if dropped > 0 {
            self.metrics.record_overflow(dropped as u64);
            return Err(LiveError::ViewerQueueOverflow {
                session: self.metrics.session_id(),
                dropped,
            });
        }
        Ok(())
    }

    /// Next delivery, or `None` once the queue is closed
    pub async fn recv(&self) -> Option<Delivery> {
        loop {
            if self.is_closed() {
                return None;
            }
            if let Some(delivery) = self.items.lock().pop_front() {
                return Some(delivery);
            }
            self.notify.notified().await;
        }
    }

    /// Discard pending deliveries and wake the consumer
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.items.lock().clear();
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
