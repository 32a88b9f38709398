use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::SeriesBuffer;
use crate::error::LiveResult;
use crate::protocol::WindowSnapshot;
use crate::session::{ViewerEvent, ViewerSession};
use super::hub::DeliveryChannel;
use super::queue::SessionQueue;

/// A connected viewer's end of the delivery channel
///
/// Yields events in delivery order until the session is disconnected.
/// Dropping the subscription disconnects the session.
pub struct Subscription {
    channel: DeliveryChannel,
    id: u64,
    snapshot: Option<WindowSnapshot>,
    view: Arc<Mutex<ViewerSession>>,
    queue: Option<Arc<SessionQueue>>,
    cancel: CancellationToken,
    poll: Option<Interval>,
}

impl Subscription {
    pub(crate) fn new(
        channel: DeliveryChannel,
        id: u64,
        snapshot: WindowSnapshot,
        view: Arc<Mutex<ViewerSession>>,
        queue: Option<Arc<SessionQueue>>,
        cancel: CancellationToken,
        refresh: Duration,
    ) -> Self {
        // Pull viewers poll on their own phase, starting one period after connect
        let poll = match queue {
            Some(_) => None,
            None => {
                let mut ticker = tokio::time::interval_at(Instant::now() + refresh, refresh);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Some(ticker)
            }
        };

        Self {
            channel,
            id,
            snapshot: Some(snapshot),
            view,
            queue,
            cancel,
            poll,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Initial window; `None` once taken
    pub fn take_snapshot(&mut self) -> Option<WindowSnapshot> {
        self.snapshot.take()
    }

    pub fn initial_snapshot(&self) -> Option<&WindowSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the next event; `None` after disconnect
    pub async fn next(&mut self) -> Option<ViewerEvent> {
        loop {
            let outcome = if let Some(queue) = self.queue.clone() {
                let delivery = tokio::select! {
                    _ = self.cancel.cancelled() => return None,
                    delivery = queue.recv() => delivery?,
                };
                self.receive(|view, buffer| view.receive(delivery.epoch, delivery.sample, buffer))
            } else if let Some(ticker) = self.poll.as_mut() {
                tokio::select! {
                    _ = self.cancel.cancelled() => return None,
                    _ = ticker.tick() => {}
                }
                self.receive(|view, buffer| view.catch_up(buffer))
            } else {
                return None;
            };

            match outcome {
                Ok(Some(event)) => return Some(event),
                Ok(None) if self.cancel.is_cancelled() => return None,
                Ok(None) => {}
                Err(e) => warn!("Viewer {}: delivery failed: {}", self.id, e),
            }
        }
    }

    fn receive<F>(&self, f: F) -> LiveResult<Option<ViewerEvent>>
    where
        F: FnOnce(&mut ViewerSession, &SeriesBuffer) -> LiveResult<Option<ViewerEvent>>,
    {
        let mut view = self.view.lock();
        f(&mut view, self.channel.buffer())
    }

    /// Refetch the window and replace local state
    pub fn resync(&self) -> LiveResult<WindowSnapshot> {
        self.view.lock().resync(self.channel.buffer())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.channel.disconnect(self.id);
    }
}
