use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::{apply_window, Sample, SeriesBuffer, WindowRange, WindowSpec};
use crate::error::{LiveError, LiveResult};
use crate::observability::SessionMetrics;
use crate::protocol::{ServerMessage, WindowSnapshot};
use super::SessionState;

/// What a session hands to its transport after processing a delivery
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// New samples, strictly increasing and all newer than anything sent before
    Samples(Vec<Sample>),

    /// Continuity was lost; local state was replaced by this window
    Resync(WindowSnapshot),
}

impl ViewerEvent {
    pub fn into_messages(self) -> Vec<ServerMessage> {
        match self {
            ViewerEvent::Samples(samples) => samples.into_iter().map(ServerMessage::update).collect(),
            ViewerEvent::Resync(snapshot) => vec![ServerMessage::Resync(snapshot)],
        }
    }
}

/// Render surface handed to the charting layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    pub session_id: u64,
    pub labels: Vec<u64>,
    pub values: Vec<f64>,
    pub latest: Option<Sample>,
    pub window_range: Option<WindowRange>,
    pub readout: String,
}

/// Per-connection view of the series
///
/// Owns the samples this viewer has been shown. Every delivery, pushed or
/// polled, goes through the same cursor check so a sample is shown at most
/// once and never out of order.
pub struct ViewerSession {
    id: u64,
    created_at: Instant,
    state: SessionState,
    epoch: u64,
    last_delivered: Option<u64>,
    local: VecDeque<Sample>,
    window: WindowSpec,
    metrics: Arc<SessionMetrics>,
}

impl ViewerSession {
    pub fn new(id: u64, window: WindowSpec, metrics: Arc<SessionMetrics>) -> Self {
        Self {
            id,
            created_at: Instant::now(),
            state: SessionState::Connecting,
            epoch: 0,
            last_delivered: None,
            local: VecDeque::with_capacity(window.max_points()),
            window,
            metrics,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn last_delivered_sequence(&self) -> Option<u64> {
        self.last_delivered
    }

    pub fn metrics(&self) -> &Arc<SessionMetrics> {
        &self.metrics
    }

    /// Transition to a new state with validation
    pub fn transition_to(&mut self, target: SessionState) -> LiveResult<()> {
        if !self.state.can_transition_to(&target) {
            return Err(LiveError::InvalidTransition {
                from: self.state.name().to_string(),
                to: target.name().to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    /// `Connecting → Active`: seed local state from the current window
    pub fn activate(&mut self, buffer: &SeriesBuffer) -> LiveResult<WindowSnapshot> {
        self.transition_to(SessionState::Active)?;
        Ok(self.load_window(buffer))
    }

    /// Replace local state with a fresh window
    pub fn resync(&mut self, buffer: &SeriesBuffer) -> LiveResult<WindowSnapshot> {
        if self.state != SessionState::Active {
            return Err(LiveError::InvalidTransition {
                from: self.state.name().to_string(),
                to: "Resync".to_string(),
            });
        }
        self.metrics.record_resync();
        Ok(self.load_window(buffer))
    }

    fn load_window(&mut self, buffer: &SeriesBuffer) -> WindowSnapshot {
        let snapshot = WindowSnapshot::capture(buffer, self.window);
        self.epoch = snapshot.epoch;
        self.last_delivered = snapshot.last_sequence();
        self.local = snapshot.samples.iter().copied().collect();
        debug!(
            "session {}: loaded window epoch={} last={:?}",
            self.id, self.epoch, self.last_delivered
        );
        snapshot
    }

    /// Handle one pushed sample
    ///
    /// Duplicates and leftovers from an older epoch are ignored. A gap (the
    /// queue dropped samples) is filled from the buffer; a newer epoch forces
    /// a resync.
    pub fn receive(
        &mut self,
        epoch: u64,
        sample: Sample,
        buffer: &SeriesBuffer,
    ) -> LiveResult<Option<ViewerEvent>> {
        if self.state != SessionState::Active || epoch < self.epoch {
            return Ok(None);
        }
        if epoch > self.epoch {
            warn!("session {}: epoch moved {} -> {}, resyncing", self.id, self.epoch, epoch);
            return self.resync(buffer).map(|s| Some(ViewerEvent::Resync(s)));
        }

        let expected = self.last_delivered.map(|last| last + 1).unwrap_or(0);
        if sample.sequence < expected {
            self.metrics.record_duplicate();
            return Ok(None);
        }
        if sample.sequence > expected {
            debug!(
                "session {}: gap {}..{}, catching up",
                self.id, expected, sample.sequence
            );
            self.metrics.record_catch_up();
            return self.catch_up(buffer);
        }

        self.accept(sample);
        Ok(Some(ViewerEvent::Samples(vec![sample])))
    }

    /// Read everything after the cursor from the buffer
    ///
    /// This is the pull strategy's poll and the push strategy's gap repair.
    /// Returns `None` when already current.
    pub fn catch_up(&mut self, buffer: &SeriesBuffer) -> LiveResult<Option<ViewerEvent>> {
        if self.state != SessionState::Active {
            return Ok(None);
        }

        match buffer.delta(self.last_delivered, self.epoch) {
            Ok(samples) => {
                let fresh: Vec<Sample> = samples.into_iter().filter(|s| self.accept(*s)).collect();
                if fresh.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(ViewerEvent::Samples(fresh)))
                }
            }
            Err(e) if e.requires_resync() => {
                warn!("session {}: {}", self.id, e);
                self.resync(buffer).map(|s| Some(ViewerEvent::Resync(s)))
            }
            Err(e) => Err(e),
        }
    }

    fn accept(&mut self, sample: Sample) -> bool {
        if let Some(last) = self.last_delivered {
            if sample.sequence <= last {
                self.metrics.record_duplicate();
                return false;
            }
        }
        self.local.push_back(sample);
        while self.local.len() > self.window.max_points() {
            self.local.pop_front();
        }
        self.last_delivered = Some(sample.sequence);
        self.metrics.record_delivered(1);
        true
    }

    /// `→ Disconnected`; local state is released
    pub fn disconnect(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = SessionState::Disconnected;
        self.local = VecDeque::new();
    }

    /// Chart projection
    pub fn display_state(&self) -> DisplayState {
        let samples: Vec<Sample> = self.local.iter().copied().collect();
        let view = apply_window(&samples, self.window);

        DisplayState {
            session_id: self.id,
            labels: view.samples.iter().map(|s| s.sequence).collect(),
            values: view.samples.iter().map(|s| s.value).collect(),
            latest: view.samples.last().copied(),
            window_range: view.range,
            readout: self.readout(),
        }
    }

    /// Text projection of the latest sample
    pub fn readout(&self) -> String {
        match self.local.back() {
            Some(latest) => format!(
                "Latest Count: {}, Latest Random Val: {}",
                latest.sequence, latest.value
            ),
            None => "Waiting for data".to_string(),
        }
    }
}
