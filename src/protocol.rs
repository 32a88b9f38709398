//! Wire messages exchanged with viewers.
//!
//! Every message is a JSON object tagged by `type`. Push viewers receive one
//! `snapshot` on connect and an `update` per sample afterwards; pull viewers
//! ask for `snapshot` or `delta` on their own schedule.

use serde::{Deserialize, Serialize};

use crate::core::{apply_window, Sample, SeriesBuffer, WindowRange, WindowSpec};

/// Window of samples plus the axis range to show them with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub epoch: u64,
    pub samples: Vec<Sample>,
    pub window_range: Option<WindowRange>,
}

impl WindowSnapshot {
    pub fn new(epoch: u64, mut samples: Vec<Sample>, spec: WindowSpec) -> Self {
        let view = apply_window(&samples, spec);
        let window_range = view.range;
        let skip = samples.len() - view.samples.len();
        samples.drain(..skip);
        Self {
            epoch,
            samples,
            window_range,
        }
    }

    /// Consistent window read from the buffer
    pub fn capture(buffer: &SeriesBuffer, spec: WindowSpec) -> Self {
        let (epoch, samples) = buffer.window_with_epoch(spec.max_points());
        Self::new(epoch, samples, spec)
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.samples.last().map(|s| s.sequence)
    }
}

/// Server → viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Initial window on connect, or the answer to a snapshot request
    Snapshot(WindowSnapshot),

    /// Continuity was lost; replace all local state with this window
    Resync(WindowSnapshot),

    /// One pushed sample
    Update { sequence: u64, value: f64 },

    /// Answer to a delta request
    Delta { epoch: u64, samples: Vec<Sample> },

    Pong,

    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn update(sample: Sample) -> Self {
        ServerMessage::Update {
            sequence: sample.sequence,
            value: sample.value,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Viewer → server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Snapshot,
    Delta {
        #[serde(default)]
        after: Option<u64>,
        epoch: u64,
    },
    Ping,
}
