use crate::core::Sample;
use crate::error::{LiveError, LiveResult};
use parking_lot::RwLock;
use std::collections::VecDeque;

struct SeriesInner {
    samples: VecDeque<Sample>,
    next_sequence: u64,
    epoch: u64,
}

impl SeriesInner {
    /// Sequence of the oldest retained sample (equals `next_sequence` when empty)
    fn first_sequence(&self) -> u64 {
        self.next_sequence - self.samples.len() as u64
    }

    fn tail_after(&self, sequence: u64) -> Vec<Sample> {
        if sequence >= self.next_sequence {
            return Vec::new();
        }
        let first = self.first_sequence();
        let start = if sequence < first {
            0
        } else {
            (sequence - first + 1) as usize
        };
        if start >= self.samples.len() {
            return Vec::new();
        }
        self.samples.range(start..).copied().collect()
    }
}

/// Append-only store of samples shared by the producer and all readers
///
/// Single writer (the producer), any number of concurrent readers. Each
/// operation holds the lock only for the copy of the requested slice, so a
/// reader can never stall the writer for longer than one bounded copy.
pub struct SeriesBuffer {
    inner: RwLock<SeriesInner>,
    retention: Option<usize>,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Buffer that evicts the oldest samples beyond `cap` entries
    pub fn with_retention(cap: usize) -> Self {
        Self::build(Some(cap).filter(|c| *c > 0))
    }

    fn build(retention: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(SeriesInner {
                samples: VecDeque::new(),
                next_sequence: 0,
                epoch: 0,
            }),
            retention,
        }
    }

    /// Store `value` under the next sequence number. Writer-side only.
    pub fn append(&self, value: f64) -> Sample {
        self.append_tagged(value).1
    }

    /// `append`, also returning the epoch the sample was written under.
    /// Both come from the same write guard, so a concurrent `reset` cannot
    /// pair a new-epoch sample with the old epoch.
    pub fn append_tagged(&self, value: f64) -> (u64, Sample) {
        let mut inner = self.inner.write();
        let sample = Sample::new(inner.next_sequence, value);
        inner.next_sequence += 1;
        inner.samples.push_back(sample);
        if let Some(cap) = self.retention {
            while inner.samples.len() > cap {
                inner.samples.pop_front();
            }
        }
        (inner.epoch, sample)
    }

    /// The most recent `min(max_points, len)` samples in sequence order
    pub fn read_window(&self, max_points: usize) -> Vec<Sample> {
        self.window_with_epoch(max_points).1
    }

    /// Window read together with the epoch it belongs to
    pub fn window_with_epoch(&self, max_points: usize) -> (u64, Vec<Sample>) {
        let inner = self.inner.read();
        let skip = inner.samples.len().saturating_sub(max_points);
        let window = inner.samples.range(skip..).copied().collect();
        (inner.epoch, window)
    }

    /// All retained samples with a sequence strictly greater than `sequence`
    ///
    /// Returns an empty vector when the caller is current or ahead.
    pub fn read_from(&self, sequence: u64) -> Vec<Sample> {
        self.inner.read().tail_after(sequence)
    }

    /// Continuity-checked delta read used for catch-up
    ///
    /// `after` is the last sequence the caller holds (`None` if it holds
    /// nothing yet). Fails with `StaleResyncRequired` when the epoch moved,
    /// when the cursor is ahead of the series, or when retention already
    /// evicted samples the caller never saw.
    pub fn delta(&self, after: Option<u64>, epoch: u64) -> LiveResult<Vec<Sample>> {
        let inner = self.inner.read();
        let stale = || LiveError::StaleResyncRequired {
            epoch: inner.epoch,
            after,
        };

        if inner.epoch != epoch {
            return Err(stale());
        }

        match after {
            None => {
                if inner.first_sequence() != 0 {
                    return Err(stale());
                }
                Ok(inner.samples.iter().copied().collect())
            }
            Some(seq) => {
                if seq >= inner.next_sequence || seq + 1 < inner.first_sequence() {
                    return Err(stale());
                }
                Ok(inner.tail_after(seq))
            }
        }
    }

    pub fn latest(&self) -> Option<Sample> {
        self.inner.read().samples.back().copied()
    }

    /// Sequence number the next `append` will assign
    pub fn next_sequence(&self) -> u64 {
        self.inner.read().next_sequence
    }

    pub fn epoch(&self) -> u64 {
        self.inner.read().epoch
    }

    pub fn len(&self) -> usize {
        self.inner.read().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn retention(&self) -> Option<usize> {
        self.retention
    }

    /// Drop all history and restart sequences at 0 under a new epoch.
    /// Writer-side only; models a restarted producer.
    pub fn reset(&self) -> u64 {
        let mut inner = self.inner.write();
        inner.samples.clear();
        inner.next_sequence = 0;
        inner.epoch += 1;
        inner.epoch
    }
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new()
    }
}
