use thiserror::Error;

/// Result type for live series operations
pub type LiveResult<T> = Result<T, LiveError>;

/// Errors that can occur in the distribution core
///
/// Every variant is local and recoverable: the producer loop and the
/// process never terminate because of one of these.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("Producer tick {sequence} failed: {reason}")]
    ProducerTickFailure { sequence: u64, reason: String },

    #[error("Viewer queue overflow for session {session}: {dropped} deliveries dropped")]
    ViewerQueueOverflow { session: u64, dropped: usize },

    #[error("Stale cursor (epoch {epoch}, after {after:?}), full resync required")]
    StaleResyncRequired { epoch: u64, after: Option<u64> },

    #[error("Session not found: {0}")]
    SessionNotFound(u64),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LiveError {
    /// True when the caller should recover with a fresh window snapshot
    pub fn requires_resync(&self) -> bool {
        matches!(self, LiveError::StaleResyncRequired { .. })
    }

    /// Stable code sent to viewers in error messages
    pub fn code(&self) -> &'static str {
        match self {
            LiveError::ProducerTickFailure { .. } => "PRODUCER_TICK_FAILURE",
            LiveError::ViewerQueueOverflow { .. } => "VIEWER_QUEUE_OVERFLOW",
            LiveError::StaleResyncRequired { .. } => "STALE_RESYNC_REQUIRED",
            LiveError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            LiveError::InvalidTransition { .. } => "INVALID_TRANSITION",
            LiveError::InvalidConfig(_) => "INVALID_CONFIG",
            LiveError::Io(_) => "IO_ERROR",
            LiveError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
