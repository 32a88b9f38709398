use serde::{Deserialize, Serialize};

/// Viewer session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Connecting,
    Active,
    /// Terminal
    Disconnected,
}

impl SessionState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, target),
            (Connecting, Active) | (Connecting, Disconnected) | (Active, Disconnected)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Connecting => "Connecting",
            Self::Active => "Active",
            Self::Disconnected => "Disconnected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Connecting
    }
}
