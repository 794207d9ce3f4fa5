use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one send attempt
///
/// A session walks `Idle → Connecting → Identifying → Sending →
/// ShuttingDown → Completed` on success. Any failure after `Idle` moves to
/// `Aborting` and ends in `Closed`. Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing has happened yet
    Idle,
    /// Opening the transport, or probing serial candidates
    Connecting,
    /// Running the dialect handshake
    Identifying,
    /// Streaming job lines
    Sending,
    /// Closing the transport after a complete job
    ShuttingDown,
    /// Job sent and transport closed
    Completed,
    /// Tearing down after a failure
    Aborting,
    /// Transport closed after a failure
    Closed,
}

impl SessionState {
    /// Check if a transition from this state to `target` is valid.
    ///
    /// Returns `true` for valid transitions:
    /// - Idle → Connecting, Aborting
    /// - Connecting → Identifying, Aborting
    /// - Identifying → Sending, Aborting
    /// - Sending → ShuttingDown, Aborting
    /// - ShuttingDown → Completed, Aborting
    /// - Aborting → Closed
    ///
    /// No state is ever re-entered.
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Idle, Connecting | Aborting)
                | (Connecting, Identifying | Aborting)
                | (Identifying, Sending | Aborting)
                | (Sending, ShuttingDown | Aborting)
                | (ShuttingDown, Completed | Aborting)
                | (Aborting, Closed)
        )
    }

    /// Whether the attempt is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Identifying => write!(f, "Identifying"),
            Self::Sending => write!(f, "Sending"),
            Self::ShuttingDown => write!(f, "ShuttingDown"),
            Self::Completed => write!(f, "Completed"),
            Self::Aborting => write!(f, "Aborting"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
