use std::time::Duration;

/// Lifecycle notifications, delivered through [`Client::events`](crate::Client::events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt started. `attempt` counts from 1 across the
    /// client's lifetime.
    Connecting { attempt: u64 },
    /// A stream is up. `generation` increases with every successful connect.
    Connected { generation: u64 },
    /// An attempt failed or an established stream ended.
    Disconnected { reason: String },
    /// The next attempt will start after `delay`.
    ReconnectScheduled { delay: Duration },
    /// The client shut down; no further events follow.
    Closed,
}

/// Readiness of the current stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected { generation: u64 },
    Closed,
}

impl LinkState {
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, LinkState::Closed)
    }

    /// Generation of the live stream, if connected.
    pub fn generation(&self) -> Option<u64> {
        match self {
            LinkState::Connected { generation } => Some(*generation),
            _ => None,
        }
    }
}
