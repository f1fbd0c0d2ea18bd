use std::time::Duration;

use lightning_rpc_codec::DecoderConfig;

/// Reconnect delays.
///
/// The delay starts at `initial_delay`, doubles after every failed attempt or
/// dropped stream up to `max_delay`, and drops to `reset_delay` once a
/// connection is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before any connection has succeeded. Default: 500ms.
    pub initial_delay: Duration,
    /// Delay after a successful connection. Default: 1s.
    pub reset_delay: Duration,
    /// Upper bound. Default: 16s.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            reset_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
        }
    }
}

/// What happens to in-flight calls when the stream drops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingPolicy {
    /// Keep them pending; they resolve if a matching reply ever arrives.
    #[default]
    Retain,
    /// Fail them with [`RpcError::ConnectionLost`](crate::RpcError::ConnectionLost).
    FailOnDisconnect,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub reconnect: ReconnectPolicy,
    pub pending_policy: PendingPolicy,
    /// Limits for the inbound stream parser.
    pub decoder: DecoderConfig,
    /// Capacity of the lifecycle event channel. Default: 64.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            pending_policy: PendingPolicy::default(),
            decoder: DecoderConfig::default(),
            event_capacity: 64,
        }
    }
}
