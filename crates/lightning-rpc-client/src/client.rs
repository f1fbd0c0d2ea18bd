use std::sync::{Arc, Mutex, PoisonError};

use lightning_rpc_codec::Request;
use lightning_rpc_transport::Connector;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::connection::{self, Shared};
use crate::error::{Result, RpcError};
use crate::event::{ConnectionEvent, LinkState};

/// Handle to the daemon's JSON-RPC socket.
///
/// Calls may be issued concurrently from any number of tasks through a
/// shared reference. The connection is owned by a background task that
/// reconnects with exponential backoff; calls issued while disconnected wait
/// for the next stream. Dropping the client stops that task.
pub struct Client {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Create a client for the socket at `location`.
    ///
    /// `location` is the lightning directory or the socket itself; see
    /// [`resolve_rpc_path`](lightning_rpc_transport::resolve_rpc_path).
    /// Connecting starts immediately in the background.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[cfg(unix)]
    pub fn new(
        location: impl AsRef<std::path::Path>,
        config: ClientConfig,
    ) -> std::result::Result<Self, lightning_rpc_transport::TransportError> {
        let connector = lightning_rpc_transport::UnixConnector::new(location)?;
        Ok(Self::with_connector(connector, config))
    }

    /// [`Client::new`] with the default configuration.
    #[cfg(unix)]
    pub fn connect(
        location: impl AsRef<std::path::Path>,
    ) -> std::result::Result<Self, lightning_rpc_transport::TransportError> {
        Self::new(location, ClientConfig::default())
    }

    /// Create a client over an arbitrary [`Connector`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_connector(connector: impl Connector + 'static, config: ClientConfig) -> Self {
        let shared = Arc::new(Shared::new(config, connector.target()));
        let shutdown = CancellationToken::new();
        let connector: Arc<dyn Connector> = Arc::new(connector);
        let supervisor = tokio::spawn(connection::supervise(
            Arc::clone(&shared),
            connector,
            shutdown.clone(),
        ));
        Self {
            shared,
            shutdown,
            supervisor: Mutex::new(Some(supervisor)),
        }
    }

    /// Invoke `method` with positional `params` and wait for the reply.
    ///
    /// `params` must serialize to a JSON array; anything else fails with
    /// [`RpcError::InvalidCall`] before a request is sent. A reply carrying a
    /// non-null `error` fails with [`RpcError::Rpc`].
    ///
    /// Dropping the returned future forgets the call, and a late reply is
    /// discarded. If it is dropped after the request was written, the daemon
    /// still runs it. If it is dropped partway through the write, the stream
    /// is torn down and reconnected, so no partial request reaches the daemon
    /// ahead of the next one.
    pub async fn call<P: Serialize>(&self, method: &str, params: P) -> Result<Value> {
        let params = match serde_json::to_value(params) {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                return Err(RpcError::InvalidCall(format!(
                    "params must be an array, got {}",
                    json_kind(&other)
                )))
            }
            Err(err) => {
                return Err(RpcError::InvalidCall(format!(
                    "params are not serializable: {err}"
                )))
            }
        };
        self.call_positional(method, params).await
    }

    /// Invoke `method` with an already-built parameter list.
    pub async fn call_positional(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        if method.is_empty() {
            return Err(RpcError::InvalidCall(
                "method must be a non-empty string".to_string(),
            ));
        }
        if self.shutdown.is_cancelled() {
            return Err(RpcError::Closed);
        }

        let (id, mut response) = self.shared.pending().register(method, &params);
        let _guard = PendingGuard {
            shared: &self.shared,
            id: id.clone(),
        };
        let request = Request::new(method, params, id);

        // A pending call may be failed while it is still waiting to be
        // written; stop trying to send it in that case.
        tokio::select! {
            biased;
            outcome = &mut response => return outcome.unwrap_or(Err(RpcError::Closed)),
            sent = self.shared.send(&request) => sent?,
        }

        response.await.unwrap_or(Err(RpcError::Closed))
    }

    /// Subscribe to connection lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.shared.subscribe_events()
    }

    /// Wait until a stream to the daemon is up.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut state = self.shared.subscribe_state();
        Shared::ready(&mut state)
            .await
            .map(|_| ())
            .ok_or(RpcError::Closed)
    }

    pub fn state(&self) -> LinkState {
        self.shared.link_state()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Number of calls awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.shared.pending().len()
    }

    /// The socket path (or connector target) the client dials.
    pub fn rpc_path(&self) -> &str {
        &self.shared.target
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Stop reconnecting, close the stream, and fail pending calls with
    /// [`RpcError::Closed`]. Waits for the background task to finish.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self
            .supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "connection task ended abnormally");
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.shared.target)
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Removes the call from the pending table when its future is dropped.
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.shared.pending().remove(&self.id) {
            debug!(id = %self.id, "call abandoned before a reply arrived");
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
