use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{SinkExt, StreamExt};
use lightning_rpc_codec::{CodecError, JsonRpcCodec, Request, Response};
use lightning_rpc_transport::{BoxedStream, Connector};
use serde_json::Value;
use tokio::io::WriteHalf;
use tokio::sync::{broadcast, watch};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::config::{ClientConfig, PendingPolicy};
use crate::error::{ConnectionError, Result, RpcError};
use crate::event::{ConnectionEvent, LinkState};
use crate::pending::PendingTable;

/// Write side of the live stream, tagged with the generation it belongs to.
struct WriterSlot {
    generation: u64,
    sink: FramedWrite<WriteHalf<BoxedStream>, JsonRpcCodec>,
    /// Cancelled when a write fails or is abandoned partway, to end the read loop.
    lost: CancellationToken,
}

/// State shared between the client handle and the supervisor task.
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) target: String,
    pending: Mutex<PendingTable>,
    writer: tokio::sync::Mutex<Option<WriterSlot>>,
    state: watch::Sender<LinkState>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl Shared {
    pub(crate) fn new(config: ClientConfig, target: String) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            target,
            pending: Mutex::new(PendingTable::new()),
            writer: tokio::sync::Mutex::new(None),
            state,
            events,
        }
    }

    /// Lock the pending table. Never held across an await point.
    pub(crate) fn pending(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn link_state(&self) -> LinkState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe_state(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    pub(crate) fn subscribe_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    fn set_state(&self, state: LinkState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: ConnectionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Wait until a stream is up or the client is closed.
    ///
    /// Returns the live generation, or `None` once closed.
    pub(crate) async fn ready(state: &mut watch::Receiver<LinkState>) -> Option<u64> {
        match state.wait_for(|s| s.is_connected() || s.is_closed()).await {
            Ok(current) => current.generation(),
            Err(_) => None,
        }
    }

    /// Write one request to the live stream.
    ///
    /// Waits while disconnected. A write that fails with an I/O error marks
    /// the stream lost and is retried on the next stream, so each request is
    /// written completely to exactly one stream.
    ///
    /// Dropping this future while a write is underway also marks the stream
    /// lost: the unsent tail would otherwise precede the next request.
    pub(crate) async fn send(&self, request: &Request) -> Result<()> {
        let mut state = self.subscribe_state();
        loop {
            let generation = Self::ready(&mut state).await.ok_or(RpcError::Closed)?;

            {
                let mut slot = self.writer.lock().await;
                if let Some(writer) = slot
                    .as_mut()
                    .filter(|w| w.generation == generation && !w.lost.is_cancelled())
                {
                    let abandoned = writer.lost.clone().drop_guard();
                    let outcome = writer.sink.send(request).await;
                    let _ = abandoned.disarm();
                    match outcome {
                        Ok(()) => {
                            debug!(id = %request.id, method = %request.method, generation, "-->");
                            return Ok(());
                        }
                        Err(CodecError::Json(err)) => return Err(RpcError::Encode(err)),
                        Err(err) => {
                            warn!(id = %request.id, generation, error = %err, "write failed, waiting for reconnect");
                            writer.lost.cancel();
                            *slot = None;
                        }
                    }
                }
            }

            // Wait for this generation to go away before trying again.
            if state
                .wait_for(|s| s.generation() != Some(generation))
                .await
                .is_err()
            {
                return Err(RpcError::Closed);
            }
        }
    }

    /// Route one inbound value to its waiting call.
    fn dispatch(&self, value: Value) {
        let Some(response) = Response::from_value(value) else {
            debug!("discarding inbound value without a usable id");
            return;
        };

        let call = self.pending().take(&response.id);
        match call {
            Some(call) => {
                debug!(
                    id = %response.id,
                    method = call.method(),
                    error = response.is_error(),
                    "<--"
                );
                if !call.resolve(response.outcome.map_err(RpcError::Rpc)) {
                    debug!(id = %response.id, "caller stopped waiting");
                }
            }
            None => debug!(id = %response.id, "discarding response for unknown id"),
        }
    }

    fn fail_pending(&self, error: impl Fn(&str) -> RpcError) {
        let drained = self.pending().drain();
        for (id, call) in drained {
            call.resolve(Err(error(&id)));
        }
    }

    async fn close(&self) {
        self.set_state(LinkState::Closed);
        self.writer.lock().await.take();
        self.fail_pending(|_| RpcError::Closed);
        self.emit(ConnectionEvent::Closed);
        info!(endpoint = %self.target, "lightning rpc client closed");
    }
}

/// Own the connection for the client's lifetime.
///
/// This is the only task that connects, so at most one attempt is ever in
/// flight and a dropped stream schedules exactly one reconnect.
pub(crate) async fn supervise(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    shutdown: CancellationToken,
) {
    let mut backoff = Backoff::new(shared.config.reconnect.clone());
    let mut attempt = 0u64;
    let mut generation = 0u64;

    loop {
        attempt += 1;
        shared.set_state(LinkState::Connecting);
        shared.emit(ConnectionEvent::Connecting { attempt });
        debug!(endpoint = %shared.target, attempt, "connecting");

        let connected = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = connector.connect() => result,
        };

        let failure = match connected {
            Ok(stream) => {
                backoff.reset();
                generation += 1;
                let Some(failure) = serve(&shared, stream, generation, &shutdown).await else {
                    break;
                };
                warn!(endpoint = %shared.target, generation, error = %failure, "lightning rpc connection lost");
                if shared.config.pending_policy == PendingPolicy::FailOnDisconnect {
                    shared.fail_pending(|id| RpcError::ConnectionLost { id: id.to_string() });
                }
                failure
            }
            Err(err) => {
                warn!(endpoint = %shared.target, attempt, error = %err, "lightning rpc connect failed");
                ConnectionError::Transport(err)
            }
        };

        shared.set_state(LinkState::Disconnected);
        shared.emit(ConnectionEvent::Disconnected {
            reason: failure.to_string(),
        });

        let delay = backoff.increase();
        shared.emit(ConnectionEvent::ReconnectScheduled { delay });
        info!(delay_ms = delay.as_millis() as u64, "reconnecting");

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    shared.close().await;
}

/// Run one established stream until it fails. Returns `None` on shutdown.
async fn serve(
    shared: &Shared,
    stream: BoxedStream,
    generation: u64,
    shutdown: &CancellationToken,
) -> Option<ConnectionError> {
    let (read_half, write_half) = tokio::io::split(stream);
    let lost = shutdown.child_token();

    *shared.writer.lock().await = Some(WriterSlot {
        generation,
        sink: FramedWrite::new(
            write_half,
            JsonRpcCodec::with_config(shared.config.decoder.clone()),
        ),
        lost: lost.clone(),
    });
    shared.set_state(LinkState::Connected { generation });
    shared.emit(ConnectionEvent::Connected { generation });
    info!(endpoint = %shared.target, generation, "lightning rpc connected");

    // A fresh parser per stream: partial state never survives a reconnect.
    let mut values = FramedRead::new(
        read_half,
        JsonRpcCodec::with_config(shared.config.decoder.clone()),
    );

    let failure = loop {
        tokio::select! {
            _ = lost.cancelled() => {
                if shutdown.is_cancelled() {
                    break None;
                }
                break Some(ConnectionError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "write to daemon failed or was abandoned",
                )));
            }
            next = values.next() => match next {
                Some(Ok(value)) => shared.dispatch(value),
                Some(Err(err)) => break Some(ConnectionError::from(err)),
                None => break Some(ConnectionError::Closed),
            },
        }
    };

    // Clear the slot first so a writer never sees a dead stream as current.
    shared.writer.lock().await.take();
    shared.set_state(LinkState::Disconnected);
    failure
}
