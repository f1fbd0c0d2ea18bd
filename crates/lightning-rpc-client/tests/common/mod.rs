#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use lightning_rpc_client::{
    BoxedStream, ClientConfig, ConnectFuture, ConnectionEvent, Connector, ReconnectPolicy,
    TransportError,
};
use lightning_rpc_codec::JsonRpcCodec;
use serde_json::Value;
use tokio::io::{duplex, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::codec::FramedRead;

pub const WAIT: Duration = Duration::from_secs(5);

/// Connector that hands out in-memory streams queued by a [`DaemonHandle`].
///
/// An attempt waits until the test queues something, so a connect can be
/// held "in flight" for as long as the test wants.
pub struct PipeConnector {
    queue: Mutex<mpsc::UnboundedReceiver<Option<DuplexStream>>>,
    attempts: Arc<AtomicUsize>,
}

pub struct DaemonHandle {
    queue: mpsc::UnboundedSender<Option<DuplexStream>>,
    attempts: Arc<AtomicUsize>,
}

pub fn pipe() -> (PipeConnector, DaemonHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let attempts = Arc::new(AtomicUsize::new(0));
    (
        PipeConnector {
            queue: Mutex::new(rx),
            attempts: Arc::clone(&attempts),
        },
        DaemonHandle {
            queue: tx,
            attempts,
        },
    )
}

impl Connector for PipeConnector {
    fn connect(&self) -> ConnectFuture<'_> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.queue.lock().await.recv().await {
                Some(Some(stream)) => Ok(Box::new(stream) as BoxedStream),
                _ => Err(TransportError::Io(io::Error::from(
                    io::ErrorKind::ConnectionRefused,
                ))),
            }
        })
    }

    fn target(&self) -> String {
        "pipe".to_string()
    }
}

impl DaemonHandle {
    /// Queue a stream for the next connect attempt.
    pub fn accept(&self) -> FakeDaemon {
        self.accept_with_capacity(64 * 1024)
    }

    /// Queue a stream whose pipe holds at most `capacity` unread bytes.
    pub fn accept_with_capacity(&self, capacity: usize) -> FakeDaemon {
        let (client, daemon) = duplex(capacity);
        self.queue.send(Some(client)).expect("connector dropped");
        FakeDaemon::new(daemon)
    }

    /// Make the next connect attempt fail.
    pub fn refuse(&self) {
        self.queue.send(None).expect("connector dropped");
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// The daemon end of an in-memory stream.
pub struct FakeDaemon {
    requests: FramedRead<ReadHalf<DuplexStream>, JsonRpcCodec>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeDaemon {
    fn new(stream: DuplexStream) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        Self {
            requests: FramedRead::new(read_half, JsonRpcCodec::new()),
            writer,
        }
    }

    pub async fn next_request(&mut self) -> Value {
        tokio::time::timeout(WAIT, self.requests.next())
            .await
            .expect("timed out waiting for a request")
            .expect("client closed the stream")
            .expect("client sent malformed JSON")
    }

    /// Returns the next request if one arrives within `wait`.
    pub async fn try_next_request(&mut self, wait: Duration) -> Option<Value> {
        match tokio::time::timeout(wait, self.requests.next()).await {
            Ok(Some(Ok(value))) => Some(value),
            _ => None,
        }
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("write to client");
    }

    pub async fn reply(&mut self, value: Value) {
        let bytes = serde_json::to_vec(&value).unwrap();
        self.send_raw(&bytes).await;
    }
}

/// Millisecond-scale reconnect delays.
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        reconnect: ReconnectPolicy {
            initial_delay: Duration::from_millis(5),
            reset_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
        },
        ..ClientConfig::default()
    }
}

pub async fn next_event(events: &mut broadcast::Receiver<ConnectionEvent>) -> ConnectionEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Skip events until one matches.
pub async fn wait_for_event(
    events: &mut broadcast::Receiver<ConnectionEvent>,
    matches: impl Fn(&ConnectionEvent) -> bool,
) -> ConnectionEvent {
    loop {
        let event = next_event(events).await;
        if matches(&event) {
            return event;
        }
    }
}

pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(WAIT, future)
        .await
        .expect("timed out")
}
