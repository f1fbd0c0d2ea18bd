use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

/// A connected duplex byte stream.
///
/// Implemented for anything that is `AsyncRead + AsyncWrite`, so tests can
/// hand the client in-memory pipes instead of sockets.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// A type-erased connected stream.
pub type BoxedStream = Box<dyn AsyncStream>;

/// Future returned by [`Connector::connect`].
pub type ConnectFuture<'a> = Pin<Box<dyn Future<Output = Result<BoxedStream>> + Send + 'a>>;

/// Opens a fresh stream to the daemon.
///
/// The connection supervisor calls this once per attempt; an error schedules
/// the next attempt after the current backoff delay.
pub trait Connector: Send + Sync {
    /// Open a new stream.
    fn connect(&self) -> ConnectFuture<'_>;

    /// Human-readable target address for diagnostics.
    fn target(&self) -> String;
}
