//! Reconnecting, multiplexing JSON-RPC client for the lightning daemon socket.
//!
//! A [`Client`] owns one duplex stream to the daemon. Any number of calls may
//! be in flight at once; each reply is routed back to the call whose id it
//! carries. When the stream drops, a background supervisor reconnects with
//! exponential backoff while pending calls wait.

pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod pending;

mod connection;

pub use backoff::Backoff;
pub use client::Client;
pub use config::{ClientConfig, PendingPolicy, ReconnectPolicy};
pub use error::{ConnectionError, Result, RpcError};
pub use event::{ConnectionEvent, LinkState};
pub use pending::{PendingCall, PendingTable};

pub use lightning_rpc_codec::DecoderConfig;
pub use lightning_rpc_transport::{BoxedStream, ConnectFuture, Connector, TransportError};

#[cfg(unix)]
pub use lightning_rpc_transport::UnixConnector;
