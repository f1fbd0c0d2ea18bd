//! RPC socket resolution and connectors.
//!
//! The daemon listens on a single filesystem-path Unix domain socket named
//! `lightning-rpc`. This is the lowest layer of lightning-rpc: it turns a
//! user-supplied path into the socket address and opens byte streams to it.
//! Everything else builds on the [`Connector`] seam provided here.

pub mod error;
pub mod path;

#[cfg(feature = "async")]
pub mod traits;

#[cfg(all(unix, feature = "async"))]
pub mod uds;

pub use error::{Result, TransportError};
pub use path::{default_rpc_path, resolve_rpc_path, MAX_PATH_LEN, RPC_FILE_NAME};

#[cfg(feature = "async")]
pub use traits::{AsyncStream, BoxedStream, ConnectFuture, Connector};

#[cfg(all(unix, feature = "async"))]
pub use uds::UnixConnector;
