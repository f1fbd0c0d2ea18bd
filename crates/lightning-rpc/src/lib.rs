//! Resilient JSON-RPC client for the lightning daemon socket.
//!
//! The daemon speaks JSON-RPC over a Unix domain socket with no framing:
//! requests and replies are bare JSON objects written back to back. This
//! crate bundles the layers that make that usable.
//!
//! # Crate Structure
//!
//! - [`transport`]: socket path resolution and connectors
//! - [`codec`]: incremental demultiplexing of concatenated JSON values
//! - [`client`]: reconnecting, multiplexing client (behind `client` feature)
//! - [`LightningClient`]: one async wrapper per daemon command
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use lightning_rpc::LightningClient;
//!
//! let ln = LightningClient::open("/home/alice/.lightning")?;
//! let info = ln.getinfo(vec![]).await?;
//! println!("{}", info["alias"]);
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use lightning_rpc_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use lightning_rpc_codec::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use lightning_rpc_client::*;
}

#[cfg(feature = "client")]
mod methods;

#[cfg(feature = "client")]
pub use lightning_rpc_client::{Client, ClientConfig, RpcError};
#[cfg(feature = "client")]
pub use methods::{LightningClient, METHODS};
