use lightning_rpc_codec::CodecError;
use lightning_rpc_transport::TransportError;
use serde_json::Value;

/// Errors surfaced to the caller of [`Client::call`](crate::Client::call).
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The call was rejected before anything was sent.
    #[error("invalid call: {0}")]
    InvalidCall(String),

    /// The daemon answered with an error payload.
    #[error("rpc error: {0}")]
    Rpc(Value),

    /// The stream dropped while the call was pending and the client is
    /// configured to fail pending calls on disconnect.
    #[error("connection lost while call {id} was pending")]
    ConnectionLost { id: String },

    /// The client was shut down.
    #[error("client closed")]
    Closed,

    /// The request could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RpcError {
    /// The daemon's error payload, for [`RpcError::Rpc`].
    pub fn payload(&self) -> Option<&Value> {
        match self {
            RpcError::Rpc(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Stream-level failures. These drive reconnects and lifecycle events; they
/// are never returned from a call.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Connecting failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The daemon sent bytes that are not a JSON value stream.
    #[error("parse error: {0}")]
    Parse(CodecError),

    /// Reading or writing the stream failed.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The daemon closed the stream.
    #[error("connection closed by daemon")]
    Closed,
}

impl From<CodecError> for ConnectionError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(io) => ConnectionError::Io(io),
            other => ConnectionError::Parse(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
