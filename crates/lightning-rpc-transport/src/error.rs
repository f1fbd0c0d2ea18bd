use std::path::PathBuf;

/// Errors that can occur while resolving or connecting to the RPC socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The RPC path was not absolute.
    #[error("the rpc path must be an absolute path: {}", .path.display())]
    RelativePath { path: PathBuf },

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {}", .path.display())]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The underlying I/O error, if any.
    pub fn io_source(&self) -> Option<&std::io::Error> {
        match self {
            TransportError::Connect { source, .. } | TransportError::Io(source) => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
