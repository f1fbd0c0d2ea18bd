use std::path::{Path, PathBuf};

use tokio::net::UnixStream;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::path::resolve_rpc_path;
use crate::traits::{BoxedStream, ConnectFuture, Connector};

/// Connects to the daemon's filesystem-path Unix domain socket.
#[derive(Debug, Clone)]
pub struct UnixConnector {
    path: PathBuf,
}

impl UnixConnector {
    /// Create a connector for a user-supplied location.
    ///
    /// See [`resolve_rpc_path`] for how the location is interpreted.
    pub fn new(location: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            path: resolve_rpc_path(location)?,
        })
    }

    /// Create a connector for an exact socket path, skipping name defaulting.
    pub fn exact(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The socket path this connector dials.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Connect to the socket.
    pub async fn connect_stream(&self) -> Result<UnixStream> {
        let stream = UnixStream::connect(&self.path)
            .await
            .map_err(|e| TransportError::Connect {
                path: self.path.clone(),
                source: e,
            })?;
        debug!(path = ?self.path, "connected to unix domain socket");
        Ok(stream)
    }
}

impl Connector for UnixConnector {
    fn connect(&self) -> ConnectFuture<'_> {
        Box::pin(async move {
            let stream = self.connect_stream().await?;
            Ok(Box::new(stream) as BoxedStream)
        })
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixListener;

    use super::*;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "lnrpc-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[tokio::test]
    async fn connect_through_trait_object() {
        let dir = unique_temp_dir("uds-connect");
        let connector = UnixConnector::new(&dir).unwrap();
        assert_eq!(connector.path(), dir.join("lightning-rpc"));

        let listener = UnixListener::bind(connector.path()).unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).await.unwrap();
            buf
        });

        let dyn_connector: &dyn Connector = &connector;
        let mut stream = dyn_connector.connect().await.unwrap();
        stream.write_all(b"hello").await.unwrap();

        assert_eq!(&server.await.unwrap(), b"hello");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn connect_missing_socket_reports_path() {
        let dir = unique_temp_dir("uds-missing");
        let connector = UnixConnector::new(&dir).unwrap();

        let err = connector.connect_stream().await.unwrap_err();
        match &err {
            TransportError::Connect { path, source } => {
                assert_eq!(path, &dir.join("lightning-rpc"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.io_source().is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn exact_path_is_not_rewritten() {
        let connector = UnixConnector::exact("/tmp/node.sock");
        assert_eq!(connector.path(), Path::new("/tmp/node.sock"));
        assert_eq!(connector.target(), "/tmp/node.sock");
    }
}
