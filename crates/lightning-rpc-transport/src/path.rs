use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TransportError};

/// File name of the daemon's RPC socket.
pub const RPC_FILE_NAME: &str = "lightning-rpc";

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
pub const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
pub const MAX_PATH_LEN: usize = 104;

/// Resolve a user-supplied location into the RPC socket path.
///
/// The location must be absolute. It may name either the socket itself or
/// the daemon's data directory; in the latter case `lightning-rpc` is
/// appended.
pub fn resolve_rpc_path(location: impl AsRef<Path>) -> Result<PathBuf> {
    let location = location.as_ref();
    if !location.is_absolute() {
        return Err(TransportError::RelativePath {
            path: location.to_path_buf(),
        });
    }

    let path = if location.ends_with(RPC_FILE_NAME) {
        location.to_path_buf()
    } else {
        location.join(RPC_FILE_NAME)
    };

    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path,
            len,
            max: MAX_PATH_LEN,
        });
    }

    debug!(?path, "resolved rpc path");
    Ok(path)
}

/// The conventional socket location, `$HOME/.lightning/lightning-rpc`.
///
/// Returns `None` when `HOME` is unset or not absolute.
pub fn default_rpc_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from)?;
    resolve_rpc_path(home.join(".lightning")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_socket_name_to_directory() {
        let path = resolve_rpc_path("/home/alice/.lightning").unwrap();
        assert_eq!(path, PathBuf::from("/home/alice/.lightning/lightning-rpc"));
    }

    #[test]
    fn trailing_slash_directory() {
        let path = resolve_rpc_path("/home/alice/.lightning/").unwrap();
        assert_eq!(path, PathBuf::from("/home/alice/.lightning/lightning-rpc"));
    }

    #[test]
    fn keeps_explicit_socket_path() {
        let path = resolve_rpc_path("/var/run/node/lightning-rpc").unwrap();
        assert_eq!(path, PathBuf::from("/var/run/node/lightning-rpc"));
    }

    #[test]
    fn similar_file_name_is_treated_as_directory() {
        let path = resolve_rpc_path("/tmp/my-lightning-rpc").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/my-lightning-rpc/lightning-rpc"));
    }

    #[test]
    fn rejects_relative_path() {
        let result = resolve_rpc_path(".lightning");
        assert!(matches!(result, Err(TransportError::RelativePath { .. })));
    }

    #[test]
    fn rejects_path_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200);
        let result = resolve_rpc_path(&long_path);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }
}
