/// Errors that can occur while demultiplexing or encoding JSON values.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A byte that cannot appear at this point of a JSON document.
    #[error("unexpected byte 0x{byte:02x} at offset {offset}, expected {expected}")]
    Syntax {
        offset: u64,
        byte: u8,
        expected: &'static str,
    },

    /// A string token did not decode as UTF-8.
    #[error("invalid UTF-8 in string ending at offset {offset}")]
    InvalidUtf8 { offset: u64 },

    /// A number token could not be represented.
    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { offset: u64, text: String },

    /// Arrays and objects are nested deeper than allowed.
    #[error("nesting depth exceeds maximum of {max}")]
    DepthExceeded { max: usize },

    /// A single string or number token grew past the configured limit.
    #[error("token too long ({len} bytes, max {max})")]
    TokenTooLong { len: usize, max: usize },

    /// The stream ended in the middle of a value.
    #[error("stream ended inside a JSON value")]
    Truncated,

    /// An I/O error occurred while reading or writing.
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing an outbound message failed.
    #[error("json encode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    /// Whether this error describes malformed input rather than an I/O failure.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            CodecError::Syntax { .. }
                | CodecError::InvalidUtf8 { .. }
                | CodecError::InvalidNumber { .. }
                | CodecError::DepthExceeded { .. }
                | CodecError::TokenTooLong { .. }
                | CodecError::Truncated
        )
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
