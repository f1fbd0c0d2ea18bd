use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use serde_json::Value;

use crate::error::{CodecError, Result};
use crate::parser::{DecoderConfig, JsonStreamParser};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads top-level JSON values from any blocking `Read` stream.
///
/// Handles partial reads internally. Also usable as an `Iterator`, which
/// ends at clean end-of-stream or after the first error.
pub struct ValueReader<T> {
    inner: T,
    buf: BytesMut,
    parser: JsonStreamParser,
    done: bool,
}

impl<T: Read> ValueReader<T> {
    /// Create a new value reader with default limits.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    /// Create a new value reader with explicit limits.
    pub fn with_config(inner: T, config: DecoderConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            parser: JsonStreamParser::with_config(config),
            done: false,
        }
    }

    /// Read the next top-level value (blocking).
    ///
    /// Returns `Ok(None)` at end-of-stream between values and
    /// `Err(CodecError::Truncated)` if the stream ends inside one.
    pub fn read_value(&mut self) -> Result<Option<Value>> {
        loop {
            if !self.buf.is_empty() {
                let (consumed, value) = self.parser.feed(&self.buf)?;
                self.buf.advance(consumed);
                if value.is_some() {
                    return Ok(value);
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            };

            if read == 0 {
                return self.parser.finish();
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for ValueReader<T> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_value() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
