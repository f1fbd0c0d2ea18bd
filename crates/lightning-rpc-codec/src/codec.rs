use bytes::{Buf, BytesMut};
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error::{CodecError, Result};
use crate::message::{encode_request, Request};
use crate::parser::{DecoderConfig, JsonStreamParser};

/// `tokio_util` codec for undelimited JSON-RPC streams.
///
/// Decodes top-level [`Value`]s and encodes [`Request`]s. Each connection
/// needs its own codec: after a decode error the parser state is discarded.
#[derive(Debug, Default)]
pub struct JsonRpcCodec {
    parser: JsonStreamParser,
}

impl JsonRpcCodec {
    /// Create a codec with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit limits.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            parser: JsonStreamParser::with_config(config),
        }
    }

    /// Current nesting depth of the value being decoded.
    pub fn depth(&self) -> usize {
        self.parser.depth()
    }
}

impl Decoder for JsonRpcCodec {
    type Item = Value;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        match self.parser.feed(src) {
            Ok((consumed, value)) => {
                src.advance(consumed);
                Ok(value)
            }
            Err(err) => {
                debug!(
                    error = %err,
                    discarded = src.len(),
                    "malformed input, dropping parser state"
                );
                self.parser.reset();
                src.clear();
                Err(err)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        if let Some(value) = self.decode(src)? {
            return Ok(Some(value));
        }
        self.parser.finish()
    }
}

impl Encoder<&Request> for JsonRpcCodec {
    type Error = CodecError;

    fn encode(&mut self, request: &Request, dst: &mut BytesMut) -> Result<()> {
        encode_request(request, dst)
    }
}
