//! Incremental demultiplexing of undelimited JSON value streams.
//!
//! The daemon writes JSON objects back to back with no separator or length
//! prefix. This crate turns such a byte stream into discrete top-level
//! values:
//! - [`JsonStreamParser`] is the push parser, fed one chunk at a time
//! - [`ValueReader`] pulls values from any blocking `Read`
//! - [`JsonRpcCodec`] plugs the parser into `tokio_util::codec` (behind `async`)
//!
//! Only the current token and the partially built value are retained
//! between chunks; raw input is never buffered beyond what one call consumes.

pub mod error;
pub mod message;
pub mod parser;
pub mod reader;

#[cfg(feature = "async")]
pub mod codec;

#[cfg(feature = "async")]
pub use codec::JsonRpcCodec;
pub use error::{CodecError, Result};
pub use message::{encode_request, Request, Response};
pub use parser::{DecoderConfig, JsonStreamParser, DEFAULT_MAX_DEPTH, DEFAULT_MAX_TOKEN_LEN};
pub use reader::ValueReader;
