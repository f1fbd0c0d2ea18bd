use bytes::{BufMut, BytesMut};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Outbound call envelope: `{"method": ..., "params": [...], "id": "..."}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Request {
    pub method: String,
    pub params: Vec<Value>,
    pub id: String,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Vec<Value>, id: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params,
            id: id.into(),
        }
    }
}

/// Append the wire form of `request` to `dst`. No delimiter is written.
pub fn encode_request(request: &Request, dst: &mut BytesMut) -> Result<()> {
    let body = serde_json::to_vec(request)?;
    dst.reserve(body.len());
    dst.put_slice(&body);
    Ok(())
}

/// An inbound value that carries a usable correlation id.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Textual id; numeric ids are rendered in decimal.
    pub id: String,
    /// `Ok(result)` when `error` is absent or null, otherwise `Err(error)`.
    pub outcome: std::result::Result<Value, Value>,
}

impl Response {
    /// Interpret a top-level value as a response.
    ///
    /// Returns `None` for non-objects and for ids that are absent, null, or
    /// neither a string nor a number. A success without `result` yields `null`.
    pub fn from_value(mut value: Value) -> Option<Self> {
        let object = value.as_object_mut()?;
        let id = match object.get("id")? {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };

        let outcome = match object.remove("error") {
            Some(error) if !error.is_null() => Err(error),
            _ => Ok(object.remove("result").unwrap_or(Value::Null)),
        };

        Some(Self { id, outcome })
    }

    /// Whether the daemon reported an error.
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }
}
