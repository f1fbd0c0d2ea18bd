use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::Result;

/// One outstanding request awaiting its correlated response.
#[derive(Debug)]
pub struct PendingCall {
    method: String,
    params: Vec<Value>,
    waiter: oneshot::Sender<Result<Value>>,
}

impl PendingCall {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Complete the call. Returns `false` if the caller stopped waiting.
    pub fn resolve(self, outcome: Result<Value>) -> bool {
        self.waiter.send(outcome).is_ok()
    }
}

/// Id allocation and the id → waiter map.
///
/// Ids are decimal strings of a counter that starts at 1 and is never
/// rewound, so an id is never reused for the lifetime of the table.
#[derive(Debug, Default)]
pub struct PendingTable {
    last_id: u64,
    calls: HashMap<String, PendingCall>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and register a waiter for it.
    pub fn register(
        &mut self,
        method: &str,
        params: &[Value],
    ) -> (String, oneshot::Receiver<Result<Value>>) {
        self.last_id += 1;
        let id = self.last_id.to_string();
        let (waiter, receiver) = oneshot::channel();
        let previous = self.calls.insert(
            id.clone(),
            PendingCall {
                method: method.to_string(),
                params: params.to_vec(),
                waiter,
            },
        );
        debug_assert!(previous.is_none(), "pending id {id} allocated twice");
        (id, receiver)
    }

    /// Remove and return the call for `id`.
    pub fn take(&mut self, id: &str) -> Option<PendingCall> {
        self.calls.remove(id)
    }

    /// Forget the call for `id` without resolving it.
    pub fn remove(&mut self, id: &str) -> bool {
        self.calls.remove(id).is_some()
    }

    /// Remove every call.
    pub fn drain(&mut self) -> Vec<(String, PendingCall)> {
        self.calls.drain().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.calls.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The most recently allocated id, if any.
    pub fn last_id(&self) -> Option<u64> {
        (self.last_id > 0).then_some(self.last_id)
    }
}
