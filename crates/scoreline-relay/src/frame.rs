//! Outbound frame encoding.
//!
//! Every frame a client receives is `{"event": <name>, "data": <payload>}`.
//! The payload is carried as raw JSON so it reaches members byte-for-byte as
//! the publisher sent it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::value::RawValue;

#[derive(Serialize)]
struct Frame<'a> {
    event: &'a str,
    data: &'a RawValue,
}

/// Encode an outbound frame once, for sharing across every recipient.
pub fn encode_frame(event: &str, data: &RawValue) -> serde_json::Result<Arc<str>> {
    serde_json::to_string(&Frame { event, data }).map(Arc::from)
}
