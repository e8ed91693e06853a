//! Wire protocol for the bridge.
//!
//! Frames are JSON objects carried in WebSocket text messages. Payloads are
//! opaque serializable values only - no live object references, no
//! callables - so nothing crosses the boundary by reference and every
//! in-flight value is a copy.
//!
//! # Protocol
//!
//! 1. **First frame MUST be** [`ClientFrame::Hello`] with a valid token
//! 2. Host replies with [`HostFrame::HelloAck`] (success or failure)
//! 3. After auth, [`ClientFrame::Request`] frames carry a correlation id;
//!    the host answers each with exactly one [`HostFrame::Response`]
//!    bearing the same id, in whatever order requests complete
//! 4. [`ClientFrame::Message`] frames are fire-and-forget; the host relays
//!    them as [`HostFrame::Event`] frames to every connected client
//!
//! # Isolation
//!
//! [`HostFrame::Event`] has no sender field, so a renderer can never
//! observe which connection (or host internals) produced an event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames sent by the UI process to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Authentication handshake. Must be the first frame on a connection.
    Hello { token: String },

    /// One correlated invocation: `id` pairs the eventual response with
    /// this request so overlapping invokes on one channel never
    /// cross-resolve.
    Request {
        id: u64,
        channel: String,
        args: Vec<Value>,
    },

    /// Fire-and-forget message. No acknowledgment, no response.
    Message { channel: String, payload: Value },
}

/// Frames sent by the host to the UI process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostFrame {
    /// Handshake result.
    HelloAck {
        success: bool,
        error: Option<String>,
    },

    /// The single response to the request with the same `id`.
    Response { id: u64, outcome: Outcome },

    /// Host -> renderer event. Carries the channel and payload only.
    Event { channel: String, payload: Value },
}

/// Result of one dispatched request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { value: Value },
    Err { fault: WireFault },
}

/// Structured failure description crossing the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFault {
    pub kind: FaultKind,
    pub message: String,
}

impl WireFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn channel_not_allowed(channel: &str) -> Self {
        Self::new(
            FaultKind::ChannelNotAllowed,
            format!("channel '{channel}' is not in the capability table"),
        )
    }

    pub fn malformed_request(message: impl Into<String>) -> Self {
        Self::new(FaultKind::MalformedRequest, message)
    }

    pub fn host_operation(message: impl Into<String>) -> Self {
        Self::new(FaultKind::HostOperation, message)
    }
}

/// Failure classification carried by [`WireFault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The channel is not in the capability table.
    ChannelNotAllowed,
    /// The request shape did not match the channel's contract.
    MalformedRequest,
    /// The host accepted the request but the operation itself failed.
    HostOperation,
}

/// Enumerated verb for `db:query` dispatch, camelCase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMethod {
    FindAll,
    FindById,
    FindWhere,
    Insert,
    Update,
    Delete,
}

/// One operation inside a `db:transaction` list. Tagged so malformed
/// shapes are rejected at the boundary instead of forwarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DbRequest {
    Query {
        table: String,
        method: QueryMethod,
        args: Vec<Value>,
    },
    Execute {
        sql: String,
        params: Vec<Value>,
    },
}

/// Encode a frame for the transport.
pub fn encode<T: Serialize>(frame: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

/// Decode a frame received from the transport.
pub fn decode<'a, T: Deserialize<'a>>(raw: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(raw)
}
