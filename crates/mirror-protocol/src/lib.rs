// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the Mirror UI sync engine.
//!
//! One request/response cycle exchanges exactly one [`Message`]: a JSON
//! `head` object plus an ordered list of [`Operation`]s, each encoded as a
//! JSON array whose first element is the operation tag:
//!
//! ```text
//! { "head": { "requestCounter": 3 },
//!   "operations": [ ["create", "w2", "rwt.widgets.Combo"],
//!                   ["set", "w2", { "parent": "w1" }] ] }
//! ```

mod error;
mod message;
mod operation;
pub mod wire;

pub use error::ProtocolError;
pub use message::Message;
pub use operation::{Listeners, Operation, OperationKind};

/// JSON object used for operation payloads and the message head.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Re-exported so downstream crates build payloads with the same JSON model.
pub use serde_json::{json, Value};

/// Member names recognised in a message head.
pub mod head {
    /// Per-session request sequence number (integer).
    pub const REQUEST_COUNTER: &str = "requestCounter";
    /// Error marker on responses (string).
    pub const ERROR: &str = "error";
    /// Client asks for a fresh application instance (boolean).
    pub const INITIALIZE: &str = "rwt_initialize";
    /// Client is leaving; the UI session must be shut down (boolean).
    pub const SHUTDOWN: &str = "shutdown";
}

/// `head.error` value for a request whose counter is neither expected nor buffered.
pub const ERROR_INVALID_REQUEST_COUNTER: &str = "invalid request counter";
/// `head.error` value for a request that references a session that no longer exists.
pub const ERROR_SESSION_TIMEOUT: &str = "session timeout";
