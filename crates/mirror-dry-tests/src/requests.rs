// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Request message builder.

use mirror_protocol::wire::encode_message;
use mirror_protocol::{head, json, Message, Operation, Properties, Value};

/// Builds client request messages.
///
/// # Example
///
/// ```
/// use mirror_dry_tests::RequestBuilder;
///
/// let body = RequestBuilder::new().counter(1).bytes();
/// assert!(String::from_utf8(body).unwrap().contains("\"requestCounter\":1"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    message: Message,
}

impl RequestBuilder {
    /// Empty request: no head members, no operations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request flagged `rwt_initialize`.
    pub fn initialize() -> Self {
        Self::new().head(head::INITIALIZE, json!(true))
    }

    /// Request flagged `shutdown`.
    pub fn shutdown() -> Self {
        Self::new().head(head::SHUTDOWN, json!(true))
    }

    /// Set `requestCounter`.
    pub fn counter(self, counter: u64) -> Self {
        self.head(head::REQUEST_COUNTER, json!(counter))
    }

    /// Set an arbitrary head member.
    pub fn head(mut self, name: &str, value: Value) -> Self {
        self.message.head_mut().insert(name.to_owned(), value);
        self
    }

    /// Append an operation.
    pub fn op(mut self, op: Operation) -> Self {
        self.message.operations_mut().push(op);
        self
    }

    /// Append `["set", target, {name: value}]`.
    pub fn set(self, target: &str, name: &str, value: Value) -> Self {
        self.op(Operation::set(target, name, value))
    }

    /// Append `["notify", target, event_type, {}]`.
    pub fn notify(self, target: &str, event_type: &str) -> Self {
        self.op(Operation::Notify {
            target: target.to_owned(),
            event_type: event_type.to_owned(),
            properties: Properties::new(),
        })
    }

    /// Append `["call", target, method, {}]`.
    pub fn call(self, target: &str, method: &str) -> Self {
        self.op(Operation::Call {
            target: target.to_owned(),
            method: method.to_owned(),
            parameters: Properties::new(),
        })
    }

    /// The message.
    pub fn build(self) -> Message {
        self.message
    }

    /// The message encoded as a request body.
    pub fn bytes(self) -> Vec<u8> {
        encode_message(&self.message).into_bytes()
    }
}
