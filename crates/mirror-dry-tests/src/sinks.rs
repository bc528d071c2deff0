// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Response sink doubles.

use std::io;

use mirror_protocol::Message;
use mirror_session::{Response, ResponseSink};

/// Keeps every response written to it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    responses: Vec<Response>,
}

impl RecordingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All responses, oldest first.
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Most recent response.
    pub fn last(&self) -> Option<&Response> {
        self.responses.last()
    }

    /// Most recent response decoded as a message.
    pub fn last_message(&self) -> Option<Message> {
        self.last().and_then(|r| r.message().ok())
    }
}

impl ResponseSink for RecordingSink {
    fn write(&mut self, response: &Response) -> io::Result<()> {
        self.responses.push(response.clone());
        Ok(())
    }
}

/// Fails every write, like a client that hung up.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl ResponseSink for FailingSink {
    fn write(&mut self, _response: &Response) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }
}
