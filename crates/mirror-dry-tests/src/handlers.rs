// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Message handler doubles.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::bail;
use mirror_protocol::Message;
use mirror_session::{MessageHandler, UiSession};

/// Log line appended when a handler starts.
pub const ENTER: &str = "enter";
/// Log line appended when a handler finishes.
pub const EXIT: &str = "exit";

/// Appends `enter`, sleeps, appends `exit`. Detects interleaved cycles.
#[derive(Debug, Clone)]
pub struct SleepingHandler {
    log: Arc<Mutex<Vec<&'static str>>>,
    pause: Duration,
}

impl SleepingHandler {
    /// Handler sleeping `pause` per request.
    pub fn new(pause: Duration) -> Self {
        Self {
            log: Arc::default(),
            pause,
        }
    }

    /// Entries logged so far.
    pub fn log(&self) -> Vec<&'static str> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, entry: &'static str) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl MessageHandler for SleepingHandler {
    fn handle(&self, _session: &mut UiSession, _request: &Message) -> anyhow::Result<Message> {
        self.push(ENTER);
        std::thread::sleep(self.pause);
        self.push(EXIT);
        Ok(Message::new())
    }
}

/// Always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingHandler;

impl MessageHandler for FailingHandler {
    fn handle(&self, _session: &mut UiSession, _request: &Message) -> anyhow::Result<Message> {
        bail!("handler failure")
    }
}

/// Returns a fixed response and records every request it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    response: Message,
    requests: Arc<Mutex<Vec<Message>>>,
}

impl RecordingHandler {
    /// Handler answering every request with `response`.
    pub fn new(response: Message) -> Self {
        Self {
            response,
            requests: Arc::default(),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<Message> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MessageHandler for RecordingHandler {
    fn handle(&self, _session: &mut UiSession, request: &Message) -> anyhow::Result<Message> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(self.response.clone())
    }
}
