// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-session request serialization, counter validation and recovery.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use mirror_protocol::wire::{decode_message, encode_message, error_message, CONTENT_TYPE};
use mirror_protocol::{Message, ERROR_INVALID_REQUEST_COUNTER, ERROR_SESSION_TIMEOUT};
use tracing::{debug, error, info, warn};

use crate::counter::CounterCheck;
use crate::error::SyncError;
use crate::handler::MessageHandler;
use crate::session::UiSession;
use crate::store::{HostSession, SessionStore};

/// Status codes of the transport contract.
pub mod status {
    /// Request processed (or replayed).
    pub const OK: u16 = 200;
    /// Session timed out or never existed.
    pub const FORBIDDEN: u16 = 403;
    /// Request counter mismatch.
    pub const PRECONDITION_FAILED: u16 = 412;
}

/// Serialized response handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Transport status code.
    pub status: u16,
    /// JSON message text.
    pub body: String,
}

impl Response {
    /// `200` with `body`.
    pub fn ok(body: String) -> Self {
        Self {
            status: status::OK,
            body,
        }
    }

    /// Error message with `head.error` set and no operations.
    pub fn error(status: u16, error: &str) -> Self {
        Self {
            status,
            body: encode_message(&error_message(error)),
        }
    }

    /// Content type of every response body.
    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    /// Parse the body back into a message.
    pub fn message(&self) -> Result<Message, mirror_protocol::ProtocolError> {
        decode_message(self.body.as_bytes())
    }
}

/// Destination of a response. Write failures are fatal to the session.
pub trait ResponseSink: Send {
    /// Deliver `response` to the client.
    fn write(&mut self, response: &Response) -> std::io::Result<()>;
}

/// Admits one life cycle per UI session at a time.
pub struct RequestSynchronizer {
    store: Arc<SessionStore>,
    handler: Arc<dyn MessageHandler>,
}

impl std::fmt::Debug for RequestSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSynchronizer")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl RequestSynchronizer {
    /// Synchronizer over `store` running `handler` for admitted requests.
    pub fn new(store: Arc<SessionStore>, handler: impl MessageHandler + 'static) -> Self {
        Self {
            store,
            handler: Arc::new(handler),
        }
    }

    /// The session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Process one request for host session `host_id` and write its response.
    ///
    /// Counter mismatches and timeouts are answered with error messages and
    /// return `Ok`. Decode failures return [`SyncError::Decode`] before any
    /// session is touched. Handler failures (panics included) and write
    /// failures shut the UI session down first, then return the error.
    pub async fn service(
        &self,
        host_id: &str,
        body: &[u8],
        sink: &mut dyn ResponseSink,
    ) -> Result<(), SyncError> {
        let request = decode_message(body)?;
        let counter = request.request_counter()?;

        loop {
            let host = if request.is_initialize() {
                Some(self.store.host(host_id))
            } else {
                self.store.get(host_id)
            };
            let Some(host) = host else {
                return if request.is_shutdown() {
                    write(sink, &Response::ok(encode_message(&Message::new())))
                } else {
                    warn!(host = %host_id, "request for unknown session");
                    write(sink, &Response::error(status::FORBIDDEN, ERROR_SESSION_TIMEOUT))
                };
            };

            let mut slot = host.lock().await;
            if !self.store.holds(&host) {
                debug!(host = %host_id, "host evicted while request was queued");
                continue;
            }
            return self.serve(&host, &mut slot, &request, counter, sink);
        }
    }

    fn serve(
        &self,
        host: &Arc<HostSession>,
        slot: &mut Option<UiSession>,
        request: &Message,
        counter: Option<u64>,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), SyncError> {
        if request.is_shutdown() {
            self.tear_down(host, slot);
            return write(sink, &Response::ok(encode_message(&Message::new())));
        }

        if request.is_initialize() {
            if let Some(mut previous) = slot.take() {
                info!(
                    host = %host.id(),
                    session = %previous.id(),
                    "initialize replaces ui session"
                );
                previous.shutdown();
            }
            *slot = Some(self.store.new_ui_session());
        }

        let Some(session) = slot.as_mut().filter(|s| s.is_started() || request.is_initialize())
        else {
            warn!(host = %host.id(), "session timeout");
            return write(sink, &Response::error(status::FORBIDDEN, ERROR_SESSION_TIMEOUT));
        };

        if !request.is_initialize() {
            match session.sync().check(counter) {
                CounterCheck::Valid => {}
                CounterCheck::Replay(body) => {
                    debug!(
                        session = %session.id(),
                        counter = ?counter,
                        "replaying buffered response"
                    );
                    let result = write(sink, &Response::ok(body));
                    return self.fail_on_error(host, slot, result);
                }
                CounterCheck::Invalid => {
                    warn!(
                        session = %session.id(),
                        counter = ?counter,
                        expected = session.sync().current(),
                        "invalid request counter"
                    );
                    let response =
                        Response::error(status::PRECONDITION_FAILED, ERROR_INVALID_REQUEST_COUNTER);
                    let result = write(sink, &response);
                    return self.fail_on_error(host, slot, result);
                }
            }
        }

        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.handler.handle(&mut *session, request)));
        let mut response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                error!(session = %session.id(), error = %err, "life cycle failed");
                self.tear_down(host, slot);
                return Err(SyncError::Handler(err));
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(session = %session.id(), reason, "life cycle panicked");
                let err = anyhow!("message handler panicked: {reason}");
                self.tear_down(host, slot);
                return Err(SyncError::Handler(err));
            }
        };
        session.mark_started();
        let next = session.sync().current() + 1;
        response.set_request_counter(next);
        let body = encode_message(&response);
        session.sync_mut().advance(body.clone());
        debug!(session = %session.id(), next, "request processed");

        let result = write(sink, &Response::ok(body));
        self.fail_on_error(host, slot, result)
    }

    fn fail_on_error(
        &self,
        host: &Arc<HostSession>,
        slot: &mut Option<UiSession>,
        result: Result<(), SyncError>,
    ) -> Result<(), SyncError> {
        if let Err(err) = &result {
            error!(error = %err, "response write failed");
            self.tear_down(host, slot);
        }
        result
    }

    /// Shut the UI session down and drop the host unless it still carries
    /// attributes.
    fn tear_down(&self, host: &Arc<HostSession>, slot: &mut Option<UiSession>) {
        if let Some(mut session) = slot.take() {
            session.shutdown();
        }
        self.store.evict_if_idle(host);
    }
}

fn write(sink: &mut dyn ResponseSink, response: &Response) -> Result<(), SyncError> {
    sink.write(response).map_err(SyncError::Io)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
