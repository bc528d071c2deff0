// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session and synchronizer errors.

use mirror_protocol::ProtocolError;
use thiserror::Error;

/// Access to a session that was shut down.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session is no longer bound to its host.
    #[error("ui session {0} is no longer bound")]
    Unbound(String),
}

/// Failures surfaced by [`RequestSynchronizer::service`](crate::RequestSynchronizer::service).
///
/// `Decode` leaves the session untouched. `Handler` and `Io` are fatal: the
/// UI session was shut down before the error was returned.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request body is not a valid message.
    #[error(transparent)]
    Decode(#[from] ProtocolError),
    /// Application or render failure during the life cycle.
    #[error("message handler failed")]
    Handler(#[source] anyhow::Error),
    /// The response could not be written.
    #[error("failed to write response")]
    Io(#[source] std::io::Error),
}
