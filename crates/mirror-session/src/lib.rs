// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! UI sessions and the request synchronizer.
//!
//! A host session (one per transport-level client id) owns at most one UI
//! session behind a FIFO-fair async mutex. Every request for that host runs
//! its whole cycle (counter validation, life cycle, response write) while
//! holding the lock, so requests for one session never interleave.

mod counter;
mod error;
mod handler;
mod session;
mod store;
mod sync;

pub use counter::{CounterCheck, SyncState};
pub use error::{SessionError, SyncError};
pub use handler::{ApplicationFactory, LifeCycleHandler, MessageHandler};
pub use session::{SessionHandle, SessionListener, SessionState, UiSession};
pub use store::{HostSession, SessionStore};
pub use sync::{status, RequestSynchronizer, Response, ResponseSink};
