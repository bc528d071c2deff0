// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Mirror crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`apps`] - Scripted and failing [`Application`](mirror_render::Application)s
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`handlers`] - Message handlers that sleep, fail, or record requests
//! - [`requests`] - Request message builder
//! - [`sinks`] - Response sinks that record or fail

pub mod apps;
pub mod config;
pub mod handlers;
pub mod requests;
pub mod sinks;

pub use apps::{FailingApp, ScriptedApp};
pub use config::InMemoryConfigStore;
pub use handlers::{FailingHandler, RecordingHandler, SleepingHandler, ENTER, EXIT};
pub use requests::RequestBuilder;
pub use sinks::{FailingSink, RecordingSink};
