// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted preferences of a Mirror host process.

use mirror_render::RenderOptions;
use serde::{Deserialize, Serialize};

/// Config key under which [`HostPrefs`] are stored.
pub const HOST_PREFS_KEY: &str = "mirror_host";

/// Default listen address of the HTTP host.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8090";

/// Saved preferences for the HTTP host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostPrefs {
    /// Socket address to bind, e.g. `127.0.0.1:8090`.
    pub listen: String,
    /// Render-phase tunables.
    pub render: RenderOptions,
}

impl Default for HostPrefs {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_owned(),
            render: RenderOptions::default(),
        }
    }
}
