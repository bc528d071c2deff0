// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Application services shared by Mirror hosts: config storage port and
//! host preferences.

pub mod config;
pub mod prefs;
