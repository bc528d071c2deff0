// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Preserved state: values observed before a cycle's logic ran.

use std::collections::HashMap;

use serde_json::Value;

/// Property name → value for one object, taken in the preserve phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: HashMap<String, Value>,
}

impl Snapshot {
    /// Record (or replace) the value the client is known to hold.
    pub fn preserve(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Preserved value, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of preserved properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was preserved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Snapshots of every object for one life-cycle execution.
///
/// Owned by the execution and dropped when it ends, so each cycle's
/// preserve phase starts clean.
#[derive(Debug, Default)]
pub struct PreservedState {
    objects: HashMap<String, Snapshot>,
}

impl PreservedState {
    /// Snapshot of `id`, if it was preserved.
    pub fn get(&self, id: &str) -> Option<&Snapshot> {
        self.objects.get(id)
    }

    /// Snapshot of `id`, created empty on first access.
    pub fn entry(&mut self, id: &str) -> &mut Snapshot {
        self.objects.entry(id.to_owned()).or_default()
    }

    /// Number of objects with a snapshot.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object was preserved.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
