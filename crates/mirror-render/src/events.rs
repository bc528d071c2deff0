// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-object listener registration.
//!
//! The table only answers "does any handler care about kind K"; the handler
//! logic itself lives in the [`Application`](crate::Application).

use std::collections::BTreeSet;

/// Handle returned by [`EventTable::hook`]; unique within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registered listeners of one object, keyed by event kind.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    entries: Vec<(String, ListenerId)>,
    last_id: u64,
}

impl EventTable {
    /// Register interest in `kind`.
    pub fn hook(&mut self, kind: impl Into<String>) -> ListenerId {
        self.last_id += 1;
        let id = ListenerId(self.last_id);
        self.entries.push((kind.into(), id));
        id
    }

    /// Remove one registration. Unknown kinds or ids are ignored.
    pub fn unhook(&mut self, kind: &str, id: ListenerId) {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|(k, existing)| k == kind && *existing == id)
        {
            self.entries.remove(pos);
        }
    }

    /// Whether at least one listener is registered for `kind`.
    pub fn hooks(&self, kind: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == kind)
    }

    /// Total number of registrations.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Distinct kinds with at least one registration.
    pub fn kinds(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT_1: &str = "Selection";

    #[test]
    fn hook() {
        let mut table = EventTable::default();
        table.hook(EVENT_1);
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn unhook() {
        let mut table = EventTable::default();
        let id = table.hook(EVENT_1);
        table.unhook(EVENT_1, id);
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn unhook_unknown_event_type() {
        let mut table = EventTable::default();
        let id = table.hook(EVENT_1);
        table.unhook("Modify", id);
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn unhook_unknown_listener() {
        let mut table = EventTable::default();
        table.hook(EVENT_1);
        let mut other = EventTable::default();
        other.hook(EVENT_1);
        let foreign = other.hook(EVENT_1);
        table.unhook(EVENT_1, foreign);
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_unhook() {
        let mut table = EventTable::default();
        let first = table.hook(EVENT_1);
        table.unhook(EVENT_1, first);
        let second = table.hook(EVENT_1);
        assert_ne!(first, second);
        table.unhook(EVENT_1, first);
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn tables_number_their_listeners_independently() {
        let mut busy = EventTable::default();
        for _ in 0..3 {
            busy.hook(EVENT_1);
        }
        let mut fresh = EventTable::default();
        assert_eq!(fresh.hook(EVENT_1), EventTable::default().hook(EVENT_1));
    }

    #[test]
    fn hooks_reports_known_kinds_only() {
        let mut table = EventTable::default();
        assert!(!table.hooks(EVENT_1));
        table.hook(EVENT_1);
        table.hook(EVENT_1);
        assert!(table.hooks(EVENT_1));
        assert!(!table.hooks("Modify"));
        assert_eq!(table.kinds().len(), 1);
    }
}
