// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-session request counter and buffered response.

/// Outcome of validating an incoming request counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterCheck {
    /// The request is the next one expected; run the life cycle.
    Valid,
    /// Retransmission of the last processed request; answer with these bytes.
    Replay(String),
    /// Neither expected nor buffered.
    Invalid,
}

/// Counter state carried by each UI session.
///
/// `current` is the value the client must present next; `0` means no
/// request was processed yet, in which case the counter may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    current: u64,
    buffered: Option<(u64, String)>,
}

impl SyncState {
    /// Counter the next request must carry.
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Classify an incoming counter.
    pub fn check(&self, counter: Option<u64>) -> CounterCheck {
        match counter {
            None if self.current == 0 => CounterCheck::Valid,
            Some(n) if n == self.current => CounterCheck::Valid,
            Some(n) => match &self.buffered {
                Some((key, body)) if *key == n => CounterCheck::Replay(body.clone()),
                _ => CounterCheck::Invalid,
            },
            None => CounterCheck::Invalid,
        }
    }

    /// Consume the current counter and buffer the response it produced.
    ///
    /// Returns the counter the client must send next.
    pub fn advance(&mut self, response: String) -> u64 {
        self.buffered = Some((self.current, response));
        self.current += 1;
        self.current
    }

    /// Counter that produced the buffered response, if any.
    pub fn buffered_counter(&self) -> Option<u64> {
        self.buffered.as_ref().map(|(key, _)| *key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_counter_tolerated_before_first_request() {
        assert_eq!(SyncState::default().check(None), CounterCheck::Valid);
    }

    #[test]
    fn missing_counter_rejected_afterwards() {
        let mut state = SyncState::default();
        state.advance("{}".into());
        assert_eq!(state.check(None), CounterCheck::Invalid);
    }

    #[test]
    fn expected_counter_is_valid() {
        let mut state = SyncState::default();
        let next = state.advance("{}".into());
        assert_eq!(next, 1);
        assert_eq!(state.check(Some(1)), CounterCheck::Valid);
    }

    #[test]
    fn skipped_counter_is_invalid() {
        let mut state = SyncState::default();
        state.advance("a".into());
        state.advance("b".into());
        assert_eq!(state.check(Some(4)), CounterCheck::Invalid);
        assert_eq!(state.check(Some(23)), CounterCheck::Invalid);
    }

    #[test]
    fn last_counter_replays_buffer() {
        let mut state = SyncState::default();
        state.advance("a".into());
        state.advance("b".into());
        assert_eq!(state.buffered_counter(), Some(1));
        assert_eq!(state.check(Some(1)), CounterCheck::Replay("b".into()));
        assert_eq!(state.check(Some(0)), CounterCheck::Invalid);
    }
}
