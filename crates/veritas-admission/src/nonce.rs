//! A TTL'd, bounded-size nonce store guarding against request replay.
//!
//! Entries expire after `ttl_seconds` and the store is capped at
//! `max_entries`; once full, the oldest entry (by insertion order, not
//! expiry) is evicted to make room.

use std::collections::HashMap;
use std::sync::Mutex;

/// Nonce TTL, in seconds.
pub const NONCE_TTL_SECONDS: i64 = 300;
/// Upper bound on tracked nonces before oldest-first eviction kicks in.
pub const MAX_ENTRIES: usize = 100_000;

struct State {
    /// Insertion order, oldest first, for O(1) oldest-entry eviction.
    order: std::collections::VecDeque<String>,
    seen_at: HashMap<String, i64>,
}

/// In-memory nonce store. One instance is shared across the gateway
/// behind an `Arc`.
pub struct NonceStore {
    ttl_seconds: i64,
    max_entries: usize,
    state: Mutex<State>,
}

impl NonceStore {
    pub fn new() -> Self {
        Self::with_limits(NONCE_TTL_SECONDS, MAX_ENTRIES)
    }

    pub fn with_limits(ttl_seconds: i64, max_entries: usize) -> Self {
        NonceStore {
            ttl_seconds,
            max_entries,
            state: Mutex::new(State { order: std::collections::VecDeque::new(), seen_at: HashMap::new() }),
        }
    }

    /// Records `nonce` as seen at `now` and returns `true` if it was
    /// fresh (first use, or its prior use has expired). Returns `false`
    /// when the nonce is a replay within the TTL window.
    pub fn check_and_record(&self, nonce: &str, now: i64) -> bool {
        let mut state = self.state.lock().unwrap();

        if let Some(&seen_at) = state.seen_at.get(nonce) {
            if now - seen_at <= self.ttl_seconds {
                return false;
            }
        }

        self.compact(now, &mut state);

        if state.seen_at.len() >= self.max_entries {
            if let Some(oldest) = state.order.pop_front() {
                state.seen_at.remove(&oldest);
            }
        }

        state.seen_at.insert(nonce.to_string(), now);
        state.order.push_back(nonce.to_string());
        true
    }

    fn compact(&self, now: i64, state: &mut State) {
        while let Some(front) = state.order.front() {
            match state.seen_at.get(front) {
                Some(&seen_at) if now - seen_at > self.ttl_seconds => {
                    let expired = state.order.pop_front().unwrap();
                    state.seen_at.remove(&expired);
                }
                _ => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().seen_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new()
    }
}
