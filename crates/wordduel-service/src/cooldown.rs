//! Per-user debounce for the highest-contention action (guessing).
//!
//! This is anti-spam, not correctness: the room lock serializes
//! transitions regardless. The map plays the role of the short-lived
//! keys-with-expiry the bot used to keep in an external store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use wordduel_protocol::UserId;

/// Entries above this trigger a purge of expired ones on the next call.
const PURGE_THRESHOLD: usize = 1024;

/// Tracks, per user, when their cooldown window expires.
pub struct CooldownMap {
    ttl: Duration,
    entries: Mutex<HashMap<UserId, Instant>>,
}

impl CooldownMap {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` and starts a new window if the user is outside
    /// their cooldown; `false` if they must still wait.
    pub fn try_acquire(&self, user: UserId) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cooldown lock poisoned");

        if entries.len() > PURGE_THRESHOLD {
            entries.retain(|_, expires| *expires > now);
        }

        match entries.get(&user) {
            Some(expires) if *expires > now => false,
            _ => {
                entries.insert(user, now + self.ttl);
                true
            }
        }
    }

    /// The configured window length.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
