//! Game tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for game rules and housekeeping.
///
/// One value is shared by the services and the reaper; the defaults
/// match production behavior, tests shrink the durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Minimum secret word length, in characters.
    pub min_secret_chars: usize,

    /// Maximum secret word length, in characters.
    pub max_secret_chars: usize,

    /// A room idle longer than this is force-finished by the reaper.
    pub timeout_window: Duration,

    /// How often the reaper scans for idle rooms.
    pub sweep_interval: Duration,

    /// Per-user debounce between guesses. Anti-spam only — correctness
    /// comes from the room lock.
    pub guess_cooldown: Duration,

    /// How long to wait for a room's exclusive lock before giving up
    /// with a transient failure instead of blocking the dispatcher.
    pub lock_timeout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_secret_chars: 3,
            max_secret_chars: 100,
            timeout_window: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
            guess_cooldown: Duration::from_secs(2),
            lock_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.min_secret_chars, 3);
        assert_eq!(config.max_secret_chars, 100);
        assert_eq!(config.timeout_window, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.guess_cooldown, Duration::from_secs(2));
    }
}
