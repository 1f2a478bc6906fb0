use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Fully resolved timing of one polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    pub timeout_ms: u64,
    pub interval_ms: u64,
}

impl PollSettings {
    pub const fn from_millis(timeout_ms: u64, interval_ms: u64) -> Self {
        Self { timeout_ms, interval_ms }
    }

    /// Defaults for phrase-driven polling: 500 ms interval, 5 s timeout.
    pub const fn phrase() -> Self {
        Self::from_millis(5000, 500)
    }

    /// Defaults for the chained `.poll()` form: 100 ms interval, 5 s timeout.
    pub const fn fluent() -> Self {
        Self::from_millis(5000, 100)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Per-call overrides; unset fields fall back to a [`PollSettings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOptions {
    pub timeout: Option<Duration>,
    pub interval: Option<Duration>,
}

impl PollOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn resolve(&self, defaults: PollSettings) -> (Duration, Duration) {
        (
            self.timeout.unwrap_or_else(|| defaults.timeout()),
            self.interval.unwrap_or_else(|| defaults.interval()),
        )
    }
}

/// Engine-wide knobs shared by every handle a factory creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub phrase_poll: PollSettings,
    pub fluent_poll: PollSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phrase_poll: PollSettings::phrase(),
            fluent_poll: PollSettings::fluent(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read overrides from `PHRASE_ASSERT_*` variables; anything missing or
    /// unparsable keeps its default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            phrase_poll: PollSettings {
                timeout_ms: env_millis("PHRASE_ASSERT_POLL_TIMEOUT_MS")
                    .unwrap_or(defaults.phrase_poll.timeout_ms),
                interval_ms: env_millis("PHRASE_ASSERT_POLL_INTERVAL_MS")
                    .unwrap_or(defaults.phrase_poll.interval_ms),
            },
            fluent_poll: PollSettings {
                timeout_ms: env_millis("PHRASE_ASSERT_FLUENT_TIMEOUT_MS")
                    .unwrap_or(defaults.fluent_poll.timeout_ms),
                interval_ms: env_millis("PHRASE_ASSERT_FLUENT_INTERVAL_MS")
                    .unwrap_or(defaults.fluent_poll.interval_ms),
            },
        }
    }
}

fn env_millis(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
