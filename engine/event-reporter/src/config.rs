//! Producer-side configuration
//!
//! The launcher passes these values in explicitly; nothing in the
//! pipeline reads the environment on its own. `from_env` exists for
//! processes configured through the standard Trellis variable trio.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Identifier of the action this process runs.
pub const ENV_ACTION_ID: &str = "TRELLIS_ACTION_ID";

/// Orchestrator callback URL; unset disables event reporting.
pub const ENV_CALLBACK_URL: &str = "TRELLIS_EVENT_CALLBACK_URL";

/// Seconds between flush cycles.
pub const ENV_SEND_INTERVAL: &str = "TRELLIS_EVENT_SEND_INTERVAL";

const DEFAULT_SEND_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Stamped on every event this process reports
    pub action_id: String,

    /// Absent disables the pipeline entirely
    pub callback_url: Option<String>,

    /// Whole seconds between flush cycles
    pub send_interval_secs: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            action_id: String::new(),
            callback_url: None,
            send_interval_secs: DEFAULT_SEND_INTERVAL_SECS,
        }
    }
}

impl ReporterConfig {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self { action_id: action_id.into(), ..Default::default() }
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_send_interval(mut self, secs: u64) -> Self {
        self.send_interval_secs = secs;
        self
    }

    /// Read the standard environment trio. Missing variables keep their
    /// defaults; an unparseable interval is ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(action_id) = std::env::var(ENV_ACTION_ID) {
            config.action_id = action_id;
        }
        if let Ok(url) = std::env::var(ENV_CALLBACK_URL) {
            if !url.is_empty() {
                config.callback_url = Some(url);
            }
        }
        if let Ok(interval) = std::env::var(ENV_SEND_INTERVAL) {
            match interval.parse::<u64>() {
                Ok(secs) if secs > 0 => config.send_interval_secs = secs,
                _ => warn!(value = %interval, "ignoring invalid send interval"),
            }
        }
        config
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_secs(self.send_interval_secs)
    }
}
