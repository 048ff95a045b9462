//! Client configuration types.
//!
//! `ClientConfig` represents the top-level `config.toml` that controls the
//! backend location, request timeouts, and payment polling bounds.

use serde::{Deserialize, Serialize};

use std::time::Duration;

/// Top-level configuration for the DowUrk client.
///
/// Loaded from `~/.dowurk/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the DowUrk backend (scheme + host, no `/api` suffix).
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Per-request timeout for backend calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Payment confirmation polling bounds.
    #[serde(default)]
    pub payment: PollConfig,
}

fn default_backend_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            payment: PollConfig::default(),
        }
    }
}

/// Bounds for the payment confirmation poller.
///
/// 5 attempts x 2 s caps the post-redirect wait at roughly ten seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

impl PollConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Requests allowed per run. A configured `0` still sends one request.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}
