use callwire_core::utils::default_stun_urls;
use callwire_core::{IceServerConfig, Quality};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff for signal publishing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retrying.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            multiplier: 2.0,
            max_delay_ms: 2_000,
        }
    }
}

/// Settings for one call membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Automatic ICE restarts allowed between two successful connections.
    pub max_restart_attempts: u32,
    pub publish_retry: RetryPolicy,
    pub quality: Quality,
    /// Buffer of the negotiator event broadcast channel.
    pub event_capacity: usize,
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: default_stun_urls(),
                username: None,
                credential: None,
            }],
            max_restart_attempts: 2,
            publish_retry: RetryPolicy::default(),
            quality: Quality::default(),
            event_capacity: 64,
        }
    }
}
