//! Session tracking configuration.

use serde::{Deserialize, Serialize};

/// Settings for the subscription registry, expiry tracker and the
/// permission cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Feature flag: track credential expiry and force-disconnect expired
    /// sessions.
    #[serde(default = "default_true")]
    pub expiry_tracking_enabled: bool,
    /// Suppress the last-will message on forced disconnects.
    #[serde(default)]
    pub suppress_last_will: bool,
    /// Maximum number of cached permission lists.
    #[serde(default = "default_cache_capacity")]
    pub permission_cache_capacity: u64,
    /// Optional safety TTL for cached permission lists in seconds.
    ///
    /// Disconnect remains the primary invalidation; the TTL only bounds
    /// leakage after an unclean broker crash. `None` disables it.
    #[serde(default)]
    pub permission_cache_safety_ttl_seconds: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_tracking_enabled: default_true(),
            suppress_last_will: false,
            permission_cache_capacity: default_cache_capacity(),
            permission_cache_safety_ttl_seconds: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> u64 {
    10_000
}
