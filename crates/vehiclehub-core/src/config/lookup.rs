//! Vehicle profile lookup configuration.

use serde::{Deserialize, Serialize};

/// Settings for the platform's vehicle-profile HTTP lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Base URL of the lookup endpoint.
    #[serde(default)]
    pub url: String,
    /// Query parameter name carrying the device identifier.
    #[serde(default = "default_device_id_param")]
    pub device_id_param: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            device_id_param: default_device_id_param(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

fn default_device_id_param() -> String {
    "deviceId".to_string()
}

fn default_lookup_timeout() -> u64 {
    5
}
