//! Topic format and static topic list configuration.

use serde::{Deserialize, Serialize};

use crate::types::Activity;

/// One service reachable through the device topic space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMappingConfig {
    /// The service identifier embedded in topics.
    pub service_id: String,
    /// Human-readable service name.
    pub service_name: String,
    /// The backend stream the service's traffic is forwarded to.
    pub stream_topic: String,
    /// Whether messages for this service require a live device status.
    #[serde(default)]
    pub device_status_required: bool,
}

/// An extra permission granted to portal users beyond the standard list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTopicPermission {
    /// The raw topic (formatted as a user topic before granting).
    pub topic: String,
    /// The granted activity.
    pub activity: Activity,
}

/// Topic prefixes, infixes and the static topic lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Prefix in front of every device/user topic, e.g. `oem/vehicles/`.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    /// Route infix for device-to-cloud traffic.
    #[serde(default = "default_to_cloud_infix")]
    pub to_cloud_infix: String,
    /// Route infix for cloud-to-device traffic.
    #[serde(default = "default_to_device_infix")]
    pub to_device_infix: String,
    /// Tenant prefix stripped from usernames before topic construction.
    #[serde(default)]
    pub username_prefix: String,
    /// Usernames starting with this prefix get topics without the topic
    /// prefix (single-tenant client mode).
    #[serde(default)]
    pub client_username_prefix: String,
    /// Topics portal users may subscribe to (formatted as user topics).
    #[serde(default)]
    pub portal_topics: Vec<String>,
    /// Extra portal permissions beyond the standard subscribe list.
    #[serde(default)]
    pub portal_custom_permissions: Vec<CustomTopicPermission>,
    /// Keep-alive topic every device may publish to.
    #[serde(default = "default_keep_alive_topic")]
    pub keep_alive_topic: String,
    /// Topics every device may subscribe to regardless of device type.
    #[serde(default)]
    pub subscribe_only_topics: Vec<String>,
    /// Topics granted even when the vehicle profile could not be resolved.
    /// Non-empty list enables degraded-mode connects.
    #[serde(default)]
    pub profile_check_disabled_topics: Vec<String>,
    /// When set, ignore the resolved device type and use the agnostic
    /// topic lists for every device.
    #[serde(default)]
    pub allow_all_device_types: bool,
    /// Known services addressable through device topics.
    #[serde(default)]
    pub services: Vec<ServiceMappingConfig>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            to_cloud_infix: default_to_cloud_infix(),
            to_device_infix: default_to_device_infix(),
            username_prefix: String::new(),
            client_username_prefix: String::new(),
            portal_topics: Vec::new(),
            portal_custom_permissions: Vec::new(),
            keep_alive_topic: default_keep_alive_topic(),
            subscribe_only_topics: Vec::new(),
            profile_check_disabled_topics: Vec::new(),
            allow_all_device_types: false,
            services: Vec::new(),
        }
    }
}

impl TopicConfig {
    /// Whether degraded-mode connects (no resolved vehicle) are allowed.
    pub fn profile_check_disabled(&self) -> bool {
        !self.profile_check_disabled_topics.is_empty()
    }
}

fn default_topic_prefix() -> String {
    "oem/vehicles/".to_string()
}

fn default_to_cloud_infix() -> String {
    "2c/".to_string()
}

fn default_to_device_infix() -> String {
    "2d/".to_string()
}

fn default_keep_alive_topic() -> String {
    "keepalive".to_string()
}
