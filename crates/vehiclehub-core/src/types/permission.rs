//! Topic permissions returned to the broker.

use serde::{Deserialize, Serialize};

/// Which MQTT activity a permission covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Publishing only.
    Publish,
    /// Subscribing only.
    Subscribe,
    /// Both publishing and subscribing.
    All,
}

/// Whether the permission allows or denies. The engine only ever emits
/// allow permissions; everything not allowed is denied by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionType {
    /// The activity is allowed on the filter.
    Allow,
}

/// Maximum QoS granted by a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qos {
    /// At most once.
    Zero,
    /// At least once.
    One,
    /// Exactly once.
    Two,
    /// Any QoS.
    All,
}

/// One entry of the ordered permission list computed per client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPermission {
    /// The MQTT topic filter the permission applies to.
    pub topic_filter: String,
    /// The covered activity.
    pub activity: Activity,
    /// Allow/deny; always [`PermissionType::Allow`].
    pub permission_type: PermissionType,
    /// The maximum granted QoS.
    pub qos: Qos,
}

impl TopicPermission {
    /// An allow permission for the given filter and activity at any QoS.
    pub fn allow(topic_filter: impl Into<String>, activity: Activity) -> Self {
        Self {
            topic_filter: topic_filter.into(),
            activity,
            permission_type: PermissionType::Allow,
            qos: Qos::All,
        }
    }
}
