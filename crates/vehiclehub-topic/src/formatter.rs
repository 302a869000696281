//! Topic construction from prefixes and route infixes.

use vehiclehub_core::config::topics::TopicConfig;

/// Stateless topic builder.
///
/// Holds the configured prefix/infix strings and derives every outgoing
/// topic shape from them. Tenant handling: the configured username prefix
/// is stripped before the username enters a topic, and usernames matching
/// the client prefix produce topics without the global topic prefix.
#[derive(Debug, Clone)]
pub struct TopicFormatter {
    topic_prefix: String,
    to_cloud_infix: String,
    to_device_infix: String,
    username_prefix: String,
    client_username_prefix: String,
}

impl TopicFormatter {
    /// Creates a formatter over the topic configuration.
    pub fn new(config: &TopicConfig) -> Self {
        Self {
            topic_prefix: config.topic_prefix.clone(),
            to_cloud_infix: config.to_cloud_infix.clone(),
            to_device_infix: config.to_device_infix.clone(),
            username_prefix: config.username_prefix.clone(),
            client_username_prefix: config.client_username_prefix.clone(),
        }
    }

    /// Topic a device publishes on: `{prefix}{client_id}/{to_cloud}{topic}`.
    pub fn format_publish_topic(&self, client_id: &str, topic: &str) -> String {
        format!(
            "{}{}/{}{}",
            self.topic_prefix, client_id, self.to_cloud_infix, topic
        )
    }

    /// Topic a device subscribes to:
    /// `{prefix}{user_without_prefix}/{to_device}{topic}`.
    pub fn format_subscribe_topic(&self, user_name: &str, topic: &str) -> String {
        let user = self.strip_username_prefix(user_name);
        format!(
            "{}{}/{}{}",
            self.prefix_for(user_name),
            user,
            self.to_device_infix,
            topic
        )
    }

    /// Topic a portal user subscribes to: `{prefix}{user_id}/{topic}`,
    /// no route infix.
    pub fn format_user_topic(&self, user_id: &str, topic: &str) -> String {
        let user = self.strip_username_prefix(user_id);
        format!("{}{}/{}", self.prefix_for(user_id), user, topic)
    }

    /// Removes the tenant prefix from a username, if configured.
    fn strip_username_prefix<'a>(&self, user_name: &'a str) -> &'a str {
        if self.username_prefix.is_empty() {
            return user_name;
        }
        user_name
            .strip_prefix(&self.username_prefix)
            .unwrap_or(user_name)
    }

    /// Single-tenant clients address topics without the global prefix.
    fn prefix_for(&self, user_name: &str) -> &str {
        if !self.client_username_prefix.is_empty()
            && user_name.starts_with(&self.client_username_prefix)
        {
            ""
        } else {
            &self.topic_prefix
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TopicConfig {
        TopicConfig {
            topic_prefix: "oem/vehicles/".to_string(),
            to_cloud_infix: "2c/".to_string(),
            to_device_infix: "2d/".to_string(),
            username_prefix: "tenant1:".to_string(),
            client_username_prefix: "client-".to_string(),
            ..TopicConfig::default()
        }
    }

    #[test]
    fn test_publish_topic_shape() {
        let f = TopicFormatter::new(&config());
        assert_eq!(
            f.format_publish_topic("vin100", "telemetry/engine"),
            "oem/vehicles/vin100/2c/telemetry/engine"
        );
    }

    #[test]
    fn test_subscribe_topic_strips_username_prefix() {
        let f = TopicFormatter::new(&config());
        assert_eq!(
            f.format_subscribe_topic("tenant1:vin100", "commands"),
            "oem/vehicles/vin100/2d/commands"
        );
    }

    #[test]
    fn test_user_topic_has_no_infix() {
        let f = TopicFormatter::new(&config());
        assert_eq!(
            f.format_user_topic("operator7", "alerts"),
            "oem/vehicles/operator7/alerts"
        );
    }

    #[test]
    fn test_client_prefix_omits_topic_prefix() {
        let f = TopicFormatter::new(&config());
        assert_eq!(
            f.format_subscribe_topic("client-vin100", "commands"),
            "client-vin100/2d/commands"
        );
        assert_eq!(
            f.format_user_topic("client-op", "alerts"),
            "client-op/alerts"
        );
    }
}
