//! The topic permission engine.

use std::sync::Arc;

use tracing::debug;

use vehiclehub_core::config::ConfigStore;
use vehiclehub_core::config::auth::AuthConfig;
use vehiclehub_core::config::topics::TopicConfig;
use vehiclehub_core::types::{Activity, ClientClass, ClientIdentity, TopicPermission};
use vehiclehub_session::SubscriptionRegistry;
use vehiclehub_topic::TopicFormatter;

use crate::cache::PermissionCache;

/// Device-type-agnostic fallback keys in the flat config store.
const DEVICE_PUBLISH_TOPICS_KEY: &str = "device.mqtt.publish.topics";
const DEVICE_SUBSCRIBE_TOPICS_KEY: &str = "device.mqtt.subscribe.topics";

/// Computes and caches the ordered topic-permission list per client.
///
/// Classification precedence: whitelisted user > single-token username
/// (portal user) > device. Runs synchronously inside the post-auth
/// callback; every expensive computation lands in the injected cache and
/// is reused until the client disconnects.
#[derive(Clone)]
pub struct TopicAuthorizer {
    store: Arc<ConfigStore>,
    formatter: TopicFormatter,
    registry: Arc<SubscriptionRegistry>,
    cache: Arc<PermissionCache>,
    topics: TopicConfig,
    whitelisted_users: Vec<String>,
    perf_test_user: String,
    service_cn_prefix: String,
}

impl std::fmt::Debug for TopicAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicAuthorizer")
            .field("whitelisted_users", &self.whitelisted_users)
            .field("service_cn_prefix", &self.service_cn_prefix)
            .finish()
    }
}

impl TopicAuthorizer {
    /// Creates the engine with its collaborators.
    pub fn new(
        store: Arc<ConfigStore>,
        registry: Arc<SubscriptionRegistry>,
        cache: Arc<PermissionCache>,
        auth_config: &AuthConfig,
        topic_config: &TopicConfig,
    ) -> Self {
        Self {
            store,
            formatter: TopicFormatter::new(topic_config),
            registry,
            cache,
            topics: topic_config.clone(),
            whitelisted_users: auth_config.whitelisted_users.clone(),
            perf_test_user: auth_config.perf_test_user.clone(),
            service_cn_prefix: auth_config.service_cn_prefix.to_uppercase(),
        }
    }

    /// Permission list for a client, served from the cache when present.
    pub fn authorize(&self, client_id: &str, user_name: &str) -> Arc<Vec<TopicPermission>> {
        self.authorize_with_certificate(client_id, user_name, None)
    }

    /// Certificate-aware variant: a CN carrying the service prefix
    /// classifies as a service regardless of username shape; without a
    /// CN the username decides.
    pub fn authorize_with_certificate(
        &self,
        client_id: &str,
        user_name: &str,
        certificate_cn: Option<&str>,
    ) -> Arc<Vec<TopicPermission>> {
        if let Some(cached) = self.cache.get(client_id) {
            return cached;
        }
        self.compute_and_cache(client_id, user_name, certificate_cn)
    }

    /// Recomputes and replaces the cached list. Used once the device
    /// type becomes known after the first authorization.
    pub fn reassign(&self, client_id: &str, user_name: &str) -> Arc<Vec<TopicPermission>> {
        debug!(client_id, "Reassigning topic permissions");
        self.compute_and_cache(client_id, user_name, None)
    }

    /// Drops the cached list on disconnect.
    pub fn invalidate(&self, client_id: &str) {
        self.cache.invalidate(client_id);
    }

    /// Whether a permission list is currently cached for the client.
    pub fn is_cached(&self, client_id: &str) -> bool {
        self.cache.get(client_id).is_some()
    }

    /// Classifies the client.
    pub fn classify(&self, user_name: &str, certificate_cn: Option<&str>) -> ClientClass {
        if let Some(cn) = certificate_cn {
            return if cn.to_uppercase().starts_with(&self.service_cn_prefix) {
                ClientClass::WhitelistedService
            } else {
                ClientClass::Device
            };
        }
        if self.is_whitelisted(user_name) {
            ClientClass::WhitelistedService
        } else if user_name.split_whitespace().count() == 1 {
            ClientClass::PortalUser
        } else {
            ClientClass::Device
        }
    }

    /// Derives the per-connect identity.
    pub fn identify(
        &self,
        client_id: &str,
        user_name: &str,
        certificate_cn: Option<&str>,
    ) -> ClientIdentity {
        ClientIdentity::new(client_id, user_name, self.classify(user_name, certificate_cn))
    }

    fn is_whitelisted(&self, user_name: &str) -> bool {
        self.whitelisted_users.iter().any(|u| u == user_name) || user_name == self.perf_test_user
    }

    fn compute_and_cache(
        &self,
        client_id: &str,
        user_name: &str,
        certificate_cn: Option<&str>,
    ) -> Arc<Vec<TopicPermission>> {
        let identity = self.identify(client_id, user_name, certificate_cn);
        let permissions = Arc::new(match identity.class {
            ClientClass::WhitelistedService => self.service_permissions(),
            ClientClass::PortalUser => self.portal_permissions(&identity),
            ClientClass::Device => self.device_permissions(&identity),
        });
        debug!(
            client_id,
            class = ?identity.class,
            count = permissions.len(),
            "Computed topic permissions"
        );
        self.cache.insert(client_id, Arc::clone(&permissions));
        permissions
    }

    /// Whitelisted services get the whole managed topic space.
    fn service_permissions(&self) -> Vec<TopicPermission> {
        vec![TopicPermission::allow(
            format!("{}#", self.topics.topic_prefix),
            Activity::All,
        )]
    }

    /// Portal users subscribe to the configured portal topics (no route
    /// infix) plus any custom extras.
    fn portal_permissions(&self, identity: &ClientIdentity) -> Vec<TopicPermission> {
        let user_name = identity.user_name.as_str();
        let mut permissions: Vec<TopicPermission> = self
            .topics
            .portal_topics
            .iter()
            .map(|topic| {
                TopicPermission::allow(
                    self.formatter.format_user_topic(user_name, topic),
                    Activity::Subscribe,
                )
            })
            .collect();

        for custom in &self.topics.portal_custom_permissions {
            permissions.push(TopicPermission::allow(
                self.formatter.format_user_topic(user_name, &custom.topic),
                custom.activity,
            ));
        }
        permissions
    }

    /// Devices get the topic sets selected by their device type, with
    /// the agnostic lists as fallback; the profile-check-disabled topics
    /// always extend both sets, keep-alive extends publish, and the
    /// global subscribe-only topics extend subscribe.
    fn device_permissions(&self, identity: &ClientIdentity) -> Vec<TopicPermission> {
        let (client_id, user_name) = (identity.client_id.as_str(), identity.user_name.as_str());
        let device_type = self.registry.device_type(client_id);
        let use_fallback = device_type.is_none() || self.topics.allow_all_device_types;

        let (publish_topics, subscribe_topics) = if use_fallback {
            (
                self.store.get_list(DEVICE_PUBLISH_TOPICS_KEY),
                self.store.get_list(DEVICE_SUBSCRIBE_TOPICS_KEY),
            )
        } else {
            let device_type = device_type.as_deref().unwrap_or_default();
            (
                self.store
                    .get_list(&format!("{device_type}.{DEVICE_PUBLISH_TOPICS_KEY}")),
                self.store
                    .get_list(&format!("{device_type}.{DEVICE_SUBSCRIBE_TOPICS_KEY}")),
            )
        };

        let mut permissions = Vec::new();

        for topic in publish_topics
            .iter()
            .chain(&self.topics.profile_check_disabled_topics)
            .chain(std::iter::once(&self.topics.keep_alive_topic))
        {
            permissions.push(TopicPermission::allow(
                self.formatter.format_publish_topic(client_id, topic),
                Activity::Publish,
            ));
        }

        for topic in subscribe_topics
            .iter()
            .chain(&self.topics.profile_check_disabled_topics)
            .chain(&self.topics.subscribe_only_topics)
        {
            permissions.push(TopicPermission::allow(
                self.formatter.format_subscribe_topic(user_name, topic),
                Activity::Subscribe,
            ));
        }

        permissions
    }
}
