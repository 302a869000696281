//! Per-client permission cache.
//!
//! An injected cache service scoped to active sessions: entries are
//! written once per session, returned on every later authorization
//! check, and removed on explicit disconnect. An optional safety TTL
//! bounds leakage after an unclean broker crash.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use vehiclehub_core::config::session::SessionConfig;
use vehiclehub_core::types::TopicPermission;

/// Cache clientId → computed permission list.
#[derive(Clone)]
pub struct PermissionCache {
    cache: Cache<String, Arc<Vec<TopicPermission>>>,
}

impl std::fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl PermissionCache {
    /// Creates the cache from session configuration.
    pub fn new(config: &SessionConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.permission_cache_capacity);
        if let Some(ttl) = config.permission_cache_safety_ttl_seconds {
            builder = builder.time_to_live(Duration::from_secs(ttl));
        }
        Self {
            cache: builder.build(),
        }
    }

    /// The cached permission list, if any.
    pub fn get(&self, client_id: &str) -> Option<Arc<Vec<TopicPermission>>> {
        self.cache.get(client_id)
    }

    /// Stores (or replaces) the permission list for a client.
    pub fn insert(&self, client_id: &str, permissions: Arc<Vec<TopicPermission>>) {
        self.cache.insert(client_id.to_string(), permissions);
    }

    /// Removes the entry on disconnect.
    pub fn invalidate(&self, client_id: &str) {
        self.cache.invalidate(client_id);
    }
}
