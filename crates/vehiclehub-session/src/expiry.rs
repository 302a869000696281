//! Credential expiry tracking and proactive forced disconnects.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use vehiclehub_core::config::session::SessionConfig;
use vehiclehub_core::traits::SessionControl;

/// Secondary clientId → expiry map, populated only for non-super-user
/// sessions when the feature flag enables it.
///
/// The broker's session control surface becomes available after the
/// tracker is constructed, so the handle is injected late; validation
/// before that point is a warning + no-op.
pub struct SessionExpiryTracker {
    enabled: bool,
    suppress_last_will: bool,
    deadlines: DashMap<String, i64>,
    session_control: RwLock<Option<Arc<dyn SessionControl>>>,
}

impl std::fmt::Debug for SessionExpiryTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionExpiryTracker")
            .field("enabled", &self.enabled)
            .field("tracked", &self.deadlines.len())
            .finish()
    }
}

impl SessionExpiryTracker {
    /// Creates a tracker from session configuration.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            enabled: config.expiry_tracking_enabled,
            suppress_last_will: config.suppress_last_will,
            deadlines: DashMap::new(),
            session_control: RwLock::new(None),
        }
    }

    /// Injects the broker's session control once the host provides it.
    pub fn attach_session_control(&self, control: Arc<dyn SessionControl>) {
        *self
            .session_control
            .write()
            .expect("session control lock poisoned") = Some(control);
    }

    /// Starts tracking a session's credential expiry. Never-expiring
    /// credentials and disabled tracking are no-ops.
    pub fn track(&self, client_id: &str, expires_at: i64) {
        if !self.enabled || expires_at == i64::MAX {
            return;
        }
        self.deadlines.insert(client_id.to_string(), expires_at);
        debug!(client_id, expires_at, "Tracking credential expiry");
    }

    /// Stops tracking a client (disconnect or forced invalidation).
    pub fn remove(&self, client_id: &str) {
        self.deadlines.remove(client_id);
    }

    /// Whether the client is currently tracked.
    pub fn contains(&self, client_id: &str) -> bool {
        self.deadlines.contains_key(client_id)
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Whether no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// If the stored expiry for the client is past, removes the entry
    /// and force-disconnects via the broker's session control. Returns
    /// whether a disconnect was issued.
    pub async fn validate_token_expiration(&self, client_id: &str) -> bool {
        let now = Utc::now().timestamp();
        let expired = self
            .deadlines
            .get(client_id)
            .is_some_and(|deadline| *deadline <= now);
        if !expired {
            return false;
        }

        let control = self
            .session_control
            .read()
            .expect("session control lock poisoned")
            .clone();
        let Some(control) = control else {
            warn!(
                client_id,
                "Credential expired but session control is not available yet"
            );
            return false;
        };

        self.deadlines.remove(client_id);
        match control
            .disconnect_client(client_id, self.suppress_last_will)
            .await
        {
            Ok(was_connected) => {
                info!(
                    client_id,
                    was_connected, "Force-disconnected client with expired credential"
                );
                true
            }
            Err(err) => {
                warn!(
                    client_id,
                    error = %err,
                    "Failed to force-disconnect client with expired credential"
                );
                false
            }
        }
    }

    /// Runs one validation cycle over every tracked session. Returns the
    /// number of forced disconnects.
    pub async fn run_sweep(&self) -> u32 {
        let client_ids: Vec<String> = self
            .deadlines
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let mut disconnected = 0u32;
        for client_id in client_ids {
            if self.validate_token_expiration(&client_id).await {
                disconnected += 1;
            }
        }

        if disconnected > 0 {
            info!(disconnected, "Expiry sweep completed");
        }
        disconnected
    }
}
