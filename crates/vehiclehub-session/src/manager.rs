//! Post-authentication session processing.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use vehiclehub_core::config::auth::AuthConfig;
use vehiclehub_core::config::topics::TopicConfig;
use vehiclehub_core::error::AppError;
use vehiclehub_core::events::DeviceEvent;
use vehiclehub_core::result::AppResult;
use vehiclehub_core::traits::{EventSink, ProfileSource, SinkTopic};
use vehiclehub_core::types::CredentialVerdict;

use crate::expiry::SessionExpiryTracker;
use crate::registry::{ReleaseOutcome, SubscriptionRegistry};

/// What the post-auth processing did for a connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// An entry already existed and only its counter was raised.
    pub duplicate: bool,
    /// The device type resolved by this connect, if any.
    pub device_type: Option<String>,
    /// The connect was allowed without a resolved vehicle (profile check
    /// disabled).
    pub degraded: bool,
}

/// Runs between a successful credential verdict and the broker being
/// told the result: fires the online event, registers expiry, and binds
/// or refreshes the device subscription.
#[derive(Clone)]
pub struct SessionManager {
    registry: Arc<SubscriptionRegistry>,
    expiry: Arc<SessionExpiryTracker>,
    profiles: Arc<dyn ProfileSource>,
    sink: Arc<dyn EventSink>,
    whitelisted_users: Vec<String>,
    perf_test_user: String,
    profile_check_disabled: bool,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("whitelisted_users", &self.whitelisted_users)
            .field("profile_check_disabled", &self.profile_check_disabled)
            .finish()
    }
}

impl SessionManager {
    /// Creates the manager with its collaborators.
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        expiry: Arc<SessionExpiryTracker>,
        profiles: Arc<dyn ProfileSource>,
        sink: Arc<dyn EventSink>,
        auth_config: &AuthConfig,
        topic_config: &TopicConfig,
    ) -> Self {
        Self {
            registry,
            expiry,
            profiles,
            sink,
            whitelisted_users: auth_config.whitelisted_users.clone(),
            perf_test_user: auth_config.perf_test_user.clone(),
            profile_check_disabled: topic_config.profile_check_disabled(),
        }
    }

    /// Whether the username is a whitelisted/super user, exempt from
    /// profile resolution and expiry tracking.
    pub fn is_whitelisted(&self, user_name: &str) -> bool {
        self.whitelisted_users.iter().any(|u| u == user_name) || user_name == self.perf_test_user
    }

    /// Processes a successful authentication.
    ///
    /// Failing here fails the connect; the only expected failure is
    /// "vehicle details not found" when the profile cannot be resolved
    /// and degraded mode is not configured.
    pub async fn on_client_connected(
        &self,
        client_id: &str,
        user_name: &str,
        verdict: &CredentialVerdict,
    ) -> AppResult<SessionOutcome> {
        // The online event fires regardless of later steps.
        self.send_event(DeviceEvent::Online {
            client_id: client_id.to_string(),
            user_name: user_name.to_string(),
            timestamp: Utc::now().timestamp(),
        })
        .await;

        let whitelisted = self.is_whitelisted(user_name);
        if !whitelisted {
            self.expiry.track(client_id, verdict.expires_at);
        }

        if whitelisted {
            // Super users bind directly; no profile lookup.
            self.registry
                .bind(client_id, Some(client_id.to_string()), None);
            return Ok(SessionOutcome {
                duplicate: false,
                device_type: None,
                degraded: false,
            });
        }

        // Duplicate/overlapping connect: the entry exists, only the
        // counter moves. No external call.
        if let Some(counter) = self.registry.acquire(client_id) {
            debug!(client_id, counter, "Duplicate connect for cached client");
            return Ok(SessionOutcome {
                duplicate: true,
                device_type: self.registry.device_type(client_id),
                degraded: false,
            });
        }

        let profile = match self.profiles.lookup(client_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(client_id, error = %err, "Profile lookup failed");
                None
            }
        };

        match profile {
            Some(profile) if profile.has_vehicle() => {
                let device_type = profile.device_type.clone();
                self.registry
                    .bind(client_id, profile.vehicle_id, device_type.clone());
                info!(client_id, device_type = ?device_type, "Device subscription created");
                Ok(SessionOutcome {
                    duplicate: false,
                    device_type,
                    degraded: false,
                })
            }
            other => {
                if !self.profile_check_disabled {
                    // The connect is refused; the expiry entry registered
                    // above must not outlive it.
                    self.expiry.remove(client_id);
                    return Err(AppError::session(format!(
                        "Vehicle details not found for client '{client_id}'"
                    )));
                }
                // Degraded mode: connect without a vehicle binding,
                // permissions restricted to the allow-list topics.
                let device_type = other.and_then(|p| p.device_type);
                self.registry.bind(client_id, None, device_type.clone());
                warn!(client_id, "Connect allowed without vehicle binding");
                Ok(SessionOutcome {
                    duplicate: false,
                    device_type,
                    degraded: true,
                })
            }
        }
    }

    /// Processes a disconnect. Returns the removed subscription when the
    /// last connection went away (the caller fires no further events for
    /// superseded connections).
    pub async fn on_client_disconnected(&self, client_id: &str) -> ReleaseOutcome {
        let outcome = self.registry.release(client_id);

        match &outcome {
            ReleaseOutcome::Removed(removed) => {
                self.expiry.remove(client_id);
                self.send_event(DeviceEvent::Offline {
                    client_id: client_id.to_string(),
                    vehicle_id: removed.vehicle_id.clone(),
                    timestamp: Utc::now().timestamp(),
                })
                .await;
            }
            ReleaseOutcome::NotFound => {
                // No live entry means any expiry record is stale.
                self.expiry.remove(client_id);
            }
            ReleaseOutcome::Retained(_) => {}
        }

        outcome
    }

    /// Serializes and forwards an event; sink failures are logged, never
    /// propagated into the connect path.
    async fn send_event(&self, event: DeviceEvent) {
        let client_id = event.client_id().to_string();
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(client_id, error = %err, "Failed to serialize device event");
                return;
            }
        };
        if let Err(err) = self
            .sink
            .send_to_sink(&client_id, &payload, SinkTopic::DeviceStatus)
            .await
        {
            warn!(client_id, error = %err, "Failed to forward device event to sink");
        }
    }
}
