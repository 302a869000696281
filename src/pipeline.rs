//! The broker-facing gateway pipeline.
//!
//! Authentication runs on a bounded worker pool off the broker's I/O
//! thread, under an enforced timeout; the broker only ever sees
//! accept/reject plus a protocol-level reason. Authorization runs
//! synchronously inside the post-auth callback.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use vehiclehub_auth::{AuthenticationChain, ConnectRequest};
use vehiclehub_authz::{PermissionCache, TopicAuthorizer};
use vehiclehub_core::config::{ConfigStore, GatewayConfig};
use vehiclehub_core::error::{AppError, ErrorKind};
use vehiclehub_core::result::AppResult;
use vehiclehub_core::traits::{EventSink, ProfileSource, SessionControl};
use vehiclehub_core::types::TopicPermission;
use vehiclehub_session::{
    DeviceSubscription, ReleaseOutcome, SessionExpiryTracker, SessionManager, SubscriptionRegistry,
};

/// Protocol-level reason reported for a rejected connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Credentials rejected, timed out, or an internal fault.
    NotAuthorized,
    /// Authentication passed but no vehicle could be resolved.
    VehicleDetailsNotFound,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthorized => write!(f, "not authorized"),
            Self::VehicleDetailsNotFound => write!(f, "vehicle details not found"),
        }
    }
}

/// Result of one connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The client is authenticated and its session state is in place.
    Accepted,
    /// The connect is refused with the given reason.
    Rejected(RejectReason),
}

impl ConnectOutcome {
    /// Whether the connect was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Owns every component of the extension and exposes the broker
/// callbacks.
#[derive(Clone)]
pub struct GatewayPipeline {
    chain: Arc<AuthenticationChain>,
    session_manager: Arc<SessionManager>,
    authorizer: Arc<TopicAuthorizer>,
    registry: Arc<SubscriptionRegistry>,
    expiry: Arc<SessionExpiryTracker>,
    auth_semaphore: Arc<Semaphore>,
    auth_timeout: Duration,
}

impl fmt::Debug for GatewayPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayPipeline")
            .field("auth_timeout", &self.auth_timeout)
            .finish()
    }
}

impl GatewayPipeline {
    /// Wires the extension together from configuration and the
    /// host-provided collaborators.
    pub fn new(
        config: &GatewayConfig,
        store: ConfigStore,
        profiles: Arc<dyn ProfileSource>,
        sink: Arc<dyn EventSink>,
    ) -> AppResult<Self> {
        info!("Starting VehicleHub gateway v{}", env!("CARGO_PKG_VERSION"));

        if config.topics.topic_prefix.is_empty() {
            return Err(AppError::configuration(
                "Topic prefix must not be empty; every managed topic lives under it",
            ));
        }

        let chain = Arc::new(AuthenticationChain::standard(&config.auth)?);

        let registry = Arc::new(SubscriptionRegistry::new());
        let expiry = Arc::new(SessionExpiryTracker::new(&config.session));

        let session_manager = Arc::new(SessionManager::new(
            Arc::clone(&registry),
            Arc::clone(&expiry),
            profiles,
            sink,
            &config.auth,
            &config.topics,
        ));

        let cache = Arc::new(PermissionCache::new(&config.session));
        let authorizer = Arc::new(TopicAuthorizer::new(
            Arc::new(store),
            Arc::clone(&registry),
            cache,
            &config.auth,
            &config.topics,
        ));

        Ok(Self {
            chain,
            session_manager,
            authorizer,
            registry,
            expiry,
            auth_semaphore: Arc::new(Semaphore::new(config.auth.max_concurrent_auth)),
            auth_timeout: Duration::from_secs(config.auth.auth_timeout_seconds),
        })
    }

    /// Injects the broker's session control once available.
    pub fn attach_session_control(&self, control: Arc<dyn SessionControl>) {
        self.expiry.attach_session_control(control);
    }

    /// The subscription registry, for host status reporting.
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// The expiry tracker.
    pub fn expiry_tracker(&self) -> &Arc<SessionExpiryTracker> {
        &self.expiry
    }

    /// Authenticates a connect attempt and, on success, runs post-auth
    /// session processing before the broker is told the result.
    ///
    /// Worker-pool bounded and timeout-enforced; a panic or an internal
    /// error converts to "not authorized" so a bug cannot leave the
    /// attempt hanging past its timeout.
    pub async fn handle_connect(&self, request: ConnectRequest) -> ConnectOutcome {
        let client_id = request.client_id.clone();
        let user_name = request.user_name.clone();

        let chain = Arc::clone(&self.chain);
        let manager = Arc::clone(&self.session_manager);
        let semaphore = Arc::clone(&self.auth_semaphore);

        let task = tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return ConnectOutcome::Rejected(RejectReason::NotAuthorized),
            };

            let verdict = chain.authenticate(&request).await;
            if !verdict.authenticated {
                return ConnectOutcome::Rejected(RejectReason::NotAuthorized);
            }

            match manager
                .on_client_connected(&request.client_id, &request.user_name, &verdict)
                .await
            {
                Ok(_) => ConnectOutcome::Accepted,
                Err(err) if err.kind == ErrorKind::Session => {
                    info!(client_id = %request.client_id, error = %err, "Connect refused");
                    ConnectOutcome::Rejected(RejectReason::VehicleDetailsNotFound)
                }
                Err(err) => {
                    error!(
                        client_id = %request.client_id,
                        error = %err,
                        "Post-auth processing failed"
                    );
                    ConnectOutcome::Rejected(RejectReason::NotAuthorized)
                }
            }
        });

        let abort = task.abort_handle();
        let outcome = match tokio::time::timeout(self.auth_timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                error!(
                    client_id = %client_id,
                    error = %join_error,
                    "Authentication task failed"
                );
                ConnectOutcome::Rejected(RejectReason::NotAuthorized)
            }
            Err(_) => {
                // The stalled attempt is cancelled so it cannot outlive
                // its own connect and race a later disconnect.
                abort.abort();
                warn!(client_id = %client_id, "Authentication timed out");
                ConnectOutcome::Rejected(RejectReason::NotAuthorized)
            }
        };

        // A device type resolved by this connect supersedes permissions
        // cached by an overlapping earlier connection.
        if outcome.is_accepted()
            && self.authorizer.is_cached(&client_id)
            && self.registry.device_type(&client_id).is_some()
        {
            self.authorizer.reassign(&client_id, &user_name);
        }

        outcome
    }

    /// Processes a disconnect: order-tolerant, idempotent, and never
    /// blocked by an in-flight authentication for the same clientId.
    pub async fn handle_disconnect(&self, client_id: &str) {
        let outcome = self.session_manager.on_client_disconnected(client_id).await;
        match outcome {
            ReleaseOutcome::Removed(_) | ReleaseOutcome::NotFound => {
                self.authorizer.invalidate(client_id);
            }
            ReleaseOutcome::Retained(remaining) => {
                // A newer connection of the same clientId is still live;
                // its cached permissions stay.
                info!(client_id, remaining, "Superseded connection released");
            }
        }
    }

    /// Forced invalidation (ECU swap, suspicious device): removes the
    /// subscription regardless of its connection counter, together with
    /// the cached permissions and the expiry entry. Returns the removed
    /// entry so the host can decide whether an offline event fires.
    pub fn force_invalidate(&self, client_id: &str) -> Option<DeviceSubscription> {
        let removed = self.registry.remove(client_id);
        self.authorizer.invalidate(client_id);
        self.expiry.remove(client_id);
        if removed.is_some() {
            warn!(client_id, "Session forcibly invalidated");
        }
        removed
    }

    /// Records a topic subscription for status reporting.
    pub fn handle_subscribe(&self, client_id: &str, topic: &str) {
        self.registry.add_topic(client_id, topic);
    }

    /// Drops a recorded topic subscription.
    pub fn handle_unsubscribe(&self, client_id: &str, topic: &str) {
        self.registry.remove_topic(client_id, topic);
    }

    /// Synchronous permission computation for the post-auth callback.
    pub fn authorize(&self, client_id: &str, user_name: &str) -> Arc<Vec<TopicPermission>> {
        self.authorizer.authorize(client_id, user_name)
    }

    /// Certificate-aware permission computation.
    pub fn authorize_with_certificate(
        &self,
        client_id: &str,
        user_name: &str,
        certificate_cn: Option<&str>,
    ) -> Arc<Vec<TopicPermission>> {
        self.authorizer
            .authorize_with_certificate(client_id, user_name, certificate_cn)
    }

    /// Force-disconnects the client when its tracked credential expired.
    pub async fn validate_token_expiration(&self, client_id: &str) -> bool {
        self.expiry.validate_token_expiration(client_id).await
    }

    /// One proactive expiry pass over all tracked sessions.
    pub async fn run_expiry_sweep(&self) -> u32 {
        self.expiry.run_sweep().await
    }
}
