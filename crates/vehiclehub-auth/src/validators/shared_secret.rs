//! Static shared-secret validation for whitelisted users.

use async_trait::async_trait;
use tracing::debug;

use vehiclehub_core::config::auth::AuthConfig;
use vehiclehub_core::types::CredentialVerdict;

use crate::request::ConnectRequest;

use super::CredentialValidator;

/// Authenticates the configured user whitelist (plus the synthetic
/// perf-test user) against one static password.
#[derive(Debug, Clone)]
pub struct SharedSecretValidator {
    whitelisted_users: Vec<String>,
    perf_test_user: String,
    static_password: String,
}

impl SharedSecretValidator {
    /// Creates the validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            whitelisted_users: config.whitelisted_users.clone(),
            perf_test_user: config.perf_test_user.clone(),
            static_password: config.static_password.clone(),
        }
    }

    /// Whether the username may use the static password at all.
    pub fn covers(&self, user_name: &str) -> bool {
        self.whitelisted_users.iter().any(|u| u == user_name) || user_name == self.perf_test_user
    }
}

#[async_trait]
impl CredentialValidator for SharedSecretValidator {
    fn name(&self) -> &'static str {
        "shared_secret"
    }

    async fn authenticate(&self, request: &ConnectRequest) -> Option<CredentialVerdict> {
        let password = request.password.as_deref()?;

        if !self.covers(&request.user_name) {
            return None;
        }

        if password == self.static_password {
            // Static secrets carry no expiry of their own.
            Some(CredentialVerdict::accepted_forever())
        } else {
            debug!(
                client_id = %request.client_id,
                user_name = %request.user_name,
                "Whitelisted user presented a wrong static password"
            );
            Some(CredentialVerdict::rejected())
        }
    }
}
