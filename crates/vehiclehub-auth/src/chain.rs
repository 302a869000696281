//! Ordered, short-circuiting credential evaluation.

use std::sync::Arc;

use tracing::{debug, warn};

use vehiclehub_core::config::auth::AuthConfig;
use vehiclehub_core::result::AppResult;
use vehiclehub_core::types::CredentialVerdict;

use crate::request::ConnectRequest;
use crate::validators::{
    CertificateValidator, CredentialValidator, SharedSecretValidator, SignedTokenValidator,
};

/// Tries validators in order and stops at the first conclusive verdict.
///
/// The standard order is certificate → signed token → shared secret; the
/// certificate validator internally covers the no-cert internal-service
/// case. The chain always returns a verdict — when no validator claims
/// the request, it is rejected.
#[derive(Clone)]
pub struct AuthenticationChain {
    validators: Vec<Arc<dyn CredentialValidator>>,
}

impl std::fmt::Debug for AuthenticationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationChain")
            .field(
                "validators",
                &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl AuthenticationChain {
    /// Creates a chain over an explicit validator list.
    pub fn new(validators: Vec<Arc<dyn CredentialValidator>>) -> Self {
        Self { validators }
    }

    /// Builds the standard chain from auth configuration.
    ///
    /// The signed-token validator is only installed when a public key is
    /// configured; an unusable key is fatal.
    pub fn standard(config: &AuthConfig) -> AppResult<Self> {
        let shared_secret = Arc::new(SharedSecretValidator::new(config));

        let mut validators: Vec<Arc<dyn CredentialValidator>> = Vec::new();
        validators.push(Arc::new(CertificateValidator::new(
            config,
            Arc::clone(&shared_secret),
        )));

        if config.token_public_key_pem.is_empty() {
            warn!("No token public key configured; signed-token authentication disabled");
        } else {
            validators.push(Arc::new(SignedTokenValidator::new(config)?));
        }

        validators.push(shared_secret);
        Ok(Self::new(validators))
    }

    /// Evaluates the request. Always returns a verdict.
    pub async fn authenticate(&self, request: &ConnectRequest) -> CredentialVerdict {
        for validator in &self.validators {
            if let Some(verdict) = validator.authenticate(request).await {
                debug!(
                    client_id = %request.client_id,
                    validator = validator.name(),
                    authenticated = verdict.authenticated,
                    "Credential evaluation concluded"
                );
                return verdict;
            }
        }

        debug!(
            client_id = %request.client_id,
            "No validator claimed the request"
        );
        CredentialVerdict::rejected()
    }
}
