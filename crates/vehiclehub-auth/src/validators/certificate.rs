//! X.509 certificate validation.
//!
//! The CN either proves a backend service (configured prefix + whitelist)
//! or must match the connecting clientId. Certificates arrive through the
//! mutual-TLS handshake or, for callers that cannot present one there, as
//! a base64 PEM blob in the password field.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use tracing::{debug, warn};
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

use vehiclehub_core::config::auth::AuthConfig;
use vehiclehub_core::types::CredentialVerdict;

use crate::request::ConnectRequest;

use super::{CredentialValidator, SharedSecretValidator};

/// Where the certificate came from; controls expiry re-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CertSource {
    /// Presented during the mutual-TLS handshake.
    MutualTls,
    /// Carried as base64 PEM in the password field.
    Password,
}

/// The fields the validator needs from a parsed certificate.
#[derive(Debug, Clone)]
struct ParsedCertificate {
    common_name: String,
    not_after: i64,
}

/// Validates client certificates; delegates internal-listener callers
/// without TLS to the shared-secret validator.
#[derive(Debug, Clone)]
pub struct CertificateValidator {
    service_cn_prefix: String,
    whitelisted_service_cns: Vec<String>,
    shared_secret: Arc<SharedSecretValidator>,
}

impl CertificateValidator {
    /// Creates the validator from auth configuration.
    pub fn new(config: &AuthConfig, shared_secret: Arc<SharedSecretValidator>) -> Self {
        Self {
            service_cn_prefix: config.service_cn_prefix.to_uppercase(),
            whitelisted_service_cns: config.whitelisted_service_cns.clone(),
            shared_secret,
        }
    }

    fn verdict_for(
        &self,
        cert: &ParsedCertificate,
        request: &ConnectRequest,
        source: CertSource,
        now: i64,
    ) -> CredentialVerdict {
        if cert.common_name.is_empty() {
            debug!(client_id = %request.client_id, "Certificate rejected: empty CN");
            return CredentialVerdict::rejected();
        }

        // Expiry is only re-checked on the password-carried path; the
        // mutual-TLS handshake already validated the certificate.
        if source == CertSource::Password && cert.not_after <= now {
            debug!(
                client_id = %request.client_id,
                not_after = cert.not_after,
                "Password-carried certificate rejected: expired"
            );
            return CredentialVerdict::rejected();
        }

        let cn_upper = cert.common_name.to_uppercase();
        let accepted = if cn_upper.starts_with(&self.service_cn_prefix) {
            let remainder = &cn_upper[self.service_cn_prefix.len()..];
            self.whitelisted_service_cns
                .iter()
                .any(|w| w.eq_ignore_ascii_case(remainder))
        } else {
            cert.common_name.eq_ignore_ascii_case(&request.client_id)
        };

        if accepted {
            CredentialVerdict::accepted(cert.not_after)
        } else {
            debug!(
                client_id = %request.client_id,
                cn = %cert.common_name,
                "Certificate rejected: CN matches neither the service whitelist nor the client id"
            );
            CredentialVerdict::rejected()
        }
    }
}

#[async_trait]
impl CredentialValidator for CertificateValidator {
    fn name(&self) -> &'static str {
        "certificate"
    }

    async fn authenticate(&self, request: &ConnectRequest) -> Option<CredentialVerdict> {
        // Internal services reach the broker on a trusted plaintext
        // listener and authenticate with the static secret instead.
        if request.tls.is_none() && request.internal_listener {
            return self.shared_secret.authenticate(request).await;
        }

        let now = Utc::now().timestamp();

        if let Some(der) = request.client_certificate_der() {
            let Some(cert) = extract_from_der(der) else {
                warn!(
                    client_id = %request.client_id,
                    "Certificate rejected: unparseable DER from TLS handshake"
                );
                return Some(CredentialVerdict::rejected());
            };
            return Some(self.verdict_for(&cert, request, CertSource::MutualTls, now));
        }

        if let Some(password) = request.password.as_deref()
            && let Some(cert) = extract_from_password(password)
        {
            return Some(self.verdict_for(&cert, request, CertSource::Password, now));
        }

        None
    }
}

/// Extracts CN and notAfter from a DER certificate. `None` when the
/// bytes are not a certificate at all.
fn extract_from_der(der: &[u8]) -> Option<ParsedCertificate> {
    let (_, cert) = X509Certificate::from_der(der).ok()?;
    Some(fields_of(&cert))
}

/// Extracts CN and notAfter from a base64 PEM password. `None` when the
/// password is not a certificate (it may still be a token or a secret).
fn extract_from_password(password: &str) -> Option<ParsedCertificate> {
    let bytes = BASE64.decode(password.trim()).ok()?;
    let (_, pem) = parse_x509_pem(&bytes).ok()?;
    let cert = pem.parse_x509().ok()?;
    Some(fields_of(&cert))
}

fn fields_of(cert: &X509Certificate<'_>) -> ParsedCertificate {
    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .unwrap_or_default()
        .to_string();
    ParsedCertificate {
        common_name,
        not_after: cert.validity().not_after.timestamp(),
    }
}
