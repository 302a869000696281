//! Credential validators behind one capability interface.

pub mod certificate;
pub mod shared_secret;
pub mod token;

use async_trait::async_trait;

use vehiclehub_core::types::CredentialVerdict;

use crate::request::ConnectRequest;

pub use certificate::CertificateValidator;
pub use shared_secret::SharedSecretValidator;
pub use token::SignedTokenValidator;

/// One credential mechanism.
///
/// `None` means "not my credential, try the next validator in the chain";
/// `Some` is a conclusive verdict and short-circuits the chain. Expected
/// rejections are verdicts, never errors — malformed credentials are
/// logged and rejected.
#[async_trait]
pub trait CredentialValidator: Send + Sync + std::fmt::Debug + 'static {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    /// Evaluate the request against this mechanism.
    async fn authenticate(&self, request: &ConnectRequest) -> Option<CredentialVerdict>;
}
