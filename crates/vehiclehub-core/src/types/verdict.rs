//! Per-attempt credential verdicts.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one credential for one connect attempt.
///
/// Immutable; produced by a validator, consumed by the session layer and
/// then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialVerdict {
    /// Whether the credential proved the claimed identity.
    pub authenticated: bool,
    /// Credential expiry as seconds since the Unix epoch.
    ///
    /// `i64::MAX` for credentials that never expire (static secrets),
    /// `0` for rejected attempts.
    pub expires_at: i64,
}

impl CredentialVerdict {
    /// A successful verdict expiring at the given epoch second.
    pub fn accepted(expires_at: i64) -> Self {
        Self {
            authenticated: true,
            expires_at,
        }
    }

    /// A successful verdict for a credential that never expires.
    pub fn accepted_forever() -> Self {
        Self::accepted(i64::MAX)
    }

    /// The rejection verdict.
    pub fn rejected() -> Self {
        Self {
            authenticated: false,
            expires_at: 0,
        }
    }
}
