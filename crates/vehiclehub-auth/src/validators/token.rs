//! RS256 signed-token validation.
//!
//! The `jsonwebtoken` crate verifies the signature only; identity, time
//! and scope checks are explicit so their ordering and semantics stay
//! visible. Parse and signature failures are rejections, never errors.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;

use vehiclehub_core::config::auth::AuthConfig;
use vehiclehub_core::error::AppError;
use vehiclehub_core::result::AppResult;
use vehiclehub_core::types::CredentialVerdict;

use crate::request::ConnectRequest;

use super::CredentialValidator;

/// The `aud` claim may be a single string or an array of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience.
    One(String),
    /// Multiple audiences.
    Many(Vec<String>),
}

impl Audience {
    /// Whether the audience names the given value.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::One(aud) => aud == value,
            Self::Many(auds) => auds.iter().any(|a| a == value),
        }
    }
}

/// Which identity claim satisfied the match, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityClaim {
    /// `azp` equals the client id.
    AuthorizedParty,
    /// `aud` contains the client id.
    Audience,
    /// `sub` equals the username.
    Subject,
}

/// Claims inspected by the validator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    /// Authorized party.
    pub azp: Option<String>,
    /// Audience(s).
    pub aud: Option<Audience>,
    /// Subject.
    pub sub: Option<String>,
    /// Expiry, epoch seconds.
    pub exp: Option<i64>,
    /// Not-before, epoch seconds.
    pub nbf: Option<i64>,
    /// Space-delimited scopes (OAuth2 convention).
    pub scope: Option<String>,
}

impl TokenClaims {
    /// Resolves the identity match: `azp` == clientId beats `aud`
    /// containing clientId beats `sub` == userName. A mismatching claim
    /// falls through to the next one.
    pub fn matched_identity(&self, client_id: &str, user_name: &str) -> Option<IdentityClaim> {
        if self.azp.as_deref() == Some(client_id) {
            return Some(IdentityClaim::AuthorizedParty);
        }
        if self.aud.as_ref().is_some_and(|aud| aud.contains(client_id)) {
            return Some(IdentityClaim::Audience);
        }
        if self.sub.as_deref() == Some(user_name) {
            return Some(IdentityClaim::Subject);
        }
        None
    }

    /// Time validity: `exp` must be present and in the future; `nbf`, if
    /// present, must not be in the future.
    pub fn time_valid(&self, now: i64) -> bool {
        let Some(exp) = self.exp else {
            return false;
        };
        if now >= exp {
            return false;
        }
        if let Some(nbf) = self.nbf
            && now < nbf
        {
            return false;
        }
        true
    }

    /// The token's scopes.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.as_deref().unwrap_or("").split_whitespace()
    }

    /// Any single overlapping scope is enough; full-subset is not required.
    pub fn scope_overlaps(&self, valid_scopes: &[String]) -> bool {
        self.scopes().any(|s| valid_scopes.iter().any(|v| v == s))
    }
}

/// Verifies RS256 tokens carried in the password field.
#[derive(Clone)]
pub struct SignedTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    valid_scopes: Vec<String>,
}

impl std::fmt::Debug for SignedTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedTokenValidator")
            .field("valid_scopes", &self.valid_scopes)
            .finish()
    }
}

impl SignedTokenValidator {
    /// Creates the validator from auth configuration. An unusable public
    /// key is fatal at construction.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(config.token_public_key_pem.as_bytes())
            .map_err(|e| AppError::configuration(format!("Invalid token public key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        // The library only checks the signature; claim checks below.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Ok(Self {
            decoding_key,
            validation,
            valid_scopes: config.valid_scopes.clone(),
        })
    }

    /// A password is only offered to this validator when it looks like a
    /// compact JWS (two dots). Static secrets and certificates fall
    /// through to the other validators.
    fn has_token_shape(password: &str) -> bool {
        password.split('.').count() == 3
    }
}

#[async_trait]
impl CredentialValidator for SignedTokenValidator {
    fn name(&self) -> &'static str {
        "signed_token"
    }

    async fn authenticate(&self, request: &ConnectRequest) -> Option<CredentialVerdict> {
        let password = request.password.as_deref()?;
        if !Self::has_token_shape(password) {
            return None;
        }

        let claims = match decode::<TokenClaims>(password, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(err) => {
                debug!(
                    client_id = %request.client_id,
                    error = %err,
                    "Token rejected: parse or signature failure"
                );
                return Some(CredentialVerdict::rejected());
            }
        };

        let Some(matched) = claims.matched_identity(&request.client_id, &request.user_name) else {
            debug!(
                client_id = %request.client_id,
                user_name = %request.user_name,
                "Token rejected: no identity claim matches"
            );
            return Some(CredentialVerdict::rejected());
        };

        let now = Utc::now().timestamp();
        if !claims.time_valid(now) {
            debug!(
                client_id = %request.client_id,
                exp = ?claims.exp,
                nbf = ?claims.nbf,
                "Token rejected: outside its validity window"
            );
            return Some(CredentialVerdict::rejected());
        }

        if !claims.scope_overlaps(&self.valid_scopes) {
            debug!(
                client_id = %request.client_id,
                scope = ?claims.scope,
                "Token rejected: no overlapping scope"
            );
            return Some(CredentialVerdict::rejected());
        }

        debug!(
            client_id = %request.client_id,
            matched = ?matched,
            "Token accepted"
        );
        Some(CredentialVerdict::accepted(claims.exp.unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(json: serde_json::Value) -> TokenClaims {
        serde_json::from_value(json).unwrap()
    }

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_past_exp_rejected_regardless_of_other_claims() {
        let c = claims(serde_json::json!({
            "azp": "cl1", "sub": "user", "exp": NOW - 1, "scope": "mqtt.connect"
        }));
        assert!(!c.time_valid(NOW));
    }

    #[test]
    fn test_missing_exp_is_invalid() {
        let c = claims(serde_json::json!({ "azp": "cl1" }));
        assert!(!c.time_valid(NOW));
    }

    #[test]
    fn test_absent_nbf_with_future_exp_passes() {
        let c = claims(serde_json::json!({ "exp": NOW + 600 }));
        assert!(c.time_valid(NOW));
    }

    #[test]
    fn test_future_nbf_rejected() {
        let c = claims(serde_json::json!({ "exp": NOW + 600, "nbf": NOW + 60 }));
        assert!(!c.time_valid(NOW));
        assert!(c.time_valid(NOW + 60));
    }

    #[test]
    fn test_identity_priority_azp_beats_aud_beats_sub() {
        let all = claims(serde_json::json!({
            "azp": "cl1", "aud": ["cl1", "other"], "sub": "user"
        }));
        assert_eq!(
            all.matched_identity("cl1", "user"),
            Some(IdentityClaim::AuthorizedParty)
        );

        // azp mismatch falls through to aud.
        let aud = claims(serde_json::json!({
            "azp": "someone-else", "aud": ["cl1"], "sub": "user"
        }));
        assert_eq!(
            aud.matched_identity("cl1", "user"),
            Some(IdentityClaim::Audience)
        );

        // aud mismatch falls through to sub.
        let sub = claims(serde_json::json!({
            "azp": "someone-else", "aud": "third", "sub": "user"
        }));
        assert_eq!(
            sub.matched_identity("cl1", "user"),
            Some(IdentityClaim::Subject)
        );

        let none = claims(serde_json::json!({ "azp": "x", "aud": "y", "sub": "z" }));
        assert_eq!(none.matched_identity("cl1", "user"), None);
    }

    #[test]
    fn test_string_audience_matches() {
        let c = claims(serde_json::json!({ "aud": "cl1" }));
        assert_eq!(
            c.matched_identity("cl1", "user"),
            Some(IdentityClaim::Audience)
        );
    }

    #[test]
    fn test_single_scope_overlap_is_enough() {
        let valid = vec!["mqtt.connect".to_string(), "mqtt.publish".to_string()];
        let c = claims(serde_json::json!({ "scope": "profile mqtt.publish email" }));
        assert!(c.scope_overlaps(&valid));

        let none = claims(serde_json::json!({ "scope": "profile email" }));
        assert!(!none.scope_overlaps(&valid));

        let absent = claims(serde_json::json!({}));
        assert!(!absent.scope_overlaps(&valid));
    }

    #[test]
    fn test_token_shape() {
        assert!(SignedTokenValidator::has_token_shape("a.b.c"));
        assert!(!SignedTokenValidator::has_token_shape("s3cr3t"));
        assert!(!SignedTokenValidator::has_token_shape("a.b"));
    }

    mod signed {
        use super::*;
        use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
        use rsa::{RsaPrivateKey, RsaPublicKey};

        fn keypair() -> (RsaPrivateKey, String) {
            let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("key");
            let public_pem = RsaPublicKey::from(&key)
                .to_pkcs1_pem(Default::default())
                .expect("public pem");
            (key, public_pem)
        }

        fn mint(key: &RsaPrivateKey, claims: serde_json::Value) -> String {
            let pem = key.to_pkcs1_pem(Default::default()).expect("private pem");
            jsonwebtoken::encode(
                &jsonwebtoken::Header::new(Algorithm::RS256),
                &claims,
                &jsonwebtoken::EncodingKey::from_rsa_pem(pem.as_bytes()).expect("enc"),
            )
            .expect("token")
        }

        fn validator(public_pem: &str) -> SignedTokenValidator {
            SignedTokenValidator::new(&AuthConfig {
                token_public_key_pem: public_pem.to_string(),
                valid_scopes: vec!["mqtt.connect".to_string()],
                ..AuthConfig::default()
            })
            .expect("validator")
        }

        #[tokio::test]
        async fn test_valid_token_is_accepted_with_exp_expiry() {
            let (key, public_pem) = keypair();
            let exp = Utc::now().timestamp() + 300;
            let token = mint(
                &key,
                serde_json::json!({ "azp": "cl1", "exp": exp, "scope": "mqtt.connect" }),
            );
            let req = ConnectRequest::basic("cl1", "user", Some(token));
            let verdict = validator(&public_pem).authenticate(&req).await.unwrap();
            assert!(verdict.authenticated);
            assert_eq!(verdict.expires_at, exp);
        }

        #[tokio::test]
        async fn test_wrong_key_signature_is_rejected() {
            let (key, _) = keypair();
            let (_, other_public) = keypair();
            let exp = Utc::now().timestamp() + 300;
            let token = mint(
                &key,
                serde_json::json!({ "azp": "cl1", "exp": exp, "scope": "mqtt.connect" }),
            );
            let req = ConnectRequest::basic("cl1", "user", Some(token));
            let verdict = validator(&other_public).authenticate(&req).await.unwrap();
            assert!(!verdict.authenticated);
            assert_eq!(verdict.expires_at, 0);
        }

        #[tokio::test]
        async fn test_expired_token_is_rejected() {
            let (key, public_pem) = keypair();
            let token = mint(
                &key,
                serde_json::json!({
                    "azp": "cl1",
                    "exp": Utc::now().timestamp() - 10,
                    "scope": "mqtt.connect"
                }),
            );
            let req = ConnectRequest::basic("cl1", "user", Some(token));
            let verdict = validator(&public_pem).authenticate(&req).await.unwrap();
            assert!(!verdict.authenticated);
        }

        #[tokio::test]
        async fn test_non_token_password_falls_through() {
            let (_, public_pem) = keypair();
            let req = ConnectRequest::basic("cl1", "user", Some("s3cr3t".to_string()));
            assert!(validator(&public_pem).authenticate(&req).await.is_none());
        }
    }
}
