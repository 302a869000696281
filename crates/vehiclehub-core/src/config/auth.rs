//! Credential validation configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by the credential validators and the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Usernames allowed to authenticate with the static password.
    #[serde(default)]
    pub whitelisted_users: Vec<String>,
    /// Synthetic load-test user, also accepted against the static password.
    #[serde(default = "default_perf_user")]
    pub perf_test_user: String,
    /// The one static password for whitelisted users.
    #[serde(default = "default_static_password")]
    pub static_password: String,
    /// PEM-encoded RSA public key used to verify signed tokens.
    #[serde(default)]
    pub token_public_key_pem: String,
    /// Scopes a token must overlap with to be accepted.
    #[serde(default)]
    pub valid_scopes: Vec<String>,
    /// Uppercased CN prefix identifying service certificates.
    #[serde(default = "default_service_cn_prefix")]
    pub service_cn_prefix: String,
    /// Whitelisted service CNs (without the prefix).
    #[serde(default)]
    pub whitelisted_service_cns: Vec<String>,
    /// Maximum wall-clock time for one authentication attempt in seconds.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u64,
    /// Maximum number of concurrently running authentication attempts.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_auth: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            whitelisted_users: Vec::new(),
            perf_test_user: default_perf_user(),
            static_password: default_static_password(),
            token_public_key_pem: String::new(),
            valid_scopes: Vec::new(),
            service_cn_prefix: default_service_cn_prefix(),
            whitelisted_service_cns: Vec::new(),
            auth_timeout_seconds: default_auth_timeout(),
            max_concurrent_auth: default_max_concurrent(),
        }
    }
}

fn default_perf_user() -> String {
    "perf_test_user".to_string()
}

fn default_static_password() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_service_cn_prefix() -> String {
    "SER-".to_string()
}

fn default_auth_timeout() -> u64 {
    10
}

fn default_max_concurrent() -> usize {
    32
}
