//! Extension configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Dynamic, key-shaped configuration (per-device-type topic
//! lists) lives in the flat [`store::ConfigStore`] instead.

pub mod auth;
pub mod logging;
pub mod lookup;
pub mod session;
pub mod store;
pub mod topics;

use serde::{Deserialize, Serialize};

use self::auth::AuthConfig;
use self::logging::LoggingConfig;
use self::lookup::LookupConfig;
use self::session::SessionConfig;
use self::topics::TopicConfig;

use crate::error::AppError;

pub use self::store::ConfigStore;

/// Root extension configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Credential validation settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Topic prefixes, infixes and static topic lists.
    #[serde(default)]
    pub topics: TopicConfig,
    /// Session tracking settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Vehicle profile lookup settings.
    #[serde(default)]
    pub lookup: LookupConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific
    /// overlay and environment variables prefixed with `VEHICLEHUB`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("VEHICLEHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
