//! Client identity derived per connect attempt.

use serde::{Deserialize, Serialize};

/// How a connecting client is classified for permission purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientClass {
    /// A vehicle ECU connecting with its device credentials.
    Device,
    /// A human/operator identity (single-token username).
    PortalUser,
    /// A backend service exempt from profile resolution and expiry tracking.
    WhitelistedService,
}

/// Identity of a connecting client, derived once per connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// The MQTT client identifier.
    pub client_id: String,
    /// The MQTT username.
    pub user_name: String,
    /// The derived classification.
    pub class: ClientClass,
}

impl ClientIdentity {
    /// Creates a new identity.
    pub fn new(client_id: impl Into<String>, user_name: impl Into<String>, class: ClientClass) -> Self {
        Self {
            client_id: client_id.into(),
            user_name: user_name.into(),
            class,
        }
    }

    /// Whether this identity is exempt from profile resolution and expiry
    /// tracking.
    pub fn is_whitelisted(&self) -> bool {
        self.class == ClientClass::WhitelistedService
    }
}
