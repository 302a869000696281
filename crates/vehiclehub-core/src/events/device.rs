//! Device lifecycle events sent to the platform sink.

use serde::{Deserialize, Serialize};

/// Events describing a device's connection lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceEvent {
    /// A device passed authentication and is online.
    Online {
        /// The MQTT client identifier.
        client_id: String,
        /// The username presented on connect.
        user_name: String,
        /// Epoch seconds when the connect was accepted.
        timestamp: i64,
    },
    /// A device's last connection went away.
    Offline {
        /// The MQTT client identifier.
        client_id: String,
        /// The vehicle the device was bound to, if resolved.
        vehicle_id: Option<String>,
        /// Epoch seconds when the disconnect was processed.
        timestamp: i64,
    },
}

impl DeviceEvent {
    /// The client this event is about.
    pub fn client_id(&self) -> &str {
        match self {
            Self::Online { client_id, .. } | Self::Offline { client_id, .. } => client_id,
        }
    }
}
