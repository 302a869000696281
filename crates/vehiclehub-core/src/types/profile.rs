//! Vehicle profile as resolved by the external lookup service.

use serde::{Deserialize, Serialize};

/// Profile attributes of a device as known to the vehicle platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleProfile {
    /// The vehicle identifier the device is bound to, if any.
    #[serde(rename = "vehicleId")]
    pub vehicle_id: Option<String>,
    /// The device hardware type, if known.
    #[serde(rename = "deviceType")]
    pub device_type: Option<String>,
    /// Which platform generation the vehicle is connected through.
    #[serde(rename = "connectedPlatform")]
    pub connected_platform: Option<String>,
}

impl VehicleProfile {
    /// Whether the lookup resolved an actual vehicle binding.
    pub fn has_vehicle(&self) -> bool {
        self.vehicle_id.as_deref().is_some_and(|v| !v.is_empty())
    }
}
