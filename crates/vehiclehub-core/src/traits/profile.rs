//! Vehicle profile lookup trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::VehicleProfile;

/// Trait for resolving a device's vehicle profile.
///
/// The production implementation calls the platform's HTTP lookup
/// service; tests substitute an in-memory source.
#[async_trait]
pub trait ProfileSource: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve the profile for a device. `Ok(None)` means the platform
    /// does not know the device; transport errors are `Err` and mapped to
    /// "vehicle details not found" by the session layer.
    async fn lookup(&self, client_id: &str) -> AppResult<Option<VehicleProfile>>;
}
