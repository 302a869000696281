//! # vehiclehub-session
//!
//! Per-client session state for the VehicleHub gateway: the device
//! subscription registry (the system's only significant shared mutable
//! state), the session expiry tracker driving proactive forced
//! disconnects, the vehicle-profile HTTP client, and the post-auth
//! session manager that ties them together.

pub mod expiry;
pub mod manager;
pub mod profile;
pub mod registry;

pub use expiry::SessionExpiryTracker;
pub use manager::{SessionManager, SessionOutcome};
pub use profile::HttpProfileSource;
pub use registry::{DeviceSubscription, ReleaseOutcome, SubscriptionRegistry};
