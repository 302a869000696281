//! Suzuki VehicleHub — MQTT security and session-state extension
//!
//! The broker-facing surface of the VehicleHub gateway: wires the
//! credential chain, session manager, permission engine and trackers
//! together, runs authentication on a bounded worker pool with an
//! enforced timeout, and exposes the connect/disconnect/subscribe entry
//! points the hosting broker calls into.

pub mod logging;
pub mod pipeline;

pub use pipeline::{ConnectOutcome, GatewayPipeline, RejectReason};

pub use vehiclehub_auth::{AuthenticationChain, ConnectRequest, TlsInfo};
pub use vehiclehub_core::config::{ConfigStore, GatewayConfig};
pub use vehiclehub_core::error::{AppError, ErrorKind};
pub use vehiclehub_core::result::AppResult;
pub use vehiclehub_core::traits::{EventSink, ProfileSource, SessionControl, SinkTopic};
pub use vehiclehub_core::types::{
    Activity, ClientClass, ClientIdentity, CredentialVerdict, PermissionType, Qos, TopicPermission,
    VehicleProfile,
};
pub use vehiclehub_session::{
    DeviceSubscription, HttpProfileSource, ReleaseOutcome, SubscriptionRegistry,
};
pub use vehiclehub_topic::{
    ParsedTopic, Route, ServiceCatalog, ServiceMapping, TopicFormatter, TopicParser,
};
