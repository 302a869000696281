//! # vehiclehub-topic
//!
//! Pure topic-string transforms for the VehicleHub gateway: building
//! publish/subscribe/user topics from prefixes and route infixes, reverse
//! parsing incoming topics into device/service/route, and the read-only
//! service catalog.

pub mod catalog;
pub mod formatter;
pub mod parser;

pub use catalog::{ServiceCatalog, ServiceMapping};
pub use formatter::TopicFormatter;
pub use parser::{ParsedTopic, Route, TopicParser};
