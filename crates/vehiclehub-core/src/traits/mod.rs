//! Core traits defined in `vehiclehub-core` and implemented elsewhere —
//! by other VehicleHub crates or by the hosting broker.

pub mod profile;
pub mod session_control;
pub mod sink;

pub use profile::ProfileSource;
pub use session_control::SessionControl;
pub use sink::{EventSink, SinkTopic};
