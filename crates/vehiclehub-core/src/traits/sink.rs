//! Message sink trait for forwarding events out of the broker.

use async_trait::async_trait;

use crate::result::AppResult;

/// Which downstream topic family a sink message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkTopic {
    /// Device online/offline status messages.
    DeviceStatus,
    /// Regular device telemetry.
    Telemetry,
}

/// Trait for the host-provided message sink.
///
/// The sink transports authenticated traffic and lifecycle events to the
/// platform backend. Delivery failures are the sink's problem; callers
/// log and continue.
#[async_trait]
pub trait EventSink: Send + Sync + std::fmt::Debug + 'static {
    /// Send a keyed payload to the sink on the given topic family.
    async fn send_to_sink(&self, key: &str, payload: &str, topic: SinkTopic) -> AppResult<()>;
}
