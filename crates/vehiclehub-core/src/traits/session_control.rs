//! Broker session control trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for the host broker's session control surface.
///
/// Used to force-disconnect clients whose credentials have expired and to
/// query liveness during status reporting.
#[async_trait]
pub trait SessionControl: Send + Sync + std::fmt::Debug + 'static {
    /// Forcefully disconnect the client, optionally suppressing its
    /// last-will message. Returns whether a session was actually present.
    async fn disconnect_client(&self, client_id: &str, suppress_last_will: bool)
    -> AppResult<bool>;

    /// Whether the broker currently holds a live session for the client.
    async fn is_client_connected(&self, client_id: &str) -> AppResult<bool>;
}
