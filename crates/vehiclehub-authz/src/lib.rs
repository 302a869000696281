//! # vehiclehub-authz
//!
//! The topic permission engine: classifies connected clients
//! (whitelisted service, portal user, device) and computes the ordered
//! topic-permission list the broker enforces, cached per clientId until
//! disconnect.

pub mod cache;
pub mod engine;

pub use cache::PermissionCache;
pub use engine::TopicAuthorizer;
