//! # vehiclehub-auth
//!
//! Credential validation for the VehicleHub gateway: the shared-secret,
//! signed-token and certificate validators behind one capability trait,
//! and the ordered authentication chain that coordinates them.

pub mod chain;
pub mod request;
pub mod validators;

pub use chain::AuthenticationChain;
pub use request::{ConnectRequest, TlsInfo};
pub use validators::CredentialValidator;
