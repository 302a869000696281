//! # vehiclehub-core
//!
//! Core crate for Suzuki VehicleHub. Contains traits, configuration schemas,
//! the flat config store, domain events, shared identity/permission types,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other VehicleHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
