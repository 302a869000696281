//! Domain events emitted by the extension.

pub mod device;

pub use device::DeviceEvent;
