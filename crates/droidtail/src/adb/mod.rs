pub mod client;
pub mod error;

pub use client::{AdbClient, DeviceInfo, DeviceState};
pub use error::AdbError;
