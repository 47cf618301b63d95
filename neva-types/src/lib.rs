//! Type definitions for neva

pub mod address;
pub mod error;
pub mod meter_info;
pub mod timestamp;

pub use address::{Address, AddressRange, AddressRegistry, AddressTable, Binding};
pub use error::{Error, Result};
pub use meter_info::MeterInfo;
