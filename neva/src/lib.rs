//! # neva
//!
//! Rust implementation of the IEC 62056-21 style protocol spoken by NEVA
//! electricity meters.
//!
//! ## Features
//!
//! - Async/await API using Tokio
//! - Serial ports and transparent serial-to-TCP bridges
//! - Per-model address tables with aliases and register ranges
//! - Degraded readings reported as advisories instead of errors
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use neva::{Address, AddressRegistry, AddressTable, MeterConfig};
//!
//! #[tokio::main]
//! async fn main() -> neva::Result<()> {
//!     let mut registry = AddressRegistry::new();
//!     registry.register(
//!         "MT174",
//!         AddressTable::new()
//!             .with_register("voltage", Address::new("200800FF")?)
//!             .with_register("date", Address::new("000902FF")?),
//!     );
//!
//!     // Connect and authenticate
//!     let config = MeterConfig::new("/dev/ttyUSB0");
//!     let mut meter = neva::connect(config, Arc::new(registry)).await?;
//!
//!     let voltage = meter.read("voltage").await?;
//!     println!("{:?}", voltage.value);
//!
//!     // Disconnect
//!     meter.close().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod meter;
pub mod outcome;

#[cfg(test)]
mod testing;

use std::sync::Arc;

// Re-exports
pub use config::MeterConfig;
pub use connection::Connection;
pub use error::{Error, Result};
pub use meter::{Meter, Target};
pub use outcome::{Advisory, Outcome};

// Re-export types
pub use neva_core::{Command, Response, SessionState, Value};
pub use neva_transport::{DataBits, LinkSettings, Parity, StopBits, Transport};
pub use neva_types::{
    timestamp, Address, AddressRange, AddressRegistry, AddressTable, Binding, MeterInfo,
};

/// Open a session and run the handshake
///
/// Advisories raised during the handshake are logged; use
/// [`Meter::connect`] directly to inspect them.
pub async fn connect(config: MeterConfig, registry: Arc<AddressRegistry>) -> Result<Meter> {
    let mut meter = Meter::new(config, registry)?;

    if let Err(e) = meter.connect().await {
        if let Err(close_err) = meter.close().await {
            tracing::warn!("Failed to close after handshake error: {}", close_err);
        }
        return Err(e);
    }

    Ok(meter)
}
