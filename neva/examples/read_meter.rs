//! Read registers by raw address
//!
//! METER_URL=socket://10.0.0.5:5000 cargo run --example read_meter -- 200800FF 000902FF

use std::sync::Arc;

use neva::{Address, AddressRegistry, MeterConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neva=debug".into()),
        )
        .init();

    let url = std::env::var("METER_URL").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());
    let password = std::env::var("METER_PASSWORD").unwrap_or_else(|_| "00000000".to_string());

    let addresses = std::env::args()
        .skip(1)
        .map(Address::new)
        .collect::<Result<Vec<_>, _>>()?;

    println!("Connecting to {}...", url);

    let config = MeterConfig::new(url).with_password(password);
    let mut meter = neva::Meter::new(config, Arc::new(AddressRegistry::new()))?;

    let identity = meter.connect().await?;
    println!("✓ Meter: {}", identity.value);
    for advisory in &identity.advisories {
        println!("! {}", advisory);
    }

    for address in &addresses {
        let reading = meter.read(address).await?;
        match reading.value {
            Some(value) => println!("{} = {}", address, value),
            None => println!("{} not supported", address),
        }
    }

    meter.close().await?;
    println!("✓ Disconnected");

    Ok(())
}
