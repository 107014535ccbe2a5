//! Address command implementation

use anyhow::{Context, Result};

use netdev_core::IpPrefix;
use netdev_device::NetdevManager;
use netdev_namespace::NetnsConfig;

use crate::cli::DeviceArgs;

use super::open_device;

pub fn execute(config: NetnsConfig, args: &DeviceArgs, prefix: IpPrefix) -> Result<()> {
    let manager = NetdevManager::system(config);
    let dev = open_device(&manager, args)?;
    let dev_name = dev.dev_name().unwrap_or_default().to_string();

    dev.add_address(prefix.addr(), prefix.prefix_len())
        .with_context(|| format!("Failed to add address {prefix} to {dev_name}"))?;

    println!("✅ Added {prefix} to {dev_name}");
    Ok(())
}
