//! Route command implementation

use anyhow::{Context, Result};
use std::net::IpAddr;

use netdev_core::IpPrefix;
use netdev_device::NetdevManager;
use netdev_namespace::NetnsConfig;

use crate::cli::DeviceArgs;

use super::open_device;

pub fn execute(
    config: NetnsConfig,
    args: &DeviceArgs,
    destination: IpPrefix,
    via: Option<IpAddr>,
) -> Result<()> {
    let manager = NetdevManager::system(config);
    let dev = open_device(&manager, args)?;
    let dev_name = dev.dev_name().unwrap_or_default().to_string();

    dev.add_route(destination.addr(), destination.prefix_len(), via)
        .with_context(|| format!("Failed to add route {destination} dev {dev_name}"))?;

    match via {
        Some(gw) => println!("✅ Added route {destination} via {gw} dev {dev_name}"),
        None => println!("✅ Added route {destination} dev {dev_name}"),
    }
    Ok(())
}
