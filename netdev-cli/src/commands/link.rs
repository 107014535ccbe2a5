//! Up/down command implementation

use anyhow::{Context, Result};

use netdev_device::NetdevManager;
use netdev_namespace::NetnsConfig;

use crate::cli::DeviceArgs;

use super::open_device;

pub fn execute(config: NetnsConfig, args: &DeviceArgs, up: bool) -> Result<()> {
    let state = if up { "up" } else { "down" };
    let manager = NetdevManager::system(config);
    let dev = open_device(&manager, args)?;

    dev.bring_up_down(up)
        .with_context(|| format!("Failed to bring {} {state}", dev.dev_name().unwrap_or_default()))?;

    println!("✅ {} is {state}", dev.dev_name().unwrap_or_default());
    Ok(())
}
