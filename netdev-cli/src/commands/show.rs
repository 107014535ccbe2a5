//! Show command implementation

use anyhow::{Context, Result};
use serde::Serialize;

use netdev_core::IfIndex;
use netdev_device::NetdevManager;
use netdev_namespace::NetnsConfig;

use crate::cli::DeviceArgs;

use super::open_device;

#[derive(Debug, Serialize)]
struct DeviceReport {
    ifindex: IfIndex,
    netns: String,
    dev_name: String,
    up: Option<bool>,
    mtu: Option<u32>,
}

pub fn execute(config: NetnsConfig, args: &DeviceArgs, json: bool) -> Result<()> {
    let manager = NetdevManager::system(config);
    let mut dev = open_device(&manager, args)?;

    dev.refresh_link_state()
        .context("Failed to read link state")?;

    let report = DeviceReport {
        ifindex: dev.ifindex(),
        netns: dev.netns_name().unwrap_or_default().to_string(),
        dev_name: dev.dev_name().unwrap_or_default().to_string(),
        up: dev.if_up(),
        mtu: dev.mtu(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let state = match report.up {
        Some(true) => "UP",
        Some(false) => "DOWN",
        None => "UNKNOWN",
    };

    println!("\n🔌 Interface {} ({})", report.ifindex, report.dev_name);
    println!("{:-<60}", "");
    println!(
        "Namespace:  {}",
        if report.netns.is_empty() { "(current)" } else { report.netns.as_str() }
    );
    println!("State:      {state}");
    match report.mtu {
        Some(mtu) => println!("MTU:        {mtu}"),
        None => println!("MTU:        unknown"),
    }
    println!("{:-<60}", "");

    Ok(())
}
