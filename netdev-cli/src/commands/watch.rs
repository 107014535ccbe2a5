//! Watch command implementation
//!
//! Polls the interface on a timer and prints every change reported through
//! the device callbacks.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use netdev_device::{Netdev, NetdevManager};
use netdev_namespace::NetnsConfig;

use crate::cli::DeviceArgs;

use super::open_device;

pub async fn execute(
    config: NetnsConfig,
    args: &DeviceArgs,
    interval_secs: u64,
    count: Option<u64>,
) -> Result<()> {
    if interval_secs == 0 {
        anyhow::bail!("Interval must be at least 1 second");
    }

    let manager = NetdevManager::system(config);
    let mut dev = open_device(&manager, args)?;

    dev.set_ifupdown_callback(Some(Box::new(|dev: &Netdev, up: bool| {
        println!(
            "{}: {}",
            dev.dev_name().unwrap_or_default(),
            if up { "UP" } else { "DOWN" }
        );
    })));
    dev.set_dev_name_callback(Some(Box::new(|dev: &Netdev, new_name: &str| {
        println!(
            "{}: renamed to {new_name}",
            dev.dev_name().unwrap_or_default()
        );
    })));
    dev.set_mtu_callback(Some(Box::new(|dev: &Netdev, mtu: u32| {
        println!("{}: mtu {mtu}", dev.dev_name().unwrap_or_default());
    })));

    info!(
        dev = %dev.dev_name().unwrap_or_default(),
        interval = interval_secs,
        "Watching interface (Ctrl-C to stop)"
    );

    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut polls = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                dev.refresh_link_state()
                    .context("Failed to read link state")?;
                polls += 1;

                if count.is_some_and(|limit| polls >= limit) {
                    debug!(polls, "Poll limit reached");
                    break;
                }
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted, stopping");
                break;
            }
        }
    }

    dev.unregister()?;
    Ok(())
}
