use anyhow::{Context, Result};
use std::path::PathBuf;

use netdev_device::{Netdev, NetdevManager};
use netdev_namespace::NetnsConfig;

use crate::cli::{AddrCommands, Cli, Commands, DeviceArgs, RouteCommands};

pub mod addr;
pub mod link;
pub mod namespaces;
pub mod route;
pub mod show;
pub mod version;
pub mod watch;

/// Dispatch command to appropriate handler
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = netns_config(cli.netns_dir);

    match cli.command {
        Commands::Show { device, json } => show::execute(config, &device, json),

        Commands::Up { device } => link::execute(config, &device, true),

        Commands::Down { device } => link::execute(config, &device, false),

        Commands::Addr {
            command: AddrCommands::Add { device, prefix },
        } => addr::execute(config, &device, prefix),

        Commands::Route {
            command:
                RouteCommands::Add {
                    device,
                    destination,
                    via,
                },
        } => route::execute(config, &device, destination, via),

        Commands::Watch {
            device,
            interval,
            count,
        } => watch::execute(config, &device, interval, count).await,

        Commands::Namespaces => namespaces::execute(config),

        Commands::Version => {
            version::print();
            Ok(())
        }
    }
}

fn netns_config(netns_dir: Option<PathBuf>) -> NetnsConfig {
    match netns_dir {
        Some(dir) => NetnsConfig::new().with_run_dir(dir),
        None => NetnsConfig::new(),
    }
}

/// Allocate and register a device for the selected interface
pub fn open_device(manager: &NetdevManager, args: &DeviceArgs) -> Result<Netdev> {
    let name = match &args.netns {
        Some(netns) => format!("{netns}/{}", args.ifindex),
        None => args.ifindex.to_string(),
    };

    let mut dev = manager.alloc(name);
    dev.set_ifindex(args.ifindex)?;
    dev.set_netns_name(args.netns.as_deref())?;

    dev.register().with_context(|| {
        format!(
            "Failed to register interface {} in {}",
            args.ifindex,
            describe_netns(args.netns.as_deref())
        )
    })?;

    Ok(dev)
}

fn describe_netns(netns: Option<&str>) -> String {
    match netns {
        Some(name) if !name.is_empty() => format!("netns '{name}'"),
        _ => "the current netns".to_string(),
    }
}
