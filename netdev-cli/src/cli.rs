//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use netdev_core::IpPrefix;

#[derive(Parser)]
#[command(name = "netdev")]
#[command(about = "Namespace-aware network interface manager", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding named network namespaces
    #[arg(long, global = true, value_name = "DIR")]
    pub netns_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Interface selection shared by all device commands
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Interface index
    #[arg(short, long)]
    pub ifindex: u32,

    /// Network namespace holding the interface (default: current)
    #[arg(short, long)]
    pub netns: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show interface name and state
    Show {
        #[command(flatten)]
        device: DeviceArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bring an interface up
    Up {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Bring an interface down
    Down {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Manage interface addresses
    Addr {
        #[command(subcommand)]
        command: AddrCommands,
    },

    /// Manage routes through an interface
    Route {
        #[command(subcommand)]
        command: RouteCommands,
    },

    /// Poll an interface and report changes
    Watch {
        #[command(flatten)]
        device: DeviceArgs,

        /// Poll interval in seconds
        #[arg(long, default_value = "1")]
        interval: u64,

        /// Stop after this many polls (default: until Ctrl-C)
        #[arg(long)]
        count: Option<u64>,
    },

    /// List named network namespaces
    Namespaces,

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum AddrCommands {
    /// Add an address, e.g. 10.45.0.1/16
    Add {
        #[command(flatten)]
        device: DeviceArgs,

        /// Address with optional prefix length
        prefix: IpPrefix,
    },
}

#[derive(Subcommand)]
pub enum RouteCommands {
    /// Add a route, e.g. 0.0.0.0/0 --via 10.45.0.254
    Add {
        #[command(flatten)]
        device: DeviceArgs,

        /// Destination with optional prefix length
        destination: IpPrefix,

        /// Gateway (default: direct route)
        #[arg(long)]
        via: Option<std::net::IpAddr>,
    },
}
