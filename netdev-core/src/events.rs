//! Network device lifecycle events with structured tracing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use crate::IfIndex;

/// Events emitted during the lifecycle of a managed network device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetdevEvent {
    /// Device bound to a kernel interface
    Registered {
        /// Identifying name of the device object
        device: String,
        /// Interface name resolved at registration
        dev_name: String,
        /// Interface index
        ifindex: IfIndex,
        /// Namespace name (empty for the default namespace)
        netns: String,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Device released its kernel interface
    Unregistered {
        /// Identifying name of the device object
        device: String,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Administrative up/down state changed
    LinkUpDown {
        /// Identifying name of the device object
        device: String,
        /// New state
        up: bool,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Interface renamed by the system
    Renamed {
        /// Identifying name of the device object
        device: String,
        /// Previous interface name
        old_name: String,
        /// New interface name
        new_name: String,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Interface MTU changed
    MtuChanged {
        /// Identifying name of the device object
        device: String,
        /// New MTU
        mtu: u32,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },
}

impl NetdevEvent {
    /// Get the device name from any event
    #[must_use]
    pub fn device(&self) -> &str {
        match self {
            Self::Registered { device, .. }
            | Self::Unregistered { device, .. }
            | Self::LinkUpDown { device, .. }
            | Self::Renamed { device, .. }
            | Self::MtuChanged { device, .. } => device,
        }
    }

    /// Get the timestamp from any event
    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        match self {
            Self::Registered { timestamp, .. }
            | Self::Unregistered { timestamp, .. }
            | Self::LinkUpDown { timestamp, .. }
            | Self::Renamed { timestamp, .. }
            | Self::MtuChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Emit structured tracing event
    pub fn emit_trace(&self) {
        match self {
            Self::Registered {
                device,
                dev_name,
                ifindex,
                netns,
                ..
            } => {
                tracing::info!(
                    netdev = %device,
                    dev = %dev_name,
                    ifindex = ifindex.as_raw(),
                    netns = %netns,
                    event = "registered",
                    "Device registered"
                );
            }
            Self::Unregistered { device, .. } => {
                tracing::info!(netdev = %device, event = "unregistered", "Device unregistered");
            }
            Self::LinkUpDown { device, up, .. } => {
                tracing::info!(
                    netdev = %device,
                    up,
                    event = "link_up_down",
                    "Link state changed"
                );
            }
            Self::Renamed {
                device,
                old_name,
                new_name,
                ..
            } => {
                tracing::info!(
                    netdev = %device,
                    old_name = %old_name,
                    new_name = %new_name,
                    event = "renamed",
                    "Interface renamed"
                );
            }
            Self::MtuChanged { device, mtu, .. } => {
                tracing::info!(netdev = %device, mtu, event = "mtu_changed", "MTU changed");
            }
        }
    }
}

impl fmt::Display for NetdevEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered {
                device,
                dev_name,
                ifindex,
                ..
            } => write!(f, "Device {device} registered on {dev_name} (ifindex {ifindex})"),
            Self::Unregistered { device, .. } => write!(f, "Device {device} unregistered"),
            Self::LinkUpDown { device, up, .. } => {
                write!(f, "Device {device} is {}", if *up { "UP" } else { "DOWN" })
            }
            Self::Renamed {
                device,
                old_name,
                new_name,
                ..
            } => write!(f, "Device {device} renamed {old_name} -> {new_name}"),
            Self::MtuChanged { device, mtu, .. } => write!(f, "Device {device} MTU is {mtu}"),
        }
    }
}

// Custom SystemTime serialization
mod systemtime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(since_epoch.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + std::time::Duration::from_secs(secs))
    }
}
