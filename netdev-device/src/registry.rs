//! Bookkeeping of live device objects

use std::collections::BTreeMap;
use std::fmt;

use netdev_core::IfIndex;

/// Identifier of a device object within one [`DeviceRegistry`]
///
/// Ids are handed out in increasing order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Get the raw id
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the registry knows about one device object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Identifying name of the device object
    pub name: String,
    /// `(namespace, ifindex)` while registered
    pub binding: Option<(String, IfIndex)>,
}

/// Live device objects in creation order
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    next_id: u64,
    devices: BTreeMap<DeviceId, DeviceRecord>,
}

impl DeviceRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new, unbound device object
    pub fn insert(&mut self, name: impl Into<String>) -> DeviceId {
        let id = DeviceId(self.next_id);
        self.next_id += 1;

        self.devices.insert(
            id,
            DeviceRecord {
                name: name.into(),
                binding: None,
            },
        );
        id
    }

    /// Stop tracking a device object
    pub fn remove(&mut self, id: DeviceId) -> Option<DeviceRecord> {
        self.devices.remove(&id)
    }

    /// Look up a device record
    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&DeviceRecord> {
        self.devices.get(&id)
    }

    /// Record that `id` is now bound to `ifindex` in `netns`
    pub fn bind(&mut self, id: DeviceId, netns: impl Into<String>, ifindex: IfIndex) {
        if let Some(record) = self.devices.get_mut(&id) {
            record.binding = Some((netns.into(), ifindex));
        }
    }

    /// Clear the binding of `id`
    pub fn unbind(&mut self, id: DeviceId) {
        if let Some(record) = self.devices.get_mut(&id) {
            record.binding = None;
        }
    }

    /// Devices currently bound to `ifindex` in `netns`
    #[must_use]
    pub fn bindings_of(&self, netns: &str, ifindex: IfIndex) -> Vec<DeviceId> {
        self.devices
            .iter()
            .filter(|(_, record)| {
                record
                    .binding
                    .as_ref()
                    .is_some_and(|(ns, idx)| ns == netns && *idx == ifindex)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Names of all live devices, oldest first
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.devices.values().map(|record| record.name.clone()).collect()
    }

    /// Number of live devices
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if no devices are live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
