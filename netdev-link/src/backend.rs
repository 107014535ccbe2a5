//! Link-control trait for pluggable implementations

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::net::IpAddr;
use std::rc::Rc;

use netdev_core::{Error, IfIndex, Result};

/// Trait for link-control backends
///
/// Every call assumes the calling thread already runs inside the namespace
/// holding the interface. Implementations:
/// - [`SystemLinkControl`](crate::SystemLinkControl) - kernel queries on the current namespace
/// - [`MockLinkControl`] - Testing with in-memory links
pub trait LinkControl {
    /// Resolve an interface index to the current interface name
    ///
    /// # Errors
    /// Returns [`Error::NoSuchDevice`] if no interface has this index
    fn resolve_name(&self, ifindex: IfIndex) -> Result<String>;

    /// Read the administrative state and MTU of an interface
    fn link_state(&self, dev_name: &str) -> Result<LinkState>;

    /// Bring an interface up or down
    fn set_up(&self, dev_name: &str, up: bool) -> Result<()>;

    /// Add a local address to an interface
    fn add_address(&self, dev_name: &str, addr: IpAddr, prefix_len: u8) -> Result<()>;

    /// Add a route through an interface; no gateway means a direct route
    fn add_route(
        &self,
        dev_name: &str,
        dst: IpAddr,
        prefix_len: u8,
        gateway: Option<IpAddr>,
    ) -> Result<()>;
}

/// Observed interface state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkState {
    /// Whether the interface is administratively up
    pub up: bool,
    /// Configured MTU
    pub mtu: u32,
}

/// A call recorded by [`MockLinkControl`], with the namespace it ran in
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum LinkCall {
    ResolveName {
        netns: String,
        ifindex: IfIndex,
    },
    LinkState {
        netns: String,
        dev_name: String,
    },
    SetUp {
        netns: String,
        dev_name: String,
        up: bool,
    },
    AddAddress {
        netns: String,
        dev_name: String,
        addr: IpAddr,
        prefix_len: u8,
    },
    AddRoute {
        netns: String,
        dev_name: String,
        dst: IpAddr,
        prefix_len: u8,
        gateway: Option<IpAddr>,
    },
}

impl LinkCall {
    /// Namespace the call ran in; empty for the default namespace
    #[must_use]
    pub fn netns(&self) -> &str {
        match self {
            Self::ResolveName { netns, .. }
            | Self::LinkState { netns, .. }
            | Self::SetUp { netns, .. }
            | Self::AddAddress { netns, .. }
            | Self::AddRoute { netns, .. } => netns,
        }
    }
}

/// In-memory interface held by [`MockLinkControl`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockLink {
    /// Interface name
    pub name: String,
    /// Administrative state
    pub up: bool,
    /// MTU
    pub mtu: u32,
    /// Addresses added through [`LinkControl::add_address`]
    pub addresses: Vec<(IpAddr, u8)>,
    /// Routes added through [`LinkControl::add_route`]
    pub routes: Vec<(IpAddr, u8, Option<IpAddr>)>,
}

impl MockLink {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            up: false,
            mtu: 1500,
            addresses: Vec::new(),
            routes: Vec::new(),
        }
    }
}

/// Mock link-control for testing (doesn't touch the kernel)
///
/// Links are keyed by `(namespace, ifindex)`. The namespace a call runs in is
/// taken from the namespace probe, which tests wire to their mock namespace
/// provider. Mutations fail with [`Error::Unsupported`] unless enabled with
/// [`with_mutations`](Self::with_mutations).
///
/// # Example
/// ```
/// use netdev_core::IfIndex;
/// use netdev_link::{LinkControl, MockLinkControl};
///
/// let link = MockLinkControl::new().with_link("", 1, "lo");
///
/// assert_eq!(link.resolve_name(IfIndex::from_raw(1)).unwrap(), "lo");
/// assert!(link.resolve_name(IfIndex::from_raw(2)).is_err());
/// assert!(link.set_up("lo", true).is_err());
/// ```
#[derive(Clone)]
pub struct MockLinkControl {
    state: Rc<RefCell<MockState>>,
    probe: Rc<dyn Fn() -> String>,
}

#[derive(Default)]
struct MockState {
    links: HashMap<(String, u32), MockLink>,
    calls: Vec<LinkCall>,
    mutations: bool,
}

impl MockState {
    fn find_mut(&mut self, netns: &str, dev_name: &str) -> Option<&mut MockLink> {
        self.links
            .iter_mut()
            .find(|((ns, _), link)| ns == netns && link.name == dev_name)
            .map(|(_, link)| link)
    }
}

impl MockLinkControl {
    /// Create a new mock with no links, running everything in the default
    /// namespace
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::default())),
            probe: Rc::new(String::new),
        }
    }

    /// Add a link in `netns` (empty for default)
    #[must_use]
    pub fn with_link(self, netns: impl Into<String>, ifindex: u32, name: impl Into<String>) -> Self {
        self.state
            .borrow_mut()
            .links
            .insert((netns.into(), ifindex), MockLink::new(name));
        self
    }

    /// Report the namespace each call runs in
    #[must_use]
    pub fn with_namespace_probe(mut self, probe: impl Fn() -> String + 'static) -> Self {
        self.probe = Rc::new(probe);
        self
    }

    /// Enable or disable mutations (up/down, addresses, routes)
    #[must_use]
    pub fn with_mutations(self, enable: bool) -> Self {
        self.state.borrow_mut().mutations = enable;
        self
    }

    /// Rename a link, as the system would
    pub fn rename_link(&self, netns: &str, ifindex: u32, name: impl Into<String>) {
        if let Some(link) = self.state.borrow_mut().links.get_mut(&(netns.to_string(), ifindex)) {
            link.name = name.into();
        }
    }

    /// Change the observed state of a link
    pub fn set_link_state(&self, netns: &str, ifindex: u32, up: bool, mtu: u32) {
        if let Some(link) = self.state.borrow_mut().links.get_mut(&(netns.to_string(), ifindex)) {
            link.up = up;
            link.mtu = mtu;
        }
    }

    /// Remove a link, as if the interface was deleted
    pub fn remove_link(&self, netns: &str, ifindex: u32) {
        self.state.borrow_mut().links.remove(&(netns.to_string(), ifindex));
    }

    /// Snapshot of a link (for testing)
    #[must_use]
    pub fn link(&self, netns: &str, ifindex: u32) -> Option<MockLink> {
        self.state
            .borrow()
            .links
            .get(&(netns.to_string(), ifindex))
            .cloned()
    }

    /// All calls made so far (for testing)
    #[must_use]
    pub fn calls(&self) -> Vec<LinkCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of calls made so far (for testing)
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    fn record(&self, call: LinkCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn mutate(
        &self,
        operation: &str,
        netns: &str,
        dev_name: &str,
        apply: impl FnOnce(&mut MockLink),
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();

        if !state.mutations {
            return Err(Error::Unsupported {
                operation: operation.to_string(),
            });
        }

        let link = state
            .find_mut(netns, dev_name)
            .ok_or_else(|| Error::LinkControl {
                operation: operation.to_string(),
                message: format!("No such device: {dev_name}"),
            })?;
        apply(link);

        tracing::debug!(netns = %netns, dev = %dev_name, operation, "Mock: Applied mutation");
        Ok(())
    }
}

impl Default for MockLinkControl {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockLinkControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLinkControl").finish_non_exhaustive()
    }
}

impl LinkControl for MockLinkControl {
    fn resolve_name(&self, ifindex: IfIndex) -> Result<String> {
        let netns = (self.probe)();
        self.record(LinkCall::ResolveName {
            netns: netns.clone(),
            ifindex,
        });

        self.state
            .borrow()
            .links
            .get(&(netns, ifindex.as_raw()))
            .map(|link| link.name.clone())
            .ok_or(Error::NoSuchDevice {
                ifindex: ifindex.as_raw(),
            })
    }

    fn link_state(&self, dev_name: &str) -> Result<LinkState> {
        let netns = (self.probe)();
        self.record(LinkCall::LinkState {
            netns: netns.clone(),
            dev_name: dev_name.to_string(),
        });

        let mut state = self.state.borrow_mut();
        let link = state
            .find_mut(&netns, dev_name)
            .ok_or_else(|| Error::LinkControl {
                operation: "link_state".to_string(),
                message: format!("No such device: {dev_name}"),
            })?;

        Ok(LinkState {
            up: link.up,
            mtu: link.mtu,
        })
    }

    fn set_up(&self, dev_name: &str, up: bool) -> Result<()> {
        let netns = (self.probe)();
        self.record(LinkCall::SetUp {
            netns: netns.clone(),
            dev_name: dev_name.to_string(),
            up,
        });

        self.mutate("set_up", &netns, dev_name, |link| link.up = up)
    }

    fn add_address(&self, dev_name: &str, addr: IpAddr, prefix_len: u8) -> Result<()> {
        let netns = (self.probe)();
        self.record(LinkCall::AddAddress {
            netns: netns.clone(),
            dev_name: dev_name.to_string(),
            addr,
            prefix_len,
        });

        self.mutate("add_address", &netns, dev_name, |link| {
            link.addresses.push((addr, prefix_len));
        })
    }

    fn add_route(
        &self,
        dev_name: &str,
        dst: IpAddr,
        prefix_len: u8,
        gateway: Option<IpAddr>,
    ) -> Result<()> {
        let netns = (self.probe)();
        self.record(LinkCall::AddRoute {
            netns: netns.clone(),
            dev_name: dev_name.to_string(),
            dst,
            prefix_len,
            gateway,
        });

        self.mutate("add_route", &netns, dev_name, |link| {
            link.routes.push((dst, prefix_len, gateway));
        })
    }
}
