//! Managed network device object
//!
//! A [`Netdev`] designates one kernel interface by `(namespace, ifindex)`.
//! It is configured while unregistered, then registered: registration takes a
//! reference on the shared namespace context and resolves the interface name
//! inside the namespace. Every operation on the interface afterwards runs
//! inside that namespace through [`run_in_namespace`].

use std::any::Any;
use std::fmt;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::SystemTime;
use tracing::{debug, info, info_span, warn};

use netdev_core::{Error, IfIndex, NetdevEvent, Result};
use netdev_link::LinkControl;
use netdev_namespace::{NamespaceContext, run_in_namespace};

use crate::manager::NetdevManager;
use crate::registry::DeviceId;

/// Called when the interface goes up or down
pub type IfUpDownCallback = Box<dyn FnMut(&Netdev, bool)>;

/// Called with the new name when the interface is renamed; the device still
/// reports the old name while it runs
pub type DevNameCallback = Box<dyn FnMut(&Netdev, &str)>;

/// Called when the interface MTU changes
pub type MtuCallback = Box<dyn FnMut(&Netdev, u32)>;

/// A managed network interface
///
/// Created by [`NetdevManager::alloc`]. Dropping the object (or calling
/// [`free`](Self::free)) unregisters it first if needed.
pub struct Netdev {
    manager: NetdevManager,
    id: DeviceId,
    name: String,
    ifindex: IfIndex,
    netns_name: Option<String>,
    dev_name: Option<String>,
    priv_data: Option<Box<dyn Any>>,

    ifupdown_cb: Option<IfUpDownCallback>,
    dev_name_cb: Option<DevNameCallback>,
    mtu_cb: Option<MtuCallback>,

    if_up: Option<bool>,
    mtu: Option<u32>,

    /// Held exactly while registered
    netns_ctx: Option<Rc<NamespaceContext>>,
}

impl Netdev {
    pub(crate) fn new(manager: NetdevManager, id: DeviceId, name: String) -> Self {
        Self {
            manager,
            id,
            name,
            ifindex: IfIndex::UNSET,
            netns_name: None,
            dev_name: None,
            priv_data: None,
            ifupdown_cb: None,
            dev_name_cb: None,
            mtu_cb: None,
            if_up: None,
            mtu: None,
            netns_ctx: None,
        }
    }

    /// Identifying name given at allocation
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry id of this object
    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Configured interface index
    #[must_use]
    pub const fn ifindex(&self) -> IfIndex {
        self.ifindex
    }

    /// Configured namespace name; `None` means the default namespace
    #[must_use]
    pub fn netns_name(&self) -> Option<&str> {
        self.netns_name.as_deref()
    }

    /// Interface name resolved at registration; `None` while unregistered
    #[must_use]
    pub fn dev_name(&self) -> Option<&str> {
        self.dev_name.as_deref()
    }

    /// Whether the device is bound to its interface
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.netns_ctx.is_some()
    }

    /// Namespace context held while registered
    #[must_use]
    pub const fn namespace_context(&self) -> Option<&Rc<NamespaceContext>> {
        self.netns_ctx.as_ref()
    }

    /// Last observed administrative state, if known
    #[must_use]
    pub const fn if_up(&self) -> Option<bool> {
        self.if_up
    }

    /// Last observed MTU, if known
    #[must_use]
    pub const fn mtu(&self) -> Option<u32> {
        self.mtu
    }

    /// Set the interface index
    ///
    /// # Errors
    /// Returns [`Error::AlreadyRegistered`] while registered; nothing changes.
    pub fn set_ifindex(&mut self, ifindex: impl Into<IfIndex>) -> Result<()> {
        self.ensure_unregistered()?;
        self.ifindex = ifindex.into();
        Ok(())
    }

    /// Set the namespace holding the interface; `None` or `""` selects the
    /// default namespace
    ///
    /// # Errors
    /// Returns [`Error::AlreadyRegistered`] while registered; nothing changes.
    pub fn set_netns_name(&mut self, netns_name: Option<&str>) -> Result<()> {
        self.ensure_unregistered()?;
        self.netns_name = netns_name.map(str::to_string);
        Ok(())
    }

    /// Attach opaque user data, replacing any previous value
    pub fn set_priv_data<T: Any>(&mut self, data: T) {
        self.priv_data = Some(Box::new(data));
    }

    /// User data, if set and of type `T`
    #[must_use]
    pub fn priv_data<T: Any>(&self) -> Option<&T> {
        self.priv_data.as_ref()?.downcast_ref()
    }

    /// Detach and return the user data
    pub fn take_priv_data(&mut self) -> Option<Box<dyn Any>> {
        self.priv_data.take()
    }

    /// Set or clear the up/down callback
    pub fn set_ifupdown_callback(&mut self, cb: Option<IfUpDownCallback>) {
        self.ifupdown_cb = cb;
    }

    /// Set or clear the rename callback
    pub fn set_dev_name_callback(&mut self, cb: Option<DevNameCallback>) {
        self.dev_name_cb = cb;
    }

    /// Set or clear the MTU callback
    pub fn set_mtu_callback(&mut self, cb: Option<MtuCallback>) {
        self.mtu_cb = cb;
    }

    /// Bind the device to its interface
    ///
    /// Either the device ends up registered, holding a namespace context
    /// reference and a resolved name, or it stays unregistered and the pool
    /// is left as it was.
    ///
    /// # Errors
    /// - [`Error::AlreadyRegistered`] if already registered
    /// - [`Error::ContextAcquisition`] if the namespace cannot be opened
    /// - [`Error::NoSuchDevice`] if the ifindex does not exist in the namespace
    /// - [`Error::NamespaceSwitch`] / [`Error::NamespaceRestore`] if switching
    ///   namespaces fails
    pub fn register(&mut self) -> Result<()> {
        self.ensure_unregistered()?;

        let netns = self.netns_key().to_string();
        let _span = info_span!(
            "netdev",
            netdev = %self.name,
            ifindex = self.ifindex.as_raw(),
            netns = %netns
        )
        .entered();

        let context = self
            .manager
            .acquire_context(&netns)
            .map_err(|e| Error::ContextAcquisition {
                namespace: netns.clone(),
                source: Box::new(e),
            })?;

        let provider = self.manager.provider();
        let link = self.manager.link();
        let ifindex = self.ifindex;

        let dev_name = match run_in_namespace(provider.as_ref(), &context, "register", || {
            link.resolve_name(ifindex)
        }) {
            Ok(dev_name) => dev_name,
            Err(e) => {
                warn!(error = %e, "Registration failed");
                self.manager.release_context(context);
                return Err(e);
            }
        };

        let others = self.manager.with_registry(|registry| {
            let others = registry.bindings_of(&netns, ifindex);
            registry.bind(self.id, netns.as_str(), ifindex);
            others
        });
        if !others.is_empty() {
            warn!(
                dev = %dev_name,
                others = others.len(),
                "Interface is already managed by another device object"
            );
        }

        NetdevEvent::Registered {
            device: self.name.clone(),
            dev_name: dev_name.clone(),
            ifindex,
            netns,
            timestamp: SystemTime::now(),
        }
        .emit_trace();

        self.dev_name = Some(dev_name);
        self.netns_ctx = Some(context);
        Ok(())
    }

    /// Release the interface and the namespace context reference
    ///
    /// Observed state and the resolved name are forgotten.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyUnregistered`] if not registered.
    pub fn unregister(&mut self) -> Result<()> {
        let Some(context) = self.netns_ctx.take() else {
            return Err(Error::AlreadyUnregistered {
                device: self.name.clone(),
            });
        };

        self.if_up = None;
        self.mtu = None;
        self.dev_name = None;

        self.manager.with_registry(|registry| registry.unbind(self.id));
        self.manager.release_context(context);

        NetdevEvent::Unregistered {
            device: self.name.clone(),
            timestamp: SystemTime::now(),
        }
        .emit_trace();
        Ok(())
    }

    /// Unregister if needed and destroy the object
    pub fn free(self) {
        drop(self);
    }

    /// Bring the interface administratively up or down
    ///
    /// # Errors
    /// Returns [`Error::NotRegistered`] if not registered, otherwise the
    /// outcome of the scoped link-control call.
    pub fn bring_up_down(&self, up: bool) -> Result<()> {
        self.run_scoped("bring_up_down", |link, dev_name| {
            info!(
                "Bringing dev {dev_name} {}",
                if up { "up" } else { "down" }
            );
            link.set_up(dev_name, up)
        })
    }

    /// Add a local address to the interface
    ///
    /// # Errors
    /// Returns [`Error::NotRegistered`] if not registered, otherwise the
    /// outcome of the scoped link-control call.
    pub fn add_address(&self, addr: IpAddr, prefix_len: u8) -> Result<()> {
        self.run_scoped("add_address", |link, dev_name| {
            info!("Adding address {addr}/{prefix_len} to dev {dev_name}");
            link.add_address(dev_name, addr, prefix_len)
        })
    }

    /// Add a route through the interface; no gateway means a direct route
    ///
    /// # Errors
    /// Returns [`Error::NotRegistered`] if not registered, otherwise the
    /// outcome of the scoped link-control call.
    pub fn add_route(&self, dst: IpAddr, prefix_len: u8, gateway: Option<IpAddr>) -> Result<()> {
        self.run_scoped("add_route", |link, dev_name| {
            match gateway {
                Some(gw) => info!("Adding route {dst}/{prefix_len} via {gw} dev {dev_name}"),
                None => info!("Adding route {dst}/{prefix_len} dev {dev_name}"),
            }
            link.add_route(dev_name, dst, prefix_len, gateway)
        })
    }

    /// Feed an observed up/down state
    ///
    /// The callback runs if the state was unknown or differs. Ignored while
    /// unregistered.
    pub fn notify_ifupdown(&mut self, up: bool) {
        if !self.accepts_notification("ifupdown") || self.if_up == Some(up) {
            return;
        }

        self.if_up = Some(up);
        NetdevEvent::LinkUpDown {
            device: self.name.clone(),
            up,
            timestamp: SystemTime::now(),
        }
        .emit_trace();

        if let Some(mut cb) = self.ifupdown_cb.take() {
            cb(self, up);
            self.ifupdown_cb = Some(cb);
        }
    }

    /// Feed an observed MTU
    ///
    /// The callback runs if the MTU was unknown or differs. Ignored while
    /// unregistered.
    pub fn notify_mtu(&mut self, mtu: u32) {
        if !self.accepts_notification("mtu") || self.mtu == Some(mtu) {
            return;
        }

        self.mtu = Some(mtu);
        NetdevEvent::MtuChanged {
            device: self.name.clone(),
            mtu,
            timestamp: SystemTime::now(),
        }
        .emit_trace();

        if let Some(mut cb) = self.mtu_cb.take() {
            cb(self, mtu);
            self.mtu_cb = Some(cb);
        }
    }

    /// Feed an observed interface name
    ///
    /// On a rename the callback runs first, then the new name is stored.
    /// Ignored while unregistered.
    pub fn notify_dev_name(&mut self, dev_name: &str) {
        if !self.accepts_notification("dev_name") || self.dev_name.as_deref() == Some(dev_name) {
            return;
        }

        NetdevEvent::Renamed {
            device: self.name.clone(),
            old_name: self.dev_name.clone().unwrap_or_default(),
            new_name: dev_name.to_string(),
            timestamp: SystemTime::now(),
        }
        .emit_trace();

        if let Some(mut cb) = self.dev_name_cb.take() {
            cb(self, dev_name);
            self.dev_name_cb = Some(cb);
        }
        self.dev_name = Some(dev_name.to_string());
    }

    /// Poll the interface and feed what changed to the notifications
    ///
    /// The name is re-resolved from the ifindex first, so renames are
    /// picked up before the state query.
    ///
    /// # Errors
    /// Returns [`Error::NotRegistered`] if not registered, otherwise any
    /// error from the scoped link-control calls.
    pub fn refresh_link_state(&mut self) -> Result<()> {
        let ifindex = self.ifindex;
        let (dev_name, state) = self.run_scoped("refresh_link_state", |link, _| {
            let dev_name = link.resolve_name(ifindex)?;
            let state = link.link_state(&dev_name)?;
            Ok((dev_name, state))
        })?;

        self.notify_dev_name(&dev_name);
        self.notify_ifupdown(state.up);
        self.notify_mtu(state.mtu);
        Ok(())
    }

    fn netns_key(&self) -> &str {
        self.netns_name.as_deref().unwrap_or_default()
    }

    fn ensure_unregistered(&self) -> Result<()> {
        if self.is_registered() {
            return Err(Error::AlreadyRegistered {
                device: self.name.clone(),
            });
        }
        Ok(())
    }

    fn accepts_notification(&self, kind: &str) -> bool {
        if self.is_registered() {
            return true;
        }
        debug!(netdev = %self.name, kind, "Ignoring notification for unregistered device");
        false
    }

    fn run_scoped<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&dyn LinkControl, &str) -> Result<T>,
    ) -> Result<T> {
        let (Some(context), Some(dev_name)) = (&self.netns_ctx, &self.dev_name) else {
            return Err(Error::NotRegistered {
                device: self.name.clone(),
            });
        };

        let _span = info_span!(
            "netdev",
            netdev = %self.name,
            dev = %dev_name,
            ifindex = self.ifindex.as_raw(),
            netns = %context.name()
        )
        .entered();

        let provider = self.manager.provider();
        let link = self.manager.link();
        run_in_namespace(provider.as_ref(), context, operation, || {
            f(link.as_ref(), dev_name)
        })
    }
}

impl Drop for Netdev {
    fn drop(&mut self) {
        if self.is_registered() {
            // Only fails when not registered
            let _ = self.unregister();
        }
        self.manager.with_registry(|registry| registry.remove(self.id));
        debug!(netdev = %self.name, "Freed device object");
    }
}

impl fmt::Debug for Netdev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Netdev")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("ifindex", &self.ifindex)
            .field("netns_name", &self.netns_name)
            .field("dev_name", &self.dev_name)
            .field("registered", &self.is_registered())
            .field("if_up", &self.if_up)
            .field("mtu", &self.mtu)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netdev_link::MockLinkControl;
    use netdev_namespace::MockNamespaceProvider;
    use std::cell::RefCell;

    struct Fixture {
        provider: MockNamespaceProvider,
        link: MockLinkControl,
        manager: NetdevManager,
    }

    fn fixture() -> Fixture {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");
        let probe = provider.clone();
        let link = MockLinkControl::new()
            .with_link("", 1, "lo")
            .with_link("ns_a", 1, "lo")
            .with_link("ns_a", 5, "gtp0")
            .with_namespace_probe(move || probe.current());
        let manager = NetdevManager::new(Rc::new(provider.clone()), Rc::new(link.clone()));

        Fixture {
            provider,
            link,
            manager,
        }
    }

    fn registered(fx: &Fixture, netns: Option<&str>, ifindex: u32) -> Netdev {
        let mut dev = fx.manager.alloc("dev");
        dev.set_netns_name(netns).unwrap();
        dev.set_ifindex(ifindex).unwrap();
        dev.register().unwrap();
        dev
    }

    #[test]
    fn test_alloc_defaults() {
        let fx = fixture();
        let dev = fx.manager.alloc("gtp");

        assert_eq!(dev.name(), "gtp");
        assert_eq!(dev.ifindex(), IfIndex::UNSET);
        assert_eq!(dev.netns_name(), None);
        assert_eq!(dev.dev_name(), None);
        assert!(!dev.is_registered());
        assert_eq!(dev.if_up(), None);
        assert_eq!(dev.mtu(), None);
        assert!(dev.priv_data::<u32>().is_none());
    }

    #[test]
    fn test_register_resolves_in_namespace() {
        let fx = fixture();
        let dev = registered(&fx, Some("ns_a"), 5);

        assert!(dev.is_registered());
        assert_eq!(dev.dev_name(), Some("gtp0"));
        assert_eq!(fx.manager.namespace_refcount("ns_a"), Some(1));
        assert_eq!(fx.link.calls()[0].netns(), "ns_a");
        assert_eq!(fx.provider.depth(), 0);
    }

    #[test]
    fn test_empty_netns_name_is_default() {
        let fx = fixture();
        let dev = registered(&fx, Some(""), 1);

        assert_eq!(fx.manager.namespace_refcount(""), Some(1));
        assert_eq!(fx.provider.enter_count(), 0);
        drop(dev);
        assert_eq!(fx.manager.namespace_count(), 0);
    }

    #[test]
    fn test_register_twice() {
        let fx = fixture();
        let mut dev = registered(&fx, None, 1);

        let result = dev.register();
        assert!(matches!(result, Err(Error::AlreadyRegistered { .. })));
        assert_eq!(fx.manager.namespace_refcount(""), Some(1));
    }

    #[test]
    fn test_setters_locked_while_registered() {
        let fx = fixture();
        let mut dev = registered(&fx, Some("ns_a"), 5);

        assert!(matches!(dev.set_ifindex(1), Err(Error::AlreadyRegistered { .. })));
        assert!(matches!(
            dev.set_netns_name(None),
            Err(Error::AlreadyRegistered { .. })
        ));
        assert_eq!(dev.ifindex(), IfIndex::from_raw(5));
        assert_eq!(dev.netns_name(), Some("ns_a"));

        dev.unregister().unwrap();
        dev.set_ifindex(1).unwrap();
        assert_eq!(dev.ifindex(), IfIndex::from_raw(1));
    }

    #[test]
    fn test_unregister_clears_state() {
        let fx = fixture();
        let mut dev = registered(&fx, Some("ns_a"), 5);
        dev.notify_ifupdown(true);
        dev.notify_mtu(1400);

        dev.unregister().unwrap();

        assert!(!dev.is_registered());
        assert_eq!(dev.dev_name(), None);
        assert_eq!(dev.if_up(), None);
        assert_eq!(dev.mtu(), None);
        assert_eq!(fx.manager.namespace_refcount("ns_a"), None);

        assert!(matches!(
            dev.unregister(),
            Err(Error::AlreadyUnregistered { .. })
        ));
    }

    #[test]
    fn test_reregister_after_unregister() {
        let fx = fixture();
        let mut dev = registered(&fx, Some("ns_a"), 5);

        dev.unregister().unwrap();
        dev.set_netns_name(None).unwrap();
        dev.set_ifindex(1).unwrap();
        dev.register().unwrap();

        assert_eq!(dev.dev_name(), Some("lo"));
        assert_eq!(fx.manager.namespace_names(), vec![""]);
    }

    #[test]
    fn test_unknown_ifindex_leaves_pool_unchanged() {
        let fx = fixture();
        let _holder = registered(&fx, Some("ns_a"), 5);

        let mut dev = fx.manager.alloc("missing");
        dev.set_netns_name(Some("ns_a")).unwrap();
        dev.set_ifindex(999_999).unwrap();

        let result = dev.register();
        assert!(matches!(result, Err(Error::NoSuchDevice { ifindex: 999_999 })));
        assert!(!dev.is_registered());
        assert_eq!(fx.manager.namespace_refcount("ns_a"), Some(1));
        assert_eq!(fx.provider.depth(), 0);
    }

    #[test]
    fn test_missing_namespace_fails_acquisition() {
        let fx = fixture();
        let mut dev = fx.manager.alloc("nowhere");
        dev.set_netns_name(Some("ns_missing")).unwrap();
        dev.set_ifindex(1).unwrap();

        let err = dev.register().unwrap_err();
        match err {
            Error::ContextAcquisition { namespace, source } => {
                assert_eq!(namespace, "ns_missing");
                assert!(matches!(*source, Error::NamespaceOpen { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dev.is_registered());
        assert_eq!(fx.manager.namespace_count(), 0);
    }

    #[test]
    fn test_switch_failures_release_context() {
        let fx = fixture();
        let mut dev = fx.manager.alloc("dev");
        dev.set_netns_name(Some("ns_a")).unwrap();
        dev.set_ifindex(5).unwrap();

        fx.provider.fail_enter("ns_a");
        assert!(matches!(dev.register(), Err(Error::NamespaceSwitch { .. })));
        assert_eq!(fx.manager.namespace_refcount("ns_a"), None);

        fx.provider.clear_failures();
        fx.provider.fail_exit("ns_a");
        let err = dev.register().unwrap_err();
        assert!(err.is_restore_failure());
        assert!(!dev.is_registered());
        assert_eq!(fx.manager.namespace_refcount("ns_a"), None);
    }

    #[test]
    fn test_operations_require_registration() {
        let fx = fixture();
        let mut dev = fx.manager.alloc("idle");
        let addr: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(matches!(dev.bring_up_down(true), Err(Error::NotRegistered { .. })));
        assert!(matches!(dev.add_address(addr, 24), Err(Error::NotRegistered { .. })));
        assert!(matches!(
            dev.add_route(addr, 32, None),
            Err(Error::NotRegistered { .. })
        ));
        assert!(matches!(
            dev.refresh_link_state(),
            Err(Error::NotRegistered { .. })
        ));
        assert_eq!(fx.link.call_count(), 0);
    }

    #[test]
    fn test_unsupported_operation_still_switches() {
        let fx = fixture();
        let dev = registered(&fx, Some("ns_a"), 5);
        let enters = fx.provider.enter_count();

        let result = dev.bring_up_down(true);

        assert!(matches!(result, Err(Error::Unsupported { .. })));
        assert_eq!(fx.provider.enter_count(), enters + 1);
        assert_eq!(fx.provider.exit_count(), enters + 1);
        assert_eq!(fx.link.calls().last().unwrap().netns(), "ns_a");
    }

    #[test]
    fn test_ifupdown_callback_on_change_only() {
        let fx = fixture();
        let mut dev = registered(&fx, None, 1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        dev.set_ifupdown_callback(Some(Box::new(move |_: &Netdev, up: bool| {
            sink.borrow_mut().push(up);
        })));

        dev.notify_ifupdown(true);
        dev.notify_ifupdown(true);
        dev.notify_ifupdown(false);

        assert_eq!(*seen.borrow(), vec![true, false]);
        assert_eq!(dev.if_up(), Some(false));
    }

    #[test]
    fn test_dev_name_callback_sees_old_name() {
        let fx = fixture();
        let mut dev = registered(&fx, None, 1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        dev.set_dev_name_callback(Some(Box::new(move |dev: &Netdev, new_name: &str| {
            sink.borrow_mut()
                .push((dev.dev_name().unwrap_or_default().to_string(), new_name.to_string()));
        })));

        dev.notify_dev_name("lo");
        dev.notify_dev_name("lo1");

        assert_eq!(*seen.borrow(), vec![("lo".to_string(), "lo1".to_string())]);
        assert_eq!(dev.dev_name(), Some("lo1"));
    }

    #[test]
    fn test_cleared_callback_not_called() {
        let fx = fixture();
        let mut dev = registered(&fx, None, 1);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        dev.set_mtu_callback(Some(Box::new(move |_: &Netdev, _: u32| {
            *sink.borrow_mut() += 1;
        })));

        dev.notify_mtu(1500);
        dev.set_mtu_callback(None);
        dev.notify_mtu(9000);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(dev.mtu(), Some(9000));
    }

    #[test]
    fn test_notifications_ignored_while_unregistered() {
        let fx = fixture();
        let mut dev = fx.manager.alloc("idle");
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        dev.set_ifupdown_callback(Some(Box::new(move |_: &Netdev, _: bool| {
            *sink.borrow_mut() += 1;
        })));

        dev.notify_ifupdown(true);
        dev.notify_mtu(1500);
        dev.notify_dev_name("eth0");

        assert_eq!(*count.borrow(), 0);
        assert_eq!(dev.if_up(), None);
        assert_eq!(dev.mtu(), None);
        assert_eq!(dev.dev_name(), None);
    }

    #[test]
    fn test_refresh_link_state() {
        let fx = fixture();
        let mut dev = registered(&fx, Some("ns_a"), 5);
        let renames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&renames);
        dev.set_dev_name_callback(Some(Box::new(move |_: &Netdev, name: &str| {
            sink.borrow_mut().push(name.to_string());
        })));

        dev.refresh_link_state().unwrap();
        assert_eq!(dev.if_up(), Some(false));
        assert_eq!(dev.mtu(), Some(1500));

        fx.link.set_link_state("ns_a", 5, true, 1400);
        fx.link.rename_link("ns_a", 5, "gtp1");
        dev.refresh_link_state().unwrap();

        assert_eq!(dev.dev_name(), Some("gtp1"));
        assert_eq!(dev.if_up(), Some(true));
        assert_eq!(dev.mtu(), Some(1400));
        assert_eq!(*renames.borrow(), vec!["gtp1"]);
    }

    #[test]
    fn test_priv_data() {
        let fx = fixture();
        let mut dev = fx.manager.alloc("dev");

        dev.set_priv_data(42u32);
        assert_eq!(dev.priv_data::<u32>(), Some(&42));
        assert!(dev.priv_data::<String>().is_none());

        let data = dev.take_priv_data().unwrap();
        assert_eq!(data.downcast_ref::<u32>(), Some(&42));
        assert!(dev.priv_data::<u32>().is_none());
    }

    #[test]
    fn test_drop_unregisters() {
        let fx = fixture();
        let dev = registered(&fx, Some("ns_a"), 5);
        assert_eq!(fx.manager.device_count(), 1);

        drop(dev);

        assert_eq!(fx.manager.device_count(), 0);
        assert_eq!(fx.manager.namespace_count(), 0);
    }
}
