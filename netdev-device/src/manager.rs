//! Owner of the namespace pool, device registry and link-control

use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

use netdev_core::Result;
use netdev_link::{LinkControl, SystemLinkControl};
use netdev_namespace::{
    NamespaceContext, NamespaceContextPool, NamespaceProvider, NetnsConfig, SystemNamespaceProvider,
};

use crate::device::Netdev;
use crate::registry::DeviceRegistry;

struct Inner {
    pool: RefCell<NamespaceContextPool>,
    registry: RefCell<DeviceRegistry>,
    link: Rc<dyn LinkControl>,
}

/// Allocation context for [`Netdev`] objects
///
/// Every device allocated from a manager shares its namespace context pool,
/// device registry and link-control. Cloning is cheap and yields a handle to
/// the same state, so independent managers give fully isolated instances.
///
/// # Example
/// ```
/// use std::rc::Rc;
/// use netdev_device::NetdevManager;
/// use netdev_link::MockLinkControl;
/// use netdev_namespace::MockNamespaceProvider;
///
/// let manager = NetdevManager::new(
///     Rc::new(MockNamespaceProvider::new()),
///     Rc::new(MockLinkControl::new().with_link("", 1, "lo")),
/// );
///
/// let mut dev = manager.alloc("loopback");
/// dev.set_ifindex(1).unwrap();
/// dev.register().unwrap();
/// assert_eq!(dev.dev_name(), Some("lo"));
/// assert_eq!(manager.namespace_refcount(""), Some(1));
/// ```
#[derive(Clone)]
pub struct NetdevManager {
    inner: Rc<Inner>,
}

impl NetdevManager {
    /// Create a manager on top of the given provider and link-control
    #[must_use]
    pub fn new(provider: Rc<dyn NamespaceProvider>, link: Rc<dyn LinkControl>) -> Self {
        Self {
            inner: Rc::new(Inner {
                pool: RefCell::new(NamespaceContextPool::new(provider)),
                registry: RefCell::new(DeviceRegistry::new()),
                link,
            }),
        }
    }

    /// Create a manager that talks to the running kernel
    #[must_use]
    pub fn system(config: NetnsConfig) -> Self {
        Self::new(
            Rc::new(SystemNamespaceProvider::new(config)),
            Rc::new(SystemLinkControl::new()),
        )
    }

    /// Allocate a new, unregistered device object
    ///
    /// `name` identifies the object in logs and is never changed.
    pub fn alloc(&self, name: impl Into<String>) -> Netdev {
        let name = name.into();
        let id = self.inner.registry.borrow_mut().insert(name.clone());
        debug!(netdev = %name, id = %id, "Allocated device object");

        Netdev::new(self.clone(), id, name)
    }

    /// Provider used to switch namespaces
    #[must_use]
    pub fn provider(&self) -> Rc<dyn NamespaceProvider> {
        self.inner.pool.borrow().provider()
    }

    /// Link-control used inside namespaces
    #[must_use]
    pub fn link(&self) -> Rc<dyn LinkControl> {
        Rc::clone(&self.inner.link)
    }

    /// Reference count of the context for `netns`, if one exists
    #[must_use]
    pub fn namespace_refcount(&self, netns: &str) -> Option<usize> {
        self.inner.pool.borrow().refcount(netns)
    }

    /// Context for `netns`, without taking a reference
    #[must_use]
    pub fn namespace_context(&self, netns: &str) -> Option<Rc<NamespaceContext>> {
        self.inner.pool.borrow().get(netns).cloned()
    }

    /// Number of live namespace contexts
    #[must_use]
    pub fn namespace_count(&self) -> usize {
        self.inner.pool.borrow().len()
    }

    /// Names of live namespace contexts, sorted
    #[must_use]
    pub fn namespace_names(&self) -> Vec<String> {
        self.inner.pool.borrow().names()
    }

    /// Number of live device objects
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Names of live device objects in allocation order
    #[must_use]
    pub fn device_names(&self) -> Vec<String> {
        self.inner.registry.borrow().names()
    }

    pub(crate) fn acquire_context(&self, netns: &str) -> Result<Rc<NamespaceContext>> {
        self.inner.pool.borrow_mut().acquire(netns)
    }

    pub(crate) fn release_context(&self, context: Rc<NamespaceContext>) {
        self.inner.pool.borrow_mut().release(context);
    }

    pub(crate) fn with_registry<R>(&self, f: impl FnOnce(&mut DeviceRegistry) -> R) -> R {
        f(&mut self.inner.registry.borrow_mut())
    }
}

impl std::fmt::Debug for NetdevManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetdevManager")
            .field("namespaces", &self.namespace_names())
            .field("devices", &self.device_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netdev_link::MockLinkControl;
    use netdev_namespace::MockNamespaceProvider;

    fn manager() -> NetdevManager {
        NetdevManager::new(
            Rc::new(MockNamespaceProvider::new()),
            Rc::new(MockLinkControl::new()),
        )
    }

    #[test]
    fn test_alloc_tracks_devices() {
        let manager = manager();

        let a = manager.alloc("a");
        let b = manager.alloc("b");
        assert_eq!(manager.device_names(), vec!["a", "b"]);

        drop(a);
        assert_eq!(manager.device_names(), vec!["b"]);

        b.free();
        assert_eq!(manager.device_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let manager = manager();
        let other = manager.clone();

        let _dev = other.alloc("shared");
        assert_eq!(manager.device_count(), 1);
    }

    #[test]
    fn test_managers_are_isolated() {
        let first = manager();
        let second = manager();

        let _dev = first.alloc("only-here");
        assert_eq!(first.device_count(), 1);
        assert_eq!(second.device_count(), 0);
        assert_eq!(first.namespace_count(), 0);
    }
}
