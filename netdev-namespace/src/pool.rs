//! Shared, refcounted per-namespace contexts
//!
//! All devices managed in one namespace share a single [`NamespaceContext`]
//! and therefore a single open namespace handle. The pool hands out
//! `Rc<NamespaceContext>` on [`acquire`](NamespaceContextPool::acquire) and
//! counts users explicitly. The last
//! [`release`](NamespaceContextPool::release) closes the handle right away,
//! even if some caller still holds an `Rc` to the context.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};

use netdev_core::Result;

use crate::provider::{NamespaceHandle, NamespaceProvider};

/// Context shared by every device in one network namespace
#[derive(Debug)]
pub struct NamespaceContext {
    /// Empty for the default namespace
    name: String,
    /// `None` for the default namespace and once closed
    handle: RefCell<Option<NamespaceHandle>>,
}

impl NamespaceContext {
    /// Namespace name; empty for the default namespace
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the default namespace, where no switch is needed
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    /// Open namespace handle; `None` for the default namespace or after the
    /// pool released the context
    #[must_use]
    pub fn handle(&self) -> Option<Ref<'_, NamespaceHandle>> {
        Ref::filter_map(self.handle.borrow(), Option::as_ref).ok()
    }

    /// Whether the context can still be used to switch namespaces
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_default() || self.handle.borrow().is_some()
    }

    fn close(&self) {
        if self.handle.borrow_mut().take().is_some() {
            debug!(netns = %self.name, "Closing namespace handle");
        }
    }
}

struct PoolEntry {
    context: Rc<NamespaceContext>,
    refcount: usize,
}

/// Registry of namespace contexts keyed by namespace name
pub struct NamespaceContextPool {
    provider: Rc<dyn NamespaceProvider>,
    contexts: HashMap<String, PoolEntry>,
}

impl NamespaceContextPool {
    /// Create an empty pool opening handles through `provider`
    #[must_use]
    pub fn new(provider: Rc<dyn NamespaceProvider>) -> Self {
        Self {
            provider,
            contexts: HashMap::new(),
        }
    }

    /// Provider used to open, enter and exit namespaces
    #[must_use]
    pub fn provider(&self) -> Rc<dyn NamespaceProvider> {
        Rc::clone(&self.provider)
    }

    /// Get the context for `name`, creating it on first use
    ///
    /// A new context is only added to the pool once its handle has been
    /// opened; on failure nothing is added.
    ///
    /// # Errors
    /// Returns the provider's error (typically
    /// [`Error::NamespaceOpen`](netdev_core::Error::NamespaceOpen)) if the
    /// namespace cannot be opened.
    pub fn acquire(&mut self, name: &str) -> Result<Rc<NamespaceContext>> {
        if let Some(entry) = self.contexts.get_mut(name) {
            entry.refcount += 1;
            debug!(netns = %name, refcount = entry.refcount, "Reusing namespace context");
            return Ok(Rc::clone(&entry.context));
        }

        let handle = if name.is_empty() {
            None
        } else {
            info!(netns = %name, "Prepare netns: opening namespace");
            Some(self.provider.open(name)?)
        };

        let context = Rc::new(NamespaceContext {
            name: name.to_string(),
            handle: RefCell::new(handle),
        });

        self.contexts.insert(
            name.to_string(),
            PoolEntry {
                context: Rc::clone(&context),
                refcount: 1,
            },
        );
        debug!(netns = %name, "Created namespace context");

        Ok(context)
    }

    /// Drop one reference to `context`, destroying it on the last one
    ///
    /// # Panics
    /// Panics if `context` is not the instance tracked by this pool. That is
    /// a refcount imbalance in the caller.
    pub fn release(&mut self, context: Rc<NamespaceContext>) {
        let name = context.name();

        let Some(entry) = self.contexts.get_mut(name) else {
            panic!("release of untracked namespace context '{name}'");
        };
        assert!(
            Rc::ptr_eq(&entry.context, &context),
            "release of stale namespace context '{name}'"
        );
        assert!(entry.refcount > 0, "namespace context '{name}' refcount underflow");

        entry.refcount -= 1;
        debug!(netns = %name, refcount = entry.refcount, "Released namespace context");

        if entry.refcount == 0 {
            entry.context.close();
            self.contexts.remove(name);
            info!(netns = %name, "Namespace context destroyed");
        }
    }

    /// Current reference count for `name`, if a context exists
    #[must_use]
    pub fn refcount(&self, name: &str) -> Option<usize> {
        self.contexts.get(name).map(|entry| entry.refcount)
    }

    /// Look up the context for `name` without taking a reference
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<NamespaceContext>> {
        self.contexts.get(name).map(|entry| &entry.context)
    }

    /// Number of live contexts
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Check if the pool holds no contexts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Names of all live contexts, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contexts.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for NamespaceContextPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceContextPool")
            .field("contexts", &self.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockNamespaceProvider;
    use netdev_core::Error;

    fn pool_with(provider: &MockNamespaceProvider) -> NamespaceContextPool {
        NamespaceContextPool::new(Rc::new(provider.clone()))
    }

    #[test]
    fn test_acquire_release_counts() {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");
        let mut pool = pool_with(&provider);

        let mut held = Vec::new();
        for expected in 1..=3 {
            held.push(pool.acquire("ns_a").unwrap());
            assert_eq!(pool.refcount("ns_a"), Some(expected));
            assert_eq!(pool.len(), 1);
        }

        // Handle opened once, shared by all
        assert_eq!(provider.open_count(), 1);
        assert!(held.windows(2).all(|w| Rc::ptr_eq(&w[0], &w[1])));

        for expected in (0..3).rev() {
            pool.release(held.pop().unwrap());
            if expected == 0 {
                assert_eq!(pool.refcount("ns_a"), None);
            } else {
                assert_eq!(pool.refcount("ns_a"), Some(expected));
            }
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn test_last_release_closes_handle() {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");
        let mut pool = pool_with(&provider);

        let context = pool.acquire("ns_a").unwrap();
        let weak = Rc::downgrade(&context);

        pool.release(context);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_last_release_closes_handle_despite_outside_clone() {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");
        let mut pool = pool_with(&provider);

        let context = pool.acquire("ns_a").unwrap();
        let kept = pool.get("ns_a").cloned().unwrap();
        assert!(kept.handle().is_some());

        pool.release(context);

        assert_eq!(pool.refcount("ns_a"), None);
        assert!(kept.handle().is_none());
        assert!(!kept.is_open());

        // A new acquire opens a fresh handle instead of reusing the kept one
        let fresh = pool.acquire("ns_a").unwrap();
        assert!(!Rc::ptr_eq(&fresh, &kept));
        assert!(fresh.is_open());
        assert_eq!(provider.open_count(), 2);
        pool.release(fresh);
    }

    #[test]
    fn test_default_namespace_has_no_handle() {
        let provider = MockNamespaceProvider::new();
        let mut pool = pool_with(&provider);

        let context = pool.acquire("").unwrap();
        assert!(context.is_default());
        assert!(context.handle().is_none());
        assert!(context.is_open());
        assert_eq!(provider.open_count(), 0);
        assert_eq!(pool.refcount(""), Some(1));

        pool.release(context);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_failed_open_adds_nothing() {
        let provider = MockNamespaceProvider::new();
        let mut pool = pool_with(&provider);

        let result = pool.acquire("missing");
        assert!(matches!(result, Err(Error::NamespaceOpen { .. })));
        assert!(pool.is_empty());
        assert_eq!(pool.refcount("missing"), None);
    }

    #[test]
    fn test_names_are_distinct_keys() {
        let provider = MockNamespaceProvider::new()
            .with_namespace("ns_a")
            .with_namespace("ns_b");
        let mut pool = pool_with(&provider);

        let a = pool.acquire("ns_a").unwrap();
        let b = pool.acquire("ns_b").unwrap();
        let default = pool.acquire("").unwrap();

        assert_eq!(pool.names(), vec!["", "ns_a", "ns_b"]);
        assert!(!Rc::ptr_eq(&a, &b));

        pool.release(a);
        pool.release(b);
        pool.release(default);
        assert!(pool.is_empty());
    }

    #[test]
    #[should_panic(expected = "untracked namespace context")]
    fn test_release_untracked_panics() {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");
        let mut pool = pool_with(&provider);

        let context = pool.acquire("ns_a").unwrap();
        let extra = Rc::clone(&context);
        pool.release(context);

        // Second release of the same logical reference
        pool.release(extra);
    }

    #[test]
    #[should_panic(expected = "stale namespace context")]
    fn test_release_foreign_context_panics() {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");
        let mut pool = pool_with(&provider);
        let mut other = pool_with(&provider);

        let _ours = pool.acquire("ns_a").unwrap();
        let theirs = other.acquire("ns_a").unwrap();

        pool.release(theirs);
    }
}
