//! Namespace handle provider trait for pluggable implementations

use nix::sys::signal::SigSet;
use std::cell::RefCell;
use std::collections::HashSet;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::rc::Rc;

use netdev_core::{Error, Result};

/// Trait for namespace handle providers
///
/// This allows for different implementations:
/// - [`SystemNamespaceProvider`](crate::SystemNamespaceProvider) - `setns(2)` on the calling thread
/// - [`MockNamespaceProvider`] - Testing without touching the kernel
pub trait NamespaceProvider {
    /// Open a handle to the namespace called `name`
    ///
    /// # Errors
    /// Returns [`Error::NamespaceOpen`] if the namespace cannot be opened
    fn open(&self, name: &str) -> Result<NamespaceHandle>;

    /// Switch the calling thread into the namespace behind `handle`
    ///
    /// # Errors
    /// Returns [`Error::NamespaceSwitch`] if the switch fails. The thread is
    /// left in its previous namespace.
    fn enter(&self, handle: &NamespaceHandle) -> Result<SwitchState>;

    /// Switch the calling thread back to the namespace saved in `state`
    ///
    /// # Errors
    /// Returns [`Error::NamespaceSwitch`] if the thread could not be switched
    /// back.
    fn exit(&self, state: SwitchState) -> Result<()>;
}

/// An open handle to a network namespace
///
/// Dropping the handle closes the underlying descriptor.
#[derive(Debug)]
pub struct NamespaceHandle {
    name: String,
    fd: Option<OwnedFd>,
}

impl NamespaceHandle {
    /// Wrap an open namespace file descriptor
    #[must_use]
    pub fn from_fd(name: impl Into<String>, fd: OwnedFd) -> Self {
        Self {
            name: name.into(),
            fd: Some(fd),
        }
    }

    /// A handle without a kernel descriptor, for providers that do not switch
    /// real namespaces
    #[must_use]
    pub fn detached(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fd: None,
        }
    }

    /// Name the handle was opened for
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the namespace file descriptor, if any
    #[must_use]
    pub fn as_fd(&self) -> Option<BorrowedFd<'_>> {
        self.fd.as_ref().map(AsFd::as_fd)
    }
}

/// State captured on enter, needed to reverse the switch
#[derive(Debug)]
#[must_use = "a namespace switch must be reverted with NamespaceProvider::exit"]
pub struct SwitchState {
    target: String,
    previous: Option<OwnedFd>,
    previous_sigmask: Option<SigSet>,
}

impl SwitchState {
    /// State for a switch away from the namespace behind `previous`
    pub fn new(target: impl Into<String>, previous: OwnedFd, previous_sigmask: Option<SigSet>) -> Self {
        Self {
            target: target.into(),
            previous: Some(previous),
            previous_sigmask,
        }
    }

    /// State without a saved namespace, for providers that do not switch
    /// real namespaces
    pub fn detached(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            previous: None,
            previous_sigmask: None,
        }
    }

    /// Namespace the thread was switched into
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Namespace the thread was in before the switch
    #[must_use]
    pub fn previous(&self) -> Option<BorrowedFd<'_>> {
        self.previous.as_ref().map(AsFd::as_fd)
    }

    /// Signal mask in effect before the switch
    #[must_use]
    pub const fn previous_sigmask(&self) -> Option<&SigSet> {
        self.previous_sigmask.as_ref()
    }
}

/// Mock provider for testing (doesn't touch the kernel)
///
/// Clones share state, so a test can keep one clone for inspection and hand
/// another to the code under test.
///
/// # Example
/// ```
/// use netdev_namespace::{MockNamespaceProvider, NamespaceProvider};
///
/// let provider = MockNamespaceProvider::new().with_namespace("ns_a");
///
/// let handle = provider.open("ns_a").unwrap();
/// let state = provider.enter(&handle).unwrap();
/// assert_eq!(provider.current(), "ns_a");
///
/// provider.exit(state).unwrap();
/// assert_eq!(provider.current(), "");
/// assert!(provider.open("missing").is_err());
/// ```
#[derive(Clone, Default)]
pub struct MockNamespaceProvider {
    state: Rc<RefCell<MockState>>,
}

#[derive(Default)]
struct MockState {
    namespaces: HashSet<String>,
    failing_enter: HashSet<String>,
    failing_exit: HashSet<String>,
    stack: Vec<String>,
    opens: usize,
    enters: usize,
    exits: usize,
}

impl MockNamespaceProvider {
    /// Create a new mock provider with no named namespaces
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace that can be opened
    #[must_use]
    pub fn with_namespace(self, name: impl Into<String>) -> Self {
        self.state.borrow_mut().namespaces.insert(name.into());
        self
    }

    /// Make every enter into `name` fail
    pub fn fail_enter(&self, name: impl Into<String>) {
        self.state.borrow_mut().failing_enter.insert(name.into());
    }

    /// Make every exit from `name` fail, leaving the thread inside it
    pub fn fail_exit(&self, name: impl Into<String>) {
        self.state.borrow_mut().failing_exit.insert(name.into());
    }

    /// Clear injected enter/exit failures
    pub fn clear_failures(&self) {
        let mut state = self.state.borrow_mut();
        state.failing_enter.clear();
        state.failing_exit.clear();
    }

    /// Namespace the (simulated) thread is currently in; empty for default
    #[must_use]
    pub fn current(&self) -> String {
        self.state.borrow().stack.last().cloned().unwrap_or_default()
    }

    /// Number of switches currently in flight
    #[must_use]
    pub fn depth(&self) -> usize {
        self.state.borrow().stack.len()
    }

    /// Number of successful opens (for testing)
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.state.borrow().opens
    }

    /// Number of enter attempts (for testing)
    #[must_use]
    pub fn enter_count(&self) -> usize {
        self.state.borrow().enters
    }

    /// Number of exit attempts (for testing)
    #[must_use]
    pub fn exit_count(&self) -> usize {
        self.state.borrow().exits
    }
}

impl std::fmt::Debug for MockNamespaceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockNamespaceProvider").finish_non_exhaustive()
    }
}

impl NamespaceProvider for MockNamespaceProvider {
    fn open(&self, name: &str) -> Result<NamespaceHandle> {
        let mut state = self.state.borrow_mut();

        if !state.namespaces.contains(name) {
            tracing::debug!(netns = %name, "Mock: Namespace not found");
            return Err(Error::NamespaceOpen {
                namespace: name.to_string(),
                message: "No such file or directory".to_string(),
            });
        }

        state.opens += 1;
        tracing::debug!(netns = %name, opens = state.opens, "Mock: Opened namespace");

        Ok(NamespaceHandle::detached(name))
    }

    fn enter(&self, handle: &NamespaceHandle) -> Result<SwitchState> {
        let mut state = self.state.borrow_mut();
        state.enters += 1;

        if state.failing_enter.contains(handle.name()) {
            return Err(Error::NamespaceSwitch {
                namespace: handle.name().to_string(),
                message: "Operation not permitted".to_string(),
            });
        }

        state.stack.push(handle.name().to_string());
        tracing::trace!(netns = %handle.name(), depth = state.stack.len(), "Mock: Entered namespace");

        Ok(SwitchState::detached(handle.name()))
    }

    fn exit(&self, switch: SwitchState) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.exits += 1;

        if state.failing_exit.contains(switch.target()) {
            return Err(Error::NamespaceSwitch {
                namespace: switch.target().to_string(),
                message: "Invalid argument".to_string(),
            });
        }

        state.stack.pop();
        tracing::trace!(netns = %switch.target(), depth = state.stack.len(), "Mock: Exited namespace");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_lifecycle() {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");

        let handle = provider.open("ns_a").unwrap();
        assert_eq!(handle.name(), "ns_a");
        assert!(handle.as_fd().is_none());
        assert_eq!(provider.open_count(), 1);

        let state = provider.enter(&handle).unwrap();
        assert_eq!(state.target(), "ns_a");
        assert_eq!(provider.current(), "ns_a");
        assert_eq!(provider.depth(), 1);

        provider.exit(state).unwrap();
        assert_eq!(provider.current(), "");
        assert_eq!(provider.enter_count(), 1);
        assert_eq!(provider.exit_count(), 1);
    }

    #[test]
    fn test_mock_provider_unknown_namespace() {
        let provider = MockNamespaceProvider::new();

        let result = provider.open("missing");
        assert!(matches!(result, Err(Error::NamespaceOpen { .. })));
        assert_eq!(provider.open_count(), 0);
    }

    #[test]
    fn test_mock_provider_injected_failures() {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");
        let handle = provider.open("ns_a").unwrap();

        provider.fail_enter("ns_a");
        assert!(matches!(
            provider.enter(&handle),
            Err(Error::NamespaceSwitch { .. })
        ));
        assert_eq!(provider.depth(), 0);

        provider.clear_failures();
        provider.fail_exit("ns_a");
        let state = provider.enter(&handle).unwrap();
        assert!(provider.exit(state).is_err());

        // A failed exit leaves the thread inside the namespace
        assert_eq!(provider.current(), "ns_a");
    }

    #[test]
    fn test_mock_provider_clones_share_state() {
        let provider = MockNamespaceProvider::new().with_namespace("ns_a");
        let observer = provider.clone();

        let _handle = provider.open("ns_a").unwrap();
        assert_eq!(observer.open_count(), 1);
    }
}
