//! Scoped namespace switching
//!
//! Every operation that has to run inside a device's namespace goes through
//! [`run_in_namespace`]: enter, run, and always switch back. The switch is
//! thread-wide state, so scopes must not be nested or raced across threads.

use tracing::{debug, error};

use netdev_core::{Error, Result};

use crate::pool::NamespaceContext;
use crate::provider::{NamespaceProvider, SwitchState};

/// Guard for a thread temporarily switched into a namespace
///
/// Call [`exit`](Self::exit) to switch back and observe failures. If the
/// guard is dropped without `exit` (early return, panic) it switches back on
/// drop and logs any failure.
#[must_use = "dropping the scope switches the thread back immediately"]
pub struct NamespaceScope<'a> {
    provider: &'a dyn NamespaceProvider,
    operation: &'a str,
    state: Option<SwitchState>,
}

impl<'a> NamespaceScope<'a> {
    /// Switch into `context`'s namespace
    ///
    /// The default namespace needs no switch and yields an inert scope.
    ///
    /// # Errors
    /// Returns [`Error::NamespaceSwitch`] if the switch fails; the thread is
    /// still in its original namespace.
    pub fn enter(
        provider: &'a dyn NamespaceProvider,
        context: &NamespaceContext,
        operation: &'a str,
    ) -> Result<Self> {
        if context.is_default() {
            return Ok(Self {
                provider,
                operation,
                state: None,
            });
        }

        let Some(handle) = context.handle() else {
            error!(netns = %context.name(), operation, "Namespace context already closed");
            return Err(Error::NamespaceSwitch {
                namespace: context.name().to_string(),
                message: "Namespace context already closed".to_string(),
            });
        };

        debug!(netns = %context.name(), operation, "Switch to netns");

        let state = provider.enter(&handle).map_err(|e| {
            error!(netns = %context.name(), operation, error = %e, "Cannot switch to netns");
            match e {
                e @ Error::NamespaceSwitch { .. } => e,
                other => Error::NamespaceSwitch {
                    namespace: context.name().to_string(),
                    message: other.to_string(),
                },
            }
        })?;

        Ok(Self {
            provider,
            operation,
            state: Some(state),
        })
    }

    /// Whether the scope switched namespaces
    #[must_use]
    pub const fn is_switched(&self) -> bool {
        self.state.is_some()
    }

    /// Switch back to the namespace active before [`enter`](Self::enter)
    ///
    /// # Errors
    /// Returns [`Error::NamespaceRestore`] if the thread could not be switched
    /// back.
    pub fn exit(mut self) -> Result<()> {
        match self.state.take() {
            Some(state) => Self::restore(self.provider, self.operation, state),
            None => Ok(()),
        }
    }

    fn restore(provider: &dyn NamespaceProvider, operation: &str, state: SwitchState) -> Result<()> {
        let namespace = state.target().to_string();

        match provider.exit(state) {
            Ok(()) => {
                debug!(netns = %namespace, operation, "Back from netns");
                Ok(())
            }
            Err(e) => {
                error!(netns = %namespace, operation, error = %e, "Cannot switch back from netns");
                let message = match e {
                    Error::NamespaceSwitch { message, .. } => message,
                    other => other.to_string(),
                };
                Err(Error::NamespaceRestore {
                    namespace,
                    message,
                    primary: None,
                })
            }
        }
    }
}

impl Drop for NamespaceScope<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            // Failure is already logged by restore
            let _ = Self::restore(self.provider, self.operation, state);
        }
    }
}

impl std::fmt::Debug for NamespaceScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceScope")
            .field("operation", &self.operation)
            .field("switched", &self.is_switched())
            .finish_non_exhaustive()
    }
}

/// Run `f` inside `context`'s namespace and switch back afterwards
///
/// The switch back is attempted exactly once whenever the switch in
/// succeeded, whatever `f` returned. Outcomes:
/// - `f` ok, restore ok: `f`'s value
/// - `f` failed, restore ok: `f`'s error unchanged
/// - restore failed: [`Error::NamespaceRestore`], carrying `f`'s error (if
///   any) as its [`primary`](Error::primary)
///
/// # Errors
/// See above; a failed switch in returns [`Error::NamespaceSwitch`] without
/// running `f`.
pub fn run_in_namespace<T, F>(
    provider: &dyn NamespaceProvider,
    context: &NamespaceContext,
    operation: &str,
    f: F,
) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let scope = NamespaceScope::enter(provider, context, operation)?;
    let outcome = f();

    match (scope.exit(), outcome) {
        (Ok(()), outcome) => outcome,
        (Err(restore), Ok(_)) => Err(restore),
        (Err(restore), Err(primary)) => Err(restore.with_primary(primary)),
    }
}
