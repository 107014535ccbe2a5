//! `setns(2)` based namespace provider

use nix::sched::{CloneFlags, setns};
use nix::sys::signal::{SigSet, SigmaskHow, pthread_sigmask};
use std::fs::{self, File};
use std::os::fd::OwnedFd;
use tracing::{debug, trace};

use netdev_core::{Error, Result};

use crate::config::NetnsConfig;
use crate::provider::{NamespaceHandle, NamespaceProvider, SwitchState};

/// Namespace provider switching the calling thread with `setns(2)`
///
/// Switching requires `CAP_SYS_ADMIN`. While the thread is inside another
/// namespace all signals are blocked (see [`NetnsConfig::block_signals`]) so
/// that no handler runs in the wrong namespace.
#[derive(Debug, Clone, Default)]
pub struct SystemNamespaceProvider {
    config: NetnsConfig,
}

impl SystemNamespaceProvider {
    /// Create a new provider
    #[must_use]
    pub const fn new(config: NetnsConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &NetnsConfig {
        &self.config
    }

    /// List the named namespaces in the run directory, sorted
    ///
    /// A missing directory means no namespaces.
    pub fn list_namespaces(&self) -> Result<Vec<String>> {
        let dir = match fs::read_dir(&self.config.run_dir) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut names = Vec::new();
        for entry in dir {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        names.sort();
        Ok(names)
    }

    /// Check whether a named namespace exists
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.config
            .namespace_path(name)
            .is_some_and(|path| path.exists())
    }

    fn block_signals(&self, target: &str) -> Result<Option<SigSet>> {
        if !self.config.block_signals {
            return Ok(None);
        }

        let mut previous = SigSet::empty();
        pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&SigSet::all()), Some(&mut previous)).map_err(
            |e| Error::NamespaceSwitch {
                namespace: target.to_string(),
                message: format!("Failed to block signals: {e}"),
            },
        )?;

        Ok(Some(previous))
    }

    fn restore_signals(target: &str, previous: Option<&SigSet>) -> Result<()> {
        let Some(previous) = previous else {
            return Ok(());
        };

        pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(previous), None).map_err(|e| {
            Error::NamespaceSwitch {
                namespace: target.to_string(),
                message: format!("Failed to restore signal mask: {e}"),
            }
        })
    }
}

impl NamespaceProvider for SystemNamespaceProvider {
    fn open(&self, name: &str) -> Result<NamespaceHandle> {
        let path = self
            .config
            .namespace_path(name)
            .ok_or_else(|| Error::NamespaceOpen {
                namespace: name.to_string(),
                message: "Invalid namespace name".to_string(),
            })?;

        debug!(netns = %name, path = %path.display(), "Opening namespace");

        let file = File::open(&path).map_err(|e| Error::NamespaceOpen {
            namespace: name.to_string(),
            message: format!("{}: {e}", path.display()),
        })?;

        Ok(NamespaceHandle::from_fd(name, OwnedFd::from(file)))
    }

    fn enter(&self, handle: &NamespaceHandle) -> Result<SwitchState> {
        let target = handle.name();
        let fd = handle.as_fd().ok_or_else(|| Error::NamespaceSwitch {
            namespace: target.to_string(),
            message: "Handle has no namespace descriptor".to_string(),
        })?;

        // Save the current namespace so exit can come back to it
        let previous = File::open(&self.config.self_netns_path).map_err(|e| {
            Error::NamespaceSwitch {
                namespace: target.to_string(),
                message: format!(
                    "Cannot open current namespace {}: {e}",
                    self.config.self_netns_path.display()
                ),
            }
        })?;

        let previous_sigmask = self.block_signals(target)?;

        if let Err(e) = setns(fd, CloneFlags::CLONE_NEWNET) {
            // Still in the original namespace, only the mask needs undoing
            Self::restore_signals(target, previous_sigmask.as_ref())?;
            return Err(Error::NamespaceSwitch {
                namespace: target.to_string(),
                message: e.to_string(),
            });
        }

        trace!(netns = %target, "setns done");

        Ok(SwitchState::new(
            target,
            OwnedFd::from(previous),
            previous_sigmask,
        ))
    }

    fn exit(&self, state: SwitchState) -> Result<()> {
        let target = state.target();

        let Some(previous) = state.previous() else {
            return Err(Error::NamespaceSwitch {
                namespace: target.to_string(),
                message: "No saved namespace to return to".to_string(),
            });
        };

        setns(previous, CloneFlags::CLONE_NEWNET).map_err(|e| Error::NamespaceSwitch {
            namespace: target.to_string(),
            message: e.to_string(),
        })?;

        Self::restore_signals(target, state.previous_sigmask())?;

        trace!(netns = %target, "setns back done");
        Ok(())
    }
}
