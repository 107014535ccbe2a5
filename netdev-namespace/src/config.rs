//! Namespace provider configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory holding named network namespaces (`ip netns add`)
pub const NETNS_RUN_DIR: &str = "/var/run/netns";

/// Path to the calling thread's current network namespace
pub const SELF_NETNS_PATH: &str = "/proc/thread-self/ns/net";

/// Configuration of the system namespace provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetnsConfig {
    /// Directory where named namespaces are bind-mounted
    pub run_dir: PathBuf,

    /// Namespace file saved on enter and restored on exit
    pub self_netns_path: PathBuf,

    /// Block all signals on the thread while it is inside another namespace
    pub block_signals: bool,
}

impl Default for NetnsConfig {
    fn default() -> Self {
        Self {
            run_dir: PathBuf::from(NETNS_RUN_DIR),
            self_netns_path: PathBuf::from(SELF_NETNS_PATH),
            block_signals: true,
        }
    }
}

impl NetnsConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the named namespace directory
    #[must_use]
    pub fn with_run_dir(mut self, run_dir: impl Into<PathBuf>) -> Self {
        self.run_dir = run_dir.into();
        self
    }

    /// Set the path used to save the current namespace
    #[must_use]
    pub fn with_self_netns_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.self_netns_path = path.into();
        self
    }

    /// Enable or disable signal blocking during a switch
    #[must_use]
    pub const fn with_block_signals(mut self, enable: bool) -> Self {
        self.block_signals = enable;
        self
    }

    /// Resolve a namespace name to the file backing it
    ///
    /// Absolute paths (e.g. `/proc/1234/ns/net`) are used verbatim. Other names
    /// are looked up in [`run_dir`](Self::run_dir). Returns `None` for names
    /// that could escape the directory.
    #[must_use]
    pub fn namespace_path(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }

        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return None;
        }

        Some(self.run_dir.join(name))
    }
}
