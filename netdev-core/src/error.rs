//! Error types for netdev

use thiserror::Error;

/// Netdev error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation requires the device to be unregistered
    #[error("Device {device} is already registered")]
    AlreadyRegistered {
        /// Identifying name of the device
        device: String,
    },

    /// Unregister called on a device that is not registered
    #[error("Device {device} is already unregistered")]
    AlreadyUnregistered {
        /// Identifying name of the device
        device: String,
    },

    /// Operation requires the device to be registered
    #[error("Device {device} is not registered")]
    NotRegistered {
        /// Identifying name of the device
        device: String,
    },

    /// Interface index does not resolve to an interface
    #[error("No such device: ifindex {ifindex}")]
    NoSuchDevice {
        /// Interface index that failed to resolve
        ifindex: u32,
    },

    /// Namespace handle could not be opened
    #[error("Cannot open namespace '{namespace}': {message}")]
    NamespaceOpen {
        /// Namespace name
        namespace: String,
        /// Error message
        message: String,
    },

    /// Shared namespace context could not be acquired
    #[error("Cannot acquire context for namespace '{namespace}': {source}")]
    ContextAcquisition {
        /// Namespace name
        namespace: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Switching the calling thread into a namespace failed
    #[error("Cannot switch to namespace '{namespace}': {message}")]
    NamespaceSwitch {
        /// Namespace name
        namespace: String,
        /// Error message
        message: String,
    },

    /// Switching back out of a namespace failed; the thread is left in
    /// `namespace`.
    #[error("Cannot switch back from namespace '{namespace}': {message}")]
    NamespaceRestore {
        /// Namespace the thread is stuck in
        namespace: String,
        /// Error message
        message: String,
        /// Failure of the operation that ran inside the namespace, if any
        primary: Option<Box<Error>>,
    },

    /// Operation not supported by the link-control in use
    #[error("Operation not supported: {operation}")]
    Unsupported {
        /// Operation name
        operation: String,
    },

    /// Link-control query or mutation failed
    #[error("Link control error during {operation}: {message}")]
    LinkControl {
        /// Operation name
        operation: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Attach the failure of the wrapped operation to a restore failure.
    ///
    /// Any other error kind is returned unchanged.
    #[must_use]
    pub fn with_primary(self, error: Self) -> Self {
        match self {
            Self::NamespaceRestore {
                namespace,
                message,
                primary: None,
            } => Self::NamespaceRestore {
                namespace,
                message,
                primary: Some(Box::new(error)),
            },
            other => other,
        }
    }

    /// The failure of the operation that ran before a restore failure
    #[must_use]
    pub fn primary(&self) -> Option<&Self> {
        match self {
            Self::NamespaceRestore { primary, .. } => primary.as_deref(),
            _ => None,
        }
    }

    /// Whether the calling thread may have been left in the wrong namespace
    #[must_use]
    pub const fn is_restore_failure(&self) -> bool {
        matches!(self, Self::NamespaceRestore { .. })
    }
}

/// Result type alias for netdev operations
pub type Result<T> = std::result::Result<T, Error>;
