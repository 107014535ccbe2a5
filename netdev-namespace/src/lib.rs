//! Network namespace handles, shared contexts and scoped switching
//!
//! This crate provides:
//! - Namespace handle providers (`setns(2)` based and in-memory)
//! - A pool of refcounted per-namespace contexts
//! - Scoped execution that always switches the thread back

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod config;
pub mod pool;
pub mod provider;
pub mod scope;
pub mod system;

pub use config::NetnsConfig;
pub use pool::{NamespaceContext, NamespaceContextPool};
pub use provider::{MockNamespaceProvider, NamespaceHandle, NamespaceProvider, SwitchState};
pub use scope::{NamespaceScope, run_in_namespace};
pub use system::SystemNamespaceProvider;
