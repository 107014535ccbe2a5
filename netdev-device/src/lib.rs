//! Netdev Device - Managed network interfaces across namespaces
//!
//! This crate provides:
//! - [`Netdev`], one managed interface with its registration state machine
//! - [`DeviceRegistry`], bookkeeping of live device objects
//! - [`NetdevManager`], the allocation context owning the namespace pool,
//!   the registry and the link-control

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_panics_doc)]

pub mod device;
pub mod manager;
pub mod registry;

pub use device::{DevNameCallback, IfUpDownCallback, MtuCallback, Netdev};
pub use manager::NetdevManager;
pub use registry::{DeviceId, DeviceRecord, DeviceRegistry};
