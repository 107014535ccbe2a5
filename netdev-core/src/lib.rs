//! Netdev Core - Foundation types, errors and lifecycle events
//!
//! This crate provides the core abstractions shared by the namespace, link and
//! device crates.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use events::NetdevEvent;
pub use types::{IfIndex, IpPrefix};
