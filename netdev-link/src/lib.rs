//! Link-control: interface queries and mutations with pluggable backends
//!
//! This crate provides the trait the device layer calls once it is already
//! running inside the target namespace, with a system and a mock
//! implementation.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod backend;
pub mod controller;

pub use backend::{LinkCall, LinkControl, LinkState, MockLink, MockLinkControl};
pub use controller::SystemLinkControl;
