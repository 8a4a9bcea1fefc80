//! Trellis event service
//!
//! Wires the event listener, command queue, and event store into a
//! single runnable service. The binary in `main.rs` drives this crate;
//! everything here is also usable from tests.

pub mod config;
pub mod logging;
pub mod service;
pub mod signals;

#[cfg(test)]
mod integration_tests;
