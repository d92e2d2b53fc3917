//! tally gateway library entry.
//!
//! This crate hosts counters: it owns the registry of instances and exposes
//! the core counter operations over HTTP and a WebSocket command channel. It
//! is intended to be consumed by the binary (`main.rs`) and by integration
//! tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod registry;
pub mod router;
pub mod transport;
