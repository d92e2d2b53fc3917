//! Command execution shared by every transport.
//!
//! HTTP handlers and both WebSocket lanes decode into a
//! [`tally_core::protocol::command::Command`] and run it through
//! [`execute`], so a counter behaves the same whichever way it is reached.

pub mod executor;

pub use executor::execute;
