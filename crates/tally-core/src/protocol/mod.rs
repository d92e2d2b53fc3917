//! Protocol modules (Ext/Text + Hot/Binary).
//!
//! Both lanes decode into the same [`command::Command`] and encode the same
//! [`command::Reply`], so a counter behaves identically whichever encoding a
//! client picks:
//! - Ext Lane: JSON envelopes; `value` kept as `RawValue` and parsed with
//!   arbitrary precision before narrowing.
//! - Hot Lane: binary frames with fixed headers and an optional sequence number.
//!
//! All parsers are panic-free: malformed input is reported as `TallyError`
//! instead of panicking or indexing raw buffers.

pub mod command;
pub mod hot;
pub mod text;

/// Protocol version accepted and emitted by both lanes.
pub const PROTOCOL_VERSION: u8 = 1;
