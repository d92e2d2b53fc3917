//! Transport layer: HTTP handlers, WebSocket session loop, frame codec.

pub mod codec;
pub mod http;
pub mod ws;
