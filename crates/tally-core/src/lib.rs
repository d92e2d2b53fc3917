//! tally core: the bounded counter, its error surface, and wire codecs.
//!
//! This crate defines the counter state machine and the transport-agnostic
//! command protocol shared by the gateway and client tooling. It carries no
//! transport or runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths must surface as `TallyError`/`Result`; in particular a
//! counter never wraps and a failed operation never changes its value.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod counter;
pub mod error;
pub mod protocol;
pub mod word;

pub use counter::{Counter, SharedCounter, Value};
/// Shared result type.
pub use error::{ClientCode, Result, TallyError};
pub use word::Word;
