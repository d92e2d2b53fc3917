//! The counter state machine.
//!
//! One bounded unsigned value with two guarded transitions. Every mutation is
//! computed first and stored only on success, so a failed call leaves the
//! value exactly as it was.

use std::sync::{Mutex, PoisonError};

use crate::error::{Result, TallyError};
use crate::word::{self, Word};

/// Storage width used by the gateway and the wire protocols.
pub type Value = u128;

/// A single counter instance. Starts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter<W: Word = Value> {
    value: W,
}

impl<W: Word> Default for Counter<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Word> Counter<W> {
    pub fn new() -> Self {
        Self { value: W::ZERO }
    }

    /// Current value.
    pub fn number(&self) -> W {
        self.value
    }

    /// Store `n`. The argument type already bounds it, so this cannot fail.
    pub fn set_number(&mut self, n: W) {
        self.value = n;
    }

    /// Store a value given in a wider type, rejecting what does not fit.
    pub fn set_wide(&mut self, n: u128) -> Result<()> {
        let n = W::from_wide(n).ok_or_else(|| word::out_of_range::<W>(n))?;
        self.value = n;
        Ok(())
    }

    /// Store a value given as decimal text of any length.
    pub fn set_decimal(&mut self, text: &str) -> Result<()> {
        self.value = word::parse_decimal::<W>(text)?;
        Ok(())
    }

    /// Add one. Fails with `Overflow` at `W::MAX`. Returns the new value.
    pub fn increment(&mut self) -> Result<W> {
        let next = self.value.checked_incr().ok_or(TallyError::Overflow)?;
        self.value = next;
        Ok(next)
    }

    /// Subtract one. Fails with `Underflow` at zero. Returns the new value.
    pub fn decrement(&mut self) -> Result<W> {
        let next = self.value.checked_decr().ok_or(TallyError::Underflow)?;
        self.value = next;
        Ok(next)
    }
}

/// A counter that can be driven from many threads at once.
///
/// Guard check and store happen under one lock, so concurrent callers see the
/// same results as some sequential order of their calls.
#[derive(Debug, Default)]
pub struct SharedCounter<W: Word = Value> {
    inner: Mutex<Counter<W>>,
}

impl<W: Word> SharedCounter<W> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Counter::new()),
        }
    }

    // A panic while holding the lock cannot leave a half-applied value: the
    // only write is a single store after the guard passed.
    fn with<R>(&self, f: impl FnOnce(&mut Counter<W>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn number(&self) -> W {
        self.with(|c| c.number())
    }

    pub fn set_number(&self, n: W) {
        self.with(|c| c.set_number(n))
    }

    pub fn set_wide(&self, n: u128) -> Result<()> {
        self.with(|c| c.set_wide(n))
    }

    pub fn set_decimal(&self, text: &str) -> Result<()> {
        self.with(|c| c.set_decimal(text))
    }

    pub fn increment(&self) -> Result<W> {
        self.with(|c| c.increment())
    }

    pub fn decrement(&self) -> Result<W> {
        self.with(|c| c.decrement())
    }
}
