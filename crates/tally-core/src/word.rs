//! Fixed-width unsigned storage types for counters.
//!
//! A [`Word`] exposes explicit checked steps instead of relying on the
//! arithmetic operators, so a counter can never wrap silently regardless of
//! the build profile. Wider inputs are narrowed through [`Word::from_wide`] or
//! [`parse_decimal`], both of which report values that do not fit.

use std::fmt;

use crate::error::{Result, TallyError};

mod sealed {
    pub trait Sealed {}
}

/// Unsigned integer usable as counter storage.
pub trait Word:
    Copy + Ord + Default + fmt::Debug + fmt::Display + Send + Sync + 'static + sealed::Sealed
{
    /// Lower bound (always zero).
    const ZERO: Self;
    /// Upper bound of the width.
    const MAX: Self;
    /// Width in bits.
    const BITS: u32;

    /// `self + 1`, or `None` at [`Word::MAX`].
    fn checked_incr(self) -> Option<Self>;
    /// `self - 1`, or `None` at [`Word::ZERO`].
    fn checked_decr(self) -> Option<Self>;
    /// Narrow a `u128`, or `None` if it does not fit.
    fn from_wide(v: u128) -> Option<Self>;
}

macro_rules! impl_word {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Word for $t {
                const ZERO: Self = 0;
                const MAX: Self = <$t>::MAX;
                const BITS: u32 = <$t>::BITS;

                #[inline]
                fn checked_incr(self) -> Option<Self> {
                    self.checked_add(1)
                }

                #[inline]
                fn checked_decr(self) -> Option<Self> {
                    self.checked_sub(1)
                }

                #[inline]
                fn from_wide(v: u128) -> Option<Self> {
                    <$t>::try_from(v).ok()
                }
            }
        )*
    };
}

impl_word!(u8, u16, u32, u64, u128);

/// Parse arbitrary-precision decimal text into `W`.
///
/// Digits only, optionally preceded by `-`. Negative numbers (other than
/// `-0`) and numbers above `W::MAX` are `OutOfRange`; anything else that is
/// not a plain decimal integer is `BadRequest`.
pub fn parse_decimal<W: Word>(text: &str) -> Result<W> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TallyError::BadRequest(format!(
            "not a decimal integer: {text:?}"
        )));
    }

    let significant = digits.trim_start_matches('0');
    if negative && !significant.is_empty() {
        return Err(TallyError::OutOfRange(format!("{text} is negative")));
    }

    let mut acc: u128 = 0;
    for b in significant.bytes() {
        acc = acc
            .checked_mul(10)
            .and_then(|a| a.checked_add(u128::from(b - b'0')))
            .ok_or_else(|| out_of_range::<W>(text))?;
    }

    W::from_wide(acc).ok_or_else(|| out_of_range::<W>(text))
}

pub(crate) fn out_of_range<W: Word>(shown: impl fmt::Display) -> TallyError {
    TallyError::OutOfRange(format!("{shown} exceeds {}-bit maximum {}", W::BITS, W::MAX))
}
