// Weight value wrapper and the integer aliases used throughout the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PRECISION_DIGITS;

/// Arc label (index into an input or output symbol table).
pub type Label = u32;

/// State identifier (index into the owning Fst's state list).
pub type StateId = usize;

/// The reserved epsilon label: no symbol consumed or emitted.
pub const EPSILON: Label = 0;

/// A semiring value.
///
/// `Weight` is a thin wrapper around an `f64`. It carries no semiring of its
/// own: the interpretation of `+inf`, `0` and `1` depends on the [`Semiring`]
/// of the graph it lives in.
///
/// Equality is plain floating-point equality, which is stable because every
/// semiring operation rounds its result to [`PRECISION_DIGITS`] digits.
///
/// [`Semiring`]: crate::Semiring
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(f64);

impl Weight {
    /// Positive infinity (zero of the tropical and log semirings).
    pub const INFINITY: Weight = Weight(f64::INFINITY);
    /// Negative infinity, the canonical invalid weight.
    pub const INVALID: Weight = Weight(f64::NEG_INFINITY);

    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Round to `digits` decimal places. Infinities and NaN pass through.
    pub fn rounded(self, digits: i32) -> Self {
        Self(round(self.0, digits))
    }

    /// A hashable key identifying this value bit-for-bit.
    ///
    /// `-0.0` and `0.0` map to the same key.
    #[inline]
    pub fn key(self) -> u64 {
        if self.0 == 0.0 {
            0.0f64.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl From<f64> for Weight {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<f32> for Weight {
    fn from(value: f32) -> Self {
        Self(value as f64)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == f64::INFINITY {
            f.write_str("Infinity")
        } else if self.0 == f64::NEG_INFINITY {
            f.write_str("-Infinity")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Round `value` to `digits` decimal places, leaving infinities and NaN untouched.
pub fn round(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(digits);
    let r = (value * scale).round() / scale;
    // Normalize negative zero so equal weights compare and hash alike.
    if r == 0.0 { 0.0 } else { r }
}

/// Round to the engine-wide precision.
#[inline]
pub(crate) fn round_default(value: f64) -> f64 {
    round(value, PRECISION_DIGITS)
}
