// Semiring algebra: Tropical (min, +), Log (log-add, +) and Probability (+, *).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::weight::{Weight, round_default};

/// Error type for semiring operations that have no defined result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemiringError {
    #[error("{operation} is not supported in the {semiring} semiring")]
    Unsupported {
        semiring: Semiring,
        operation: &'static str,
    },
    #[error("unknown semiring tag {0}")]
    UnknownTag(u8),
    #[error("unknown semiring name {0:?}")]
    UnknownName(String),
}

/// The closed set of semirings supported by the engine.
///
/// Every weight operation in a graph goes through the graph's `Semiring`
/// value. Binary operations on non-member operands return
/// [`Weight::INVALID`] instead of failing, which lets composition and search
/// loops skip unreachable branches cheaply. Results of `plus`, `times` and
/// `divide` are rounded to [`PRECISION_DIGITS`](crate::PRECISION_DIGITS)
/// decimal digits.
///
/// New semirings are registered by adding a variant here together with its
/// serialized tag in [`Semiring::tag`] / [`Semiring::from_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semiring {
    /// (min, +, +inf, 0). Idempotent; path weights are costs.
    #[default]
    Tropical,
    /// (-log(e^-a + e^-b), +, +inf, 0). Negative log probabilities.
    Log,
    /// (+, *, 0, 1). Plain probabilities.
    Probability,
}

impl Semiring {
    /// All registered semirings, in tag order.
    pub const ALL: [Semiring; 3] = [Semiring::Tropical, Semiring::Log, Semiring::Probability];

    /// The additive identity.
    #[inline]
    pub fn zero(self) -> Weight {
        match self {
            Semiring::Tropical | Semiring::Log => Weight::INFINITY,
            Semiring::Probability => Weight::new(0.0),
        }
    }

    /// The multiplicative identity.
    #[inline]
    pub fn one(self) -> Weight {
        match self {
            Semiring::Tropical | Semiring::Log => Weight::new(0.0),
            Semiring::Probability => Weight::new(1.0),
        }
    }

    /// Whether `w` is a valid element of this semiring.
    #[inline]
    pub fn is_member(self, w: Weight) -> bool {
        let v = w.value();
        match self {
            Semiring::Tropical | Semiring::Log => !v.is_nan() && v != f64::NEG_INFINITY,
            Semiring::Probability => !v.is_nan() && v >= 0.0,
        }
    }

    /// Semiring addition.
    pub fn plus(self, w1: Weight, w2: Weight) -> Weight {
        if !self.is_member(w1) || !self.is_member(w2) {
            return Weight::INVALID;
        }
        let (a, b) = (w1.value(), w2.value());
        match self {
            Semiring::Tropical => {
                if a < b {
                    w1
                } else {
                    w2
                }
            }
            Semiring::Log => {
                // Zero operands short-circuit; the stable form below would
                // compute inf - inf.
                if a == f64::INFINITY {
                    return w2;
                }
                if b == f64::INFINITY {
                    return w1;
                }
                let min = a.min(b);
                let diff = (a - b).abs();
                Weight::new(round_default(min - (-diff).exp().ln_1p()))
            }
            Semiring::Probability => Weight::new(round_default(a + b)),
        }
    }

    /// Semiring multiplication.
    pub fn times(self, w1: Weight, w2: Weight) -> Weight {
        if !self.is_member(w1) || !self.is_member(w2) {
            return Weight::INVALID;
        }
        let (a, b) = (w1.value(), w2.value());
        match self {
            Semiring::Tropical | Semiring::Log => Weight::new(round_default(a + b)),
            Semiring::Probability => Weight::new(round_default(a * b)),
        }
    }

    /// Semiring division (`w1` divided by `w2`).
    ///
    /// Dividing by `zero` yields [`Weight::INVALID`]; dividing `zero` yields
    /// `zero`. The Probability semiring does not support division and returns
    /// [`SemiringError::Unsupported`].
    pub fn divide(self, w1: Weight, w2: Weight) -> Result<Weight, SemiringError> {
        match self {
            Semiring::Probability => Err(SemiringError::Unsupported {
                semiring: self,
                operation: "divide",
            }),
            Semiring::Tropical | Semiring::Log => {
                if !self.is_member(w1) || !self.is_member(w2) {
                    return Ok(Weight::INVALID);
                }
                if w2 == self.zero() {
                    Ok(Weight::INVALID)
                } else if w1 == self.zero() {
                    Ok(self.zero())
                } else {
                    Ok(Weight::new(round_default(w1.value() - w2.value())))
                }
            }
        }
    }

    /// The reverse weight, used when reversing a graph.
    ///
    /// All three semirings are commutative, so this is the identity.
    #[inline]
    pub fn reverse(self, w: Weight) -> Weight {
        w
    }

    /// The natural order: `w1 < w2` iff `plus(w1, w2) == w1 && w1 != w2`.
    #[inline]
    pub fn natural_less(self, w1: Weight, w2: Weight) -> bool {
        self.plus(w1, w2) == w1 && w1 != w2
    }

    /// Whether `plus(w, w) == w` for every member `w`.
    #[inline]
    pub fn is_idempotent(self) -> bool {
        matches!(self, Semiring::Tropical)
    }

    /// Serialized tag of this semiring.
    pub fn tag(self) -> u8 {
        match self {
            Semiring::Tropical => 0,
            Semiring::Log => 1,
            Semiring::Probability => 2,
        }
    }

    /// Resolve a serialized tag.
    pub fn from_tag(tag: u8) -> Result<Self, SemiringError> {
        match tag {
            0 => Ok(Semiring::Tropical),
            1 => Ok(Semiring::Log),
            2 => Ok(Semiring::Probability),
            other => Err(SemiringError::UnknownTag(other)),
        }
    }

    /// Resolve a semiring by name. Accepts OpenFst arc type names.
    pub fn from_name(name: &str) -> Result<Self, SemiringError> {
        match name {
            "tropical" | "standard" => Ok(Semiring::Tropical),
            "log" => Ok(Semiring::Log),
            "probability" | "prob" => Ok(Semiring::Probability),
            other => Err(SemiringError::UnknownName(other.to_string())),
        }
    }
}

impl fmt::Display for Semiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Semiring::Tropical => "tropical",
            Semiring::Log => "log",
            Semiring::Probability => "probability",
        })
    }
}
