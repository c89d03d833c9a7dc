//! Shared value types for the g2pfst weighted finite-state transducer engine.
//!
//! # Architecture
//!
//! - [`weight`] -- `Weight` value wrapper, rounding, label and state id aliases
//! - [`semiring`] -- Tropical, Log and Probability semirings behind one enum
//! - [`symbols`] -- Bijective symbol table mapping labels to strings

pub mod semiring;
pub mod symbols;
pub mod weight;

pub use semiring::{Semiring, SemiringError};
pub use symbols::{EPSILON_SYMBOL, SymbolError, SymbolTable};
pub use weight::{EPSILON, Label, StateId, Weight};

/// Number of decimal digits kept after every semiring operation.
pub const PRECISION_DIGITS: i32 = 5;
