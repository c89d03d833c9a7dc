//! Weighted finite state transducer engine.
//!
//! This crate holds the mutable graph model, the native model file format,
//! importers for foreign formats and the graph operations used by the
//! grapheme-to-phoneme decoder.
//!
//! # Architecture
//!
//! - [`fst`] -- Arena graph: states, arcs, start state, symbol tables
//! - [`format`] -- Native versioned binary model format (save/load)
//! - [`import`] -- `FstSource` reader trait, OpenFst binary and AT&T text
//! - [`ops`] -- ArcSort, Compose, Project, RmEpsilon, Connect, Reverse,
//!   ShortestDistance, NShortestPaths, Determinize

pub mod format;
pub mod fst;
pub mod import;
pub mod ops;

pub use fst::{Arc, Fst, State};
pub use g2pfst_core::{EPSILON, Label, Semiring, SemiringError, StateId, SymbolTable, Weight};

use g2pfst_core::SymbolError;

/// Error type for graph construction and graph operations.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("state {state} out of range (fst has {num_states} states)")]
    StateOutOfRange { state: StateId, num_states: usize },
    #[error("fst has no start state")]
    NoStart,
    #[error("semiring mismatch: {left} vs {right}")]
    SemiringMismatch { left: Semiring, right: Semiring },
    #[error("incompatible symbol tables: {0}")]
    IncompatibleSymbols(&'static str),
    #[error("{operation} requires an acceptor")]
    NotAnAcceptor { operation: &'static str },
    #[error("{operation} exceeded its safety limit of {limit}")]
    LimitExceeded { operation: &'static str, limit: usize },
    #[error(transparent)]
    Semiring(#[from] SemiringError),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
}

/// Error type for reading and writing models in any supported format.
///
/// A load either yields a complete [`Fst`] or one of these; partially built
/// graphs are never returned.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid magic number in model header")]
    InvalidMagic,
    #[error("unsupported model version {0}")]
    UnsupportedVersion(u8),
    #[error("file too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid symbol table: {0}")]
    InvalidSymbolTable(String),
    #[error("corrupt model: {0}")]
    Corrupt(String),
    #[error("unsupported fst type {0:?}")]
    UnsupportedFstType(String),
    #[error("unsupported arc type {0:?}")]
    UnsupportedArcType(String),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Semiring(#[from] SemiringError),
    #[error(transparent)]
    Fst(#[from] FstError),
}

/// Safety limit on the number of iterations of fixed-point loops
/// (shortest distance relaxation, N-best queue pops, subset construction).
pub const MAX_LOOP_COUNT: usize = 10_000_000;
