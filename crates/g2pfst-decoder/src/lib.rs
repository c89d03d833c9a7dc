//! Grapheme-to-phoneme decoding over g2pfst models.
//!
//! A model maps grapheme (or grapheme cluster) input symbols to phone output
//! symbols. Decoding an input entry builds an input lattice, composes it with
//! the model, projects the result onto phones and picks the best paths with
//! either Viterbi (lowest cost) or minimum Bayes risk scoring.
//!
//! # Architecture
//!
//! - [`config`] -- `DecoderConfig` knobs with JSON loading
//! - [`clusters`] -- Compound input symbols and their matches in an entry
//! - [`lattice`] -- Input acceptor construction
//! - [`mbr`] -- Linear-BLEU minimum Bayes risk rescoring
//! - [`path`] -- Decoded pronunciations and label-to-phone conversion
//! - [`decoder`] -- `Decoder`, tying the pieces together

pub mod clusters;
pub mod config;
pub mod decoder;
pub mod lattice;
pub mod mbr;
pub mod path;

pub use config::DecoderConfig;
pub use decoder::Decoder;
pub use path::Path;

use g2pfst::{FormatError, FstError, Semiring};

/// Error type for decoder construction and decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// The model file could not be read.
    #[error("failed to load model: {0}")]
    Format(#[from] FormatError),

    /// A graph operation failed while decoding.
    #[error(transparent)]
    Fst(#[from] FstError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The model lacks the named symbol table.
    #[error("model has no {0} symbol table")]
    MissingSymbols(&'static str),

    /// Input symbol id 1 is reserved for the cluster separator.
    #[error("model input symbols have no separator at id 1")]
    MissingSeparator,

    /// Decoding ranks paths by cost, which needs a cost semiring.
    #[error("cannot decode with a {0} model")]
    UnsupportedSemiring(Semiring),
}
