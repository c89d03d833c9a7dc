// Decoder configuration knobs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::DecoderError;

/// Options controlling the decoder's search and scoring.
///
/// Every field has a default, so a JSON config only needs the keys it
/// changes: `{"mbr": true, "beam": 4.0}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    /// Highest n-gram order used by the MBR gain.
    pub order: usize,
    /// Scale applied to path costs before computing MBR posteriors.
    pub alpha: f64,
    /// Unigram precision of the linear BLEU approximation.
    pub precision: f64,
    /// Decay of precision between successive n-gram orders.
    pub ratio: f64,
    /// Rescore an N-best pool with minimum Bayes risk instead of Viterbi.
    pub mbr: bool,
    /// Drop partial paths costing more than the best path plus this margin.
    pub beam: Option<f64>,
    /// Size of the candidate pool rescored in MBR mode.
    pub mbr_candidates: usize,
    /// Determinize the output lattice so every phone string appears once.
    pub unique: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            order: 6,
            alpha: 0.6,
            precision: 0.85,
            ratio: 0.72,
            mbr: false,
            beam: None,
            mbr_candidates: 64,
            unique: false,
        }
    }
}

impl DecoderConfig {
    /// Parse a JSON configuration and validate it.
    pub fn from_json(text: &str) -> Result<Self, DecoderError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DecoderError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        tracing::info!(path = %path.display(), ?config, "loaded decoder config");
        Ok(config)
    }

    /// Reject values the scorer cannot work with.
    pub fn validate(&self) -> Result<(), DecoderError> {
        let invalid = |message: String| Err(DecoderError::InvalidConfig(message));
        if self.order == 0 {
            return invalid("order must be at least 1".to_string());
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return invalid(format!("alpha must be positive, got {}", self.alpha));
        }
        if !(self.precision > 0.0 && self.precision <= 1.0) {
            return invalid(format!("precision must be in (0, 1], got {}", self.precision));
        }
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return invalid(format!("ratio must be in (0, 1], got {}", self.ratio));
        }
        if let Some(beam) = self.beam {
            if beam.is_nan() || beam < 0.0 {
                return invalid(format!("beam must be non-negative, got {beam}"));
            }
        }
        if self.mbr && self.mbr_candidates == 0 {
            return invalid("mbr_candidates must be at least 1".to_string());
        }
        Ok(())
    }
}
