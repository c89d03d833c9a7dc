// g2pfst-cli: shared utilities for the command line tools.

use std::borrow::Cow;
use std::fmt::Display;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Args, ValueEnum};
use g2pfst::Semiring;
use g2pfst_core::Weight;
use g2pfst_decoder::{DecoderConfig, Path};
use tracing_subscriber::EnvFilter;

/// Digits kept when printing a path cost.
const COST_DIGITS: i32 = 4;

/// Install the stderr log subscriber. `RUST_LOG` overrides the `warn` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: impl Display) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Decoder options shared by the decoding tools.
///
/// Flags override values from `--config`, which override the defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct DecodeOptions {
    /// JSON file with decoder settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Rescore with minimum Bayes risk
    #[arg(long)]
    pub mbr: bool,
    /// Prune paths costing more than the best path plus BEAM
    #[arg(long)]
    pub beam: Option<f64>,
    /// Print each distinct pronunciation once
    #[arg(long)]
    pub unique: bool,
    /// MBR n-gram order
    #[arg(long)]
    pub order: Option<usize>,
    /// MBR posterior scale
    #[arg(long)]
    pub alpha: Option<f64>,
    /// MBR unigram precision
    #[arg(long)]
    pub precision: Option<f64>,
    /// MBR precision decay ratio
    #[arg(long)]
    pub ratio: Option<f64>,
    /// Size of the MBR candidate pool
    #[arg(long, value_name = "N")]
    pub mbr_candidates: Option<usize>,
}

impl DecodeOptions {
    /// Resolve the final decoder configuration.
    pub fn to_config(&self) -> anyhow::Result<DecoderConfig> {
        let mut config = match &self.config {
            Some(path) => DecoderConfig::load(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => DecoderConfig::default(),
        };
        config.mbr |= self.mbr;
        config.unique |= self.unique;
        if self.beam.is_some() {
            config.beam = self.beam;
        }
        if let Some(order) = self.order {
            config.order = order;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(precision) = self.precision {
            config.precision = precision;
        }
        if let Some(ratio) = self.ratio {
            config.ratio = ratio;
        }
        if let Some(n) = self.mbr_candidates {
            config.mbr_candidates = n;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Semiring names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SemiringArg {
    Tropical,
    Log,
    Probability,
}

impl From<SemiringArg> for Semiring {
    fn from(arg: SemiringArg) -> Self {
        match arg {
            SemiringArg::Tropical => Semiring::Tropical,
            SemiringArg::Log => Semiring::Log,
            SemiringArg::Probability => Semiring::Probability,
        }
    }
}

/// The word on a dictionary-style input line, as written.
///
/// Only the text before the first double space counts, so
/// `HELLO  HH AH L OW` yields `HELLO`. Blank lines yield `None`.
pub fn entry_word(line: &str) -> Option<&str> {
    let word = line.split("  ").next().unwrap_or_default().trim();
    (!word.is_empty()).then_some(word)
}

/// The form of `word` handed to the decoder; case is folded only on request.
pub fn query_word(word: &str, lowercase: bool) -> Cow<'_, str> {
    if lowercase {
        Cow::Owned(word.to_lowercase())
    } else {
        Cow::Borrowed(word)
    }
}

/// A cost rounded for display; integral values print without a fraction.
pub fn format_cost(cost: Weight) -> String {
    cost.rounded(COST_DIGITS).to_string()
}

/// One output row: `word<TAB>cost<TAB>phones`, echoing the word unchanged.
pub fn format_result(word: &str, path: &Path) -> String {
    format!("{word}\t{}\t{}", format_cost(path.cost), path.pronunciation())
}
