// Decoder: owns a model and turns input entries into ranked pronunciations.
//
// Pipeline per entry:
//   tokens -> input lattice (chain + cluster arcs) -> compose with model
//   -> project onto outputs -> [rm-epsilon + determinize when unique]
//   -> N-best search -> [MBR rescoring] -> phones
//
// The model is input-sorted once at construction so composition can match
// against it without copying. Decoding only borrows the model, so one
// Decoder can serve concurrent callers.

use std::path::Path as FsPath;

use g2pfst::ops::{
    ArcOrder, ProjectType, WeightedPath, arc_sort, compose, determinize, n_shortest_paths,
    project, rm_epsilon,
};
use g2pfst::{EPSILON, Fst, FstError, Label, Semiring, SymbolTable, Weight};
use g2pfst_core::PRECISION_DIGITS;
use ordered_float::OrderedFloat;

use crate::clusters::ClusterTable;
use crate::config::DecoderConfig;
use crate::lattice::input_lattice;
use crate::mbr::rescore;
use crate::path::{Path, labels_to_phones};
use crate::DecoderError;

/// Input symbol id reserved for the cluster separator.
const SEPARATOR_ID: Label = 1;

/// A grapheme-to-phoneme decoder over one immutable model.
#[derive(Debug, Clone)]
pub struct Decoder {
    model: Fst,
    separator: String,
    clusters: ClusterTable,
    config: DecoderConfig,
}

impl Decoder {
    /// Prepare `model` for decoding.
    ///
    /// The model needs both symbol tables, a start state, a cost semiring
    /// (tropical or log) and the cluster separator at input id 1.
    pub fn new(mut model: Fst, config: DecoderConfig) -> Result<Self, DecoderError> {
        config.validate()?;
        if model.semiring() == Semiring::Probability {
            return Err(DecoderError::UnsupportedSemiring(model.semiring()));
        }
        if model.start().is_none() {
            return Err(FstError::NoStart.into());
        }
        let isyms = model
            .input_symbols()
            .ok_or(DecoderError::MissingSymbols("input"))?;
        if model.output_symbols().is_none() {
            return Err(DecoderError::MissingSymbols("output"));
        }
        let separator = isyms
            .get_value(SEPARATOR_ID)
            .ok_or(DecoderError::MissingSeparator)?
            .to_string();
        let clusters = ClusterTable::from_symbols(isyms, &separator);

        arc_sort(&mut model, ArcOrder::Input);
        tracing::info!(
            states = model.num_states(),
            arcs = model.num_arcs(),
            clusters = clusters.len(),
            separator = %separator,
            "decoder ready"
        );
        Ok(Self {
            model,
            separator,
            clusters,
            config,
        })
    }

    /// Load a native model file and prepare it for decoding.
    pub fn load(path: impl AsRef<FsPath>, config: DecoderConfig) -> Result<Self, DecoderError> {
        let model = Fst::load_model(path)?;
        Self::new(model, config)
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Replace the configuration after validating it.
    pub fn set_config(&mut self, config: DecoderConfig) -> Result<(), DecoderError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn model(&self) -> &Fst {
        &self.model
    }

    /// The separator symbol joining cluster parts and multi-phone outputs.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn clusters(&self) -> &ClusterTable {
        &self.clusters
    }

    fn input_symbols(&self) -> Result<&SymbolTable, DecoderError> {
        self.model
            .input_symbols()
            .ok_or(DecoderError::MissingSymbols("input"))
    }

    fn output_symbols(&self) -> Result<&SymbolTable, DecoderError> {
        self.model
            .output_symbols()
            .ok_or(DecoderError::MissingSymbols("output"))
    }

    /// Whether `token` is a known input symbol.
    pub fn knows(&self, token: &str) -> bool {
        self.model
            .input_symbols()
            .and_then(|t| t.get_key(token))
            .is_some_and(|l| l != EPSILON)
    }

    /// Decode `word` one character per token.
    pub fn decode_word(&self, word: &str, best: usize) -> Result<Vec<Path>, DecoderError> {
        let tokens: Vec<String> = word.chars().map(String::from).collect();
        self.decode(&tokens, best)
    }

    /// Decode an input entry into at most `best` pronunciations, best first.
    ///
    /// Tokens unknown to the model's input symbols are dropped. An empty
    /// result is not an error: it means the model accepts no path for the
    /// (remaining) input.
    pub fn decode<S: AsRef<str>>(
        &self,
        tokens: &[S],
        best: usize,
    ) -> Result<Vec<Path>, DecoderError> {
        if best == 0 {
            return Ok(Vec::new());
        }
        let isyms = self.input_symbols()?;

        let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
        let mut labels: Vec<Label> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            match isyms.get_key(token) {
                Some(label) if label != EPSILON => {
                    kept.push(token);
                    labels.push(label);
                }
                _ => tracing::debug!(token, "dropping unknown input symbol"),
            }
        }

        let matches = self.clusters.find_matches(&kept);
        let input = input_lattice(&labels, &matches, isyms, self.model.semiring())?;
        let mut lattice = compose(&input, &self.model)?;
        project(&mut lattice, ProjectType::Output);
        if self.config.unique {
            rm_epsilon(&mut lattice)?;
            lattice = determinize(&lattice)?;
        }

        let paths = if self.config.mbr {
            self.decode_mbr(&lattice, best)?
        } else {
            self.decode_viterbi(&lattice, best)?
        };
        tracing::debug!(
            tokens = tokens.len(),
            kept = labels.len(),
            lattice_states = lattice.num_states(),
            results = paths.len(),
            "decoded entry"
        );
        Ok(paths)
    }

    fn to_phones(&self, path: &WeightedPath) -> Result<Vec<String>, DecoderError> {
        Ok(labels_to_phones(&path.olabels, self.output_symbols()?, &self.separator))
    }

    fn decode_viterbi(&self, lattice: &Fst, best: usize) -> Result<Vec<Path>, DecoderError> {
        let mut paths = Vec::new();
        for p in n_shortest_paths(lattice, best, self.config.beam)? {
            let phones = self.to_phones(&p)?;
            paths.push(Path::new(phones, p.weight.rounded(PRECISION_DIGITS)));
        }
        // Costs, lower first. Stable, so equal costs keep search order.
        paths.sort_by_key(|p| OrderedFloat(p.cost.value()));
        Ok(paths)
    }

    fn decode_mbr(&self, lattice: &Fst, best: usize) -> Result<Vec<Path>, DecoderError> {
        let pool_size = best.max(self.config.mbr_candidates);
        let mut pool = Vec::new();
        for p in n_shortest_paths(lattice, pool_size, self.config.beam)? {
            pool.push((self.to_phones(&p)?, p.weight));
        }
        let scores = rescore(&pool, &self.config);
        Ok(scores
            .into_iter()
            .take(best)
            .map(|s| {
                let cost = Weight::new(-s.gain).rounded(PRECISION_DIGITS);
                Path::new(pool[s.index].0.clone(), cost)
            })
            .collect())
    }
}
