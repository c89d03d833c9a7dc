// Grapheme clusters: compound input symbols such as `c|h` that let one
// model arc consume several input tokens.

use g2pfst_core::{Label, SymbolTable};

/// Ids below this are never clusters (epsilon and the separator itself).
const FIRST_CLUSTER_ID: Label = 2;

/// One occurrence of a cluster in an input sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterMatch {
    /// Index of the first covered token.
    pub start: usize,
    /// Number of tokens covered.
    pub len: usize,
    /// The cluster's input label.
    pub label: Label,
}

/// Compound input symbols split into their parts, scanned once per model.
#[derive(Debug, Clone, Default)]
pub struct ClusterTable {
    clusters: Vec<(Label, Vec<String>)>,
}

impl ClusterTable {
    /// Collect every input symbol that contains `separator`.
    pub fn from_symbols(isyms: &SymbolTable, separator: &str) -> Self {
        let mut clusters = Vec::new();
        if separator.is_empty() {
            return Self { clusters };
        }
        for (id, symbol) in isyms.iter() {
            if id < FIRST_CLUSTER_ID || !symbol.contains(separator) {
                continue;
            }
            let parts: Vec<String> = symbol
                .split(separator)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if !parts.is_empty() {
                clusters.push((id, parts));
            }
        }
        tracing::debug!(count = clusters.len(), "loaded input clusters");
        Self { clusters }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Parts of the cluster with input label `label`.
    pub fn parts(&self, label: Label) -> Option<&[String]> {
        self.clusters
            .iter()
            .find(|(id, _)| *id == label)
            .map(|(_, parts)| parts.as_slice())
    }

    /// All occurrences of every cluster in `tokens`.
    ///
    /// Every start position is tried, so occurrences may overlap, both of
    /// the same cluster and of different ones. Results are ordered by cluster
    /// id, then position.
    pub fn find_matches<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<ClusterMatch> {
        let mut matches = Vec::new();
        for (label, parts) in &self.clusters {
            let len = parts.len();
            for (start, window) in tokens.windows(len).enumerate() {
                if window.iter().zip(parts).all(|(t, p)| t.as_ref() == p) {
                    matches.push(ClusterMatch {
                        start,
                        len,
                        label: *label,
                    });
                }
            }
        }
        matches
    }
}
