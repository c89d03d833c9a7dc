// Decoded pronunciations and the label-to-phone conversion.

use std::fmt;

use g2pfst_core::{EPSILON_SYMBOL, Label, SymbolTable, Weight};

use crate::lattice::{BEGIN_SYMBOL, END_SYMBOL};

/// Output symbols that never appear in a pronunciation.
pub const SKIP_SYMBOLS: [&str; 5] = [EPSILON_SYMBOL, BEGIN_SYMBOL, END_SYMBOL, "_", "-"];

/// A decoded pronunciation: the phone sequence and its cost.
///
/// Lower costs are better. In MBR mode the cost is the negated expected gain.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub phones: Vec<String>,
    pub cost: Weight,
}

impl Path {
    pub fn new(phones: Vec<String>, cost: Weight) -> Self {
        Self { phones, cost }
    }

    /// The phones joined by single spaces.
    pub fn pronunciation(&self) -> String {
        self.phones.join(" ")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.cost, self.pronunciation())
    }
}

pub(crate) fn is_skipped(symbol: &str) -> bool {
    SKIP_SYMBOLS.contains(&symbol)
}

/// Turn output labels into phones.
///
/// Skip symbols are dropped, and a symbol containing `separator` expands
/// into its parts (`AH|N` becomes `AH`, `N`). Labels unknown to `osyms` are
/// dropped.
pub fn labels_to_phones(olabels: &[Label], osyms: &SymbolTable, separator: &str) -> Vec<String> {
    let mut phones = Vec::with_capacity(olabels.len());
    for &label in olabels {
        let Some(symbol) = osyms.get_value(label) else {
            tracing::debug!(label, "output label has no symbol");
            continue;
        };
        if is_skipped(symbol) {
            continue;
        }
        if separator.is_empty() || !symbol.contains(separator) {
            phones.push(symbol.to_string());
            continue;
        }
        phones.extend(
            symbol
                .split(separator)
                .filter(|p| !p.is_empty() && !is_skipped(p))
                .map(str::to_string),
        );
    }
    phones
}
