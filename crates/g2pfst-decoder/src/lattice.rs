// Input lattice: the acceptor a single input entry is turned into before
// composition with the model.

use g2pfst::{Arc, Fst, FstError, Label, Semiring, SymbolTable};

use crate::clusters::ClusterMatch;

/// Sentence-begin symbol.
pub const BEGIN_SYMBOL: &str = "<s>";
/// Sentence-end symbol.
pub const END_SYMBOL: &str = "</s>";

/// Build the input acceptor for `labels`.
///
/// The lattice is a linear chain `<s> l1 l2 ... ln </s>` with one extra arc
/// per cluster match, spanning the tokens the cluster covers. Boundary arcs
/// are left out when `symbols` lacks `<s>` or `</s>`. Both symbol tables of
/// the result are `symbols`, so it composes directly with a model whose input
/// table is `symbols`. All weights are `one`.
pub fn input_lattice(
    labels: &[Label],
    clusters: &[ClusterMatch],
    symbols: &SymbolTable,
    semiring: Semiring,
) -> Result<Fst, FstError> {
    let one = semiring.one();
    let mut fst = Fst::new(semiring);
    let start = fst.add_nonfinal_state();
    fst.set_start(start)?;

    let mut first = start;
    if let Some(begin) = symbols.get_key(BEGIN_SYMBOL) {
        first = fst.add_nonfinal_state();
        fst.add_arc(start, Arc::new(begin, begin, one, first))?;
    }

    // positions[i] is the state before token i; positions[n] follows the last.
    let mut positions = Vec::with_capacity(labels.len() + 1);
    positions.push(first);
    for &label in labels {
        let prev = positions[positions.len() - 1];
        let next = fst.add_nonfinal_state();
        fst.add_arc(prev, Arc::new(label, label, one, next))?;
        positions.push(next);
    }

    let last = positions[labels.len()];
    match symbols.get_key(END_SYMBOL) {
        Some(end) => {
            let done = fst.add_state(one);
            fst.add_arc(last, Arc::new(end, end, one, done))?;
        }
        None => fst.set_final(last, one)?,
    }

    for m in clusters {
        let (Some(&from), Some(&to)) = (positions.get(m.start), positions.get(m.start + m.len))
        else {
            continue;
        };
        fst.add_arc(from, Arc::new(m.label, m.label, one, to))?;
    }

    fst.set_input_symbols(Some(symbols.clone()));
    fst.set_output_symbols(Some(symbols.clone()));
    Ok(fst)
}
