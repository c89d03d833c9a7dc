// Foreign model import: a sequential reader trait and the readers built on it.

pub mod att;
pub mod openfst;

pub use att::{AttModel, export_att};
pub use openfst::OpenFstModel;

use g2pfst_core::{Label, Semiring, StateId, SymbolTable, Weight};

use crate::fst::{Arc, Fst};
use crate::FormatError;

/// Sequential read access to a graph held in some foreign representation.
///
/// [`import`] walks a source state by state and arc by arc; a source never
/// needs to expose its internal layout.
pub trait FstSource {
    fn semiring(&self) -> Semiring;

    fn num_states(&self) -> usize;

    fn start(&self) -> Option<StateId>;

    fn final_weight(&self, state: StateId) -> Weight;

    fn num_arcs(&self, state: StateId) -> usize;

    fn arc(&self, state: StateId, index: usize) -> Option<Arc>;

    /// Ids present in the input symbol table, ascending, or `None` when the
    /// source carries no input symbol table.
    fn input_symbol_ids(&self) -> Option<Vec<Label>>;

    fn input_symbol(&self, id: Label) -> Option<&str>;

    /// Ids present in the output symbol table, ascending, or `None` when the
    /// source carries no output symbol table.
    fn output_symbol_ids(&self) -> Option<Vec<Label>>;

    fn output_symbol(&self, id: Label) -> Option<&str>;
}

/// Build an [`Fst`] from `source`.
///
/// The graph is assembled privately and returned only once every state, arc
/// and symbol has been read, so a failing source never leaks a partial graph.
/// Arcs are added through [`Fst::add_arc`] and therefore merge like any other
/// insertion.
pub fn import<S: FstSource + ?Sized>(source: &S) -> Result<Fst, FormatError> {
    let mut fst = Fst::new(source.semiring());
    let num_states = source.num_states();
    for s in 0..num_states {
        fst.add_state(source.final_weight(s));
    }
    for s in 0..num_states {
        for i in 0..source.num_arcs(s) {
            let arc = source
                .arc(s, i)
                .ok_or_else(|| FormatError::Corrupt(format!("missing arc {i} of state {s}")))?;
            fst.add_arc(s, arc)?;
        }
    }
    if let Some(start) = source.start() {
        fst.set_start(start)?;
    }

    fst.set_input_symbols(collect_symbols(source.input_symbol_ids(), |id| {
        source.input_symbol(id)
    })?);
    fst.set_output_symbols(collect_symbols(source.output_symbol_ids(), |id| {
        source.output_symbol(id)
    })?);

    tracing::info!(
        semiring = %fst.semiring(),
        states = fst.num_states(),
        arcs = fst.num_arcs(),
        "imported fst"
    );
    Ok(fst)
}

fn collect_symbols<'a>(
    ids: Option<Vec<Label>>,
    lookup: impl Fn(Label) -> Option<&'a str>,
) -> Result<Option<SymbolTable>, FormatError> {
    let Some(ids) = ids else {
        return Ok(None);
    };
    let mut table = SymbolTable::new();
    for id in ids {
        if let Some(symbol) = lookup(id) {
            table
                .put(id, symbol)
                .map_err(|e| FormatError::InvalidSymbolTable(e.to_string()))?;
        }
    }
    Ok(Some(table))
}
