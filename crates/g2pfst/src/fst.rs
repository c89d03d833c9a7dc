// Mutable arena graph: states own their outgoing arcs, arcs point at states by index.

use std::cmp::Ordering;
use std::fmt;

use g2pfst_core::{Label, Semiring, StateId, SymbolTable, Weight};

use crate::FstError;

/// A weighted transition `(ilabel, olabel, weight, nextstate)`.
///
/// Label `0` is epsilon on either side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: Weight,
    pub nextstate: StateId,
}

impl Arc {
    pub fn new(ilabel: Label, olabel: Label, weight: impl Into<Weight>, nextstate: StateId) -> Self {
        Self {
            ilabel,
            olabel,
            weight: weight.into(),
            nextstate,
        }
    }

    /// Whether `other` has the same labels and destination (weight ignored).
    #[inline]
    pub fn same_transition(&self, other: &Arc) -> bool {
        self.ilabel == other.ilabel
            && self.olabel == other.olabel
            && self.nextstate == other.nextstate
    }
}

/// A state: final weight plus its ordered outgoing arcs.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub(crate) final_weight: Weight,
    pub(crate) arcs: Vec<Arc>,
}

impl State {
    fn new(final_weight: Weight) -> Self {
        Self {
            final_weight,
            arcs: Vec::new(),
        }
    }

    #[inline]
    pub fn final_weight(&self) -> Weight {
        self.final_weight
    }

    #[inline]
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    #[inline]
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    #[inline]
    pub fn arc(&self, index: usize) -> Option<&Arc> {
        self.arcs.get(index)
    }
}

/// A weighted finite state transducer.
///
/// States live in a `Vec` and are addressed by their index; arcs refer to
/// their destination by index, so cycles need no shared ownership. The graph
/// owns its optional input and output symbol tables and the [`Semiring`]
/// that interprets every weight in it.
///
/// Equality is structural: same semiring, start, symbol tables and states
/// (final weights and arc lists in their current order).
#[derive(Debug, Clone, PartialEq)]
pub struct Fst {
    pub(crate) semiring: Semiring,
    pub(crate) states: Vec<State>,
    pub(crate) start: Option<StateId>,
    pub(crate) isyms: Option<SymbolTable>,
    pub(crate) osyms: Option<SymbolTable>,
}

impl Fst {
    /// An empty graph (no states, no start) over `semiring`.
    pub fn new(semiring: Semiring) -> Self {
        Self {
            semiring,
            states: Vec::new(),
            start: None,
            isyms: None,
            osyms: None,
        }
    }

    #[inline]
    pub fn semiring(&self) -> Semiring {
        self.semiring
    }

    #[inline]
    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    pub fn set_start(&mut self, state: StateId) -> Result<(), FstError> {
        self.check_state(state)?;
        self.start = Some(state);
        Ok(())
    }

    pub fn clear_start(&mut self) {
        self.start = None;
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Total number of arcs over all states.
    pub fn num_arcs(&self) -> usize {
        self.states.iter().map(State::num_arcs).sum()
    }

    #[inline]
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    #[inline]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// State ids in ascending order.
    pub fn state_ids(&self) -> std::ops::Range<StateId> {
        0..self.states.len()
    }

    /// Append a state with the given final weight and return its id.
    ///
    /// Pass `semiring().zero()` for a non-final state.
    pub fn add_state(&mut self, final_weight: impl Into<Weight>) -> StateId {
        self.states.push(State::new(final_weight.into()));
        self.states.len() - 1
    }

    /// Append a non-final state.
    pub fn add_nonfinal_state(&mut self) -> StateId {
        let zero = self.semiring.zero();
        self.add_state(zero)
    }

    #[inline]
    pub fn final_weight(&self, state: StateId) -> Option<Weight> {
        self.states.get(state).map(State::final_weight)
    }

    pub fn set_final(&mut self, state: StateId, weight: impl Into<Weight>) -> Result<(), FstError> {
        self.check_state(state)?;
        self.states[state].final_weight = weight.into();
        Ok(())
    }

    /// A state is final iff its final weight differs from the semiring zero.
    pub fn is_final(&self, state: StateId) -> bool {
        self.final_weight(state)
            .is_some_and(|w| w != self.semiring.zero())
    }

    #[inline]
    pub fn arc(&self, state: StateId, index: usize) -> Option<&Arc> {
        self.states.get(state)?.arc(index)
    }

    /// The outgoing arcs of `state`, or an empty slice for an unknown state.
    #[inline]
    pub fn arcs(&self, state: StateId) -> &[Arc] {
        self.states.get(state).map(State::arcs).unwrap_or(&[])
    }

    /// Add an arc leaving `state`.
    ///
    /// An existing arc with the same `(ilabel, olabel, nextstate)` absorbs the
    /// new one: its weight becomes `plus(old, new)`. Otherwise the arc is
    /// appended.
    pub fn add_arc(&mut self, state: StateId, arc: Arc) -> Result<(), FstError> {
        self.check_state(state)?;
        self.check_state(arc.nextstate)?;
        merge_arc(self.semiring, &mut self.states[state].arcs, arc);
        Ok(())
    }

    /// Delete one state and every arc that enters it.
    pub fn delete_state(&mut self, state: StateId) -> Result<(), FstError> {
        self.delete_states(&[state])
    }

    /// Delete a set of states and every arc entering them.
    ///
    /// Surviving states are renumbered contiguously in their previous relative
    /// order and every remaining arc is rewritten to the new ids. Deleting the
    /// start state leaves the graph without a start.
    pub fn delete_states(&mut self, states: &[StateId]) -> Result<(), FstError> {
        for &s in states {
            self.check_state(s)?;
        }
        if states.is_empty() {
            return Ok(());
        }

        let mut dead = vec![false; self.states.len()];
        for &s in states {
            dead[s] = true;
        }

        let mut remap: Vec<Option<StateId>> = Vec::with_capacity(self.states.len());
        let mut next_id = 0;
        for &is_dead in &dead {
            if is_dead {
                remap.push(None);
            } else {
                remap.push(Some(next_id));
                next_id += 1;
            }
        }

        let old_states = std::mem::take(&mut self.states);
        self.states = old_states
            .into_iter()
            .zip(dead)
            .filter(|(_, is_dead)| !is_dead)
            .map(|(mut state, _)| {
                state.arcs.retain_mut(|arc| match remap[arc.nextstate] {
                    Some(new_id) => {
                        arc.nextstate = new_id;
                        true
                    }
                    None => false,
                });
                state
            })
            .collect();

        self.start = self.start.and_then(|s| remap[s]);
        Ok(())
    }

    /// Stable-sort the arcs of one state with `compare`.
    pub fn arc_sort_state<F>(&mut self, state: StateId, compare: F) -> Result<(), FstError>
    where
        F: FnMut(&Arc, &Arc) -> Ordering,
    {
        self.check_state(state)?;
        self.states[state].arcs.sort_by(compare);
        Ok(())
    }

    #[inline]
    pub fn input_symbols(&self) -> Option<&SymbolTable> {
        self.isyms.as_ref()
    }

    #[inline]
    pub fn output_symbols(&self) -> Option<&SymbolTable> {
        self.osyms.as_ref()
    }

    pub fn set_input_symbols(&mut self, symbols: Option<SymbolTable>) {
        self.isyms = symbols;
    }

    pub fn set_output_symbols(&mut self, symbols: Option<SymbolTable>) {
        self.osyms = symbols;
    }

    /// Whether every arc has `ilabel == olabel`.
    pub fn is_acceptor(&self) -> bool {
        self.states
            .iter()
            .flat_map(|s| s.arcs.iter())
            .all(|a| a.ilabel == a.olabel)
    }

    /// Reverse adjacency: for each state, the states with an arc into it.
    pub(crate) fn predecessors(&self) -> Vec<Vec<StateId>> {
        let mut preds = vec![Vec::new(); self.states.len()];
        for (s, state) in self.states.iter().enumerate() {
            for arc in &state.arcs {
                preds[arc.nextstate].push(s);
            }
        }
        preds
    }

    #[inline]
    pub(crate) fn check_state(&self, state: StateId) -> Result<(), FstError> {
        if state < self.states.len() {
            Ok(())
        } else {
            Err(FstError::StateOutOfRange {
                state,
                num_states: self.states.len(),
            })
        }
    }

    pub(crate) fn input_label_text(&self, label: Label) -> String {
        label_text(self.isyms.as_ref(), label)
    }

    pub(crate) fn output_label_text(&self, label: Label) -> String {
        label_text(self.osyms.as_ref(), label)
    }
}

/// Append `arc` to `arcs`, or fold it into an existing arc with the same
/// labels and destination.
pub(crate) fn merge_arc(semiring: Semiring, arcs: &mut Vec<Arc>, arc: Arc) {
    match arcs.iter_mut().find(|a| a.same_transition(&arc)) {
        Some(existing) => existing.weight = semiring.plus(existing.weight, arc.weight),
        None => arcs.push(arc),
    }
}

fn label_text(symbols: Option<&SymbolTable>, label: Label) -> String {
    symbols
        .and_then(|t| t.get_value(label))
        .map(str::to_string)
        .unwrap_or_else(|| label.to_string())
}

/// AT&T text rendering.
///
/// Arcs of the start state come first so the first row names the start.
/// A start state without arcs is introduced by its final-weight row.
/// Remaining final states follow the arcs.
impl fmt::Display for Fst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(start) = self.start else {
            return Ok(());
        };
        let order = std::iter::once(start).chain(self.state_ids().filter(|&s| s != start));

        let start_row_written = self.states[start].arcs.is_empty();
        if start_row_written {
            writeln!(f, "{start}\t{}", self.states[start].final_weight)?;
        }
        for s in order.clone() {
            for arc in &self.states[s].arcs {
                writeln!(
                    f,
                    "{s}\t{}\t{}\t{}\t{}",
                    arc.nextstate,
                    self.input_label_text(arc.ilabel),
                    self.output_label_text(arc.olabel),
                    arc.weight
                )?;
            }
        }
        for s in order {
            if start_row_written && s == start {
                continue;
            }
            if self.is_final(s) {
                writeln!(f, "{s}\t{}", self.states[s].final_weight)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A small 3-state example:
    /// 0 -a:x/0.5-> 1 -b:y/1.5-> 2, 0 -c:z/2.5-> 2, state 2 final with 3.5.
    pub(crate) fn three_state() -> Fst {
        let mut fst = Fst::new(Semiring::Tropical);
        let s0 = fst.add_nonfinal_state();
        let s1 = fst.add_nonfinal_state();
        let s2 = fst.add_state(3.5);
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, Arc::new(1, 1, 0.5, s1)).unwrap();
        fst.add_arc(s0, Arc::new(3, 3, 2.5, s2)).unwrap();
        fst.add_arc(s1, Arc::new(2, 2, 1.5, s2)).unwrap();
        fst.set_input_symbols(Some(SymbolTable::from_symbols(["<eps>", "a", "b", "c"]).unwrap()));
        fst.set_output_symbols(Some(SymbolTable::from_symbols(["<eps>", "x", "y", "z"]).unwrap()));
        fst
    }

    #[test]
    fn add_state_and_arcs() {
        let fst = three_state();
        assert_eq!(fst.num_states(), 3);
        assert_eq!(fst.num_arcs(), 3);
        assert_eq!(fst.start(), Some(0));
        assert!(fst.is_final(2));
        assert!(!fst.is_final(0));
        assert_eq!(fst.arc(0, 1).map(|a| a.nextstate), Some(2));
        assert_eq!(fst.arc(0, 5), None);
        assert_eq!(fst.arc(9, 0), None);
        assert_eq!(fst.final_weight(2), Some(Weight::new(3.5)));
        assert_eq!(fst.final_weight(3), None);
        assert!(fst.arcs(42).is_empty());
    }

    #[test]
    fn add_arc_merges_identical_transitions() {
        let mut fst = Fst::new(Semiring::Log);
        let s0 = fst.add_nonfinal_state();
        let s1 = fst.add_state(0.0);
        fst.add_arc(s0, Arc::new(1, 2, 1.0, s1)).unwrap();
        fst.add_arc(s0, Arc::new(1, 2, 2.0, s1)).unwrap();
        fst.add_arc(s0, Arc::new(1, 3, 2.0, s1)).unwrap();

        assert_eq!(fst.arcs(s0).len(), 2);
        let merged = fst.arc(s0, 0).unwrap();
        assert_eq!(merged.weight, Semiring::Log.plus(Weight::new(1.0), Weight::new(2.0)));
    }

    #[test]
    fn add_arc_rejects_unknown_states() {
        let mut fst = Fst::new(Semiring::Tropical);
        let s0 = fst.add_nonfinal_state();
        let err = fst.add_arc(s0, Arc::new(1, 1, 0.0, 7)).unwrap_err();
        assert!(matches!(err, FstError::StateOutOfRange { state: 7, num_states: 1 }));
        assert!(fst.add_arc(3, Arc::new(1, 1, 0.0, s0)).is_err());
        assert!(fst.set_start(2).is_err());
    }

    #[test]
    fn delete_state_renumbers_and_rewrites_arcs() {
        let mut fst = Fst::new(Semiring::Tropical);
        for _ in 0..4 {
            fst.add_nonfinal_state();
        }
        fst.set_final(3, 0.0).unwrap();
        fst.set_start(0).unwrap();
        fst.add_arc(0, Arc::new(1, 1, 1.0, 1)).unwrap();
        fst.add_arc(0, Arc::new(2, 2, 1.0, 2)).unwrap();
        fst.add_arc(1, Arc::new(3, 3, 1.0, 3)).unwrap();
        fst.add_arc(2, Arc::new(4, 4, 1.0, 3)).unwrap();
        fst.add_arc(3, Arc::new(5, 5, 1.0, 1)).unwrap();

        fst.delete_state(1).unwrap();

        assert_eq!(fst.num_states(), 3);
        assert_eq!(fst.start(), Some(0));
        // old 2 -> 1, old 3 -> 2
        assert_eq!(fst.arcs(0), &[Arc::new(2, 2, 1.0, 1)]);
        assert_eq!(fst.arcs(1), &[Arc::new(4, 4, 1.0, 2)]);
        assert!(fst.arcs(2).is_empty());
        assert!(fst.is_final(2));
        for s in fst.state_ids() {
            for arc in fst.arcs(s) {
                assert!(arc.nextstate < fst.num_states());
            }
        }
    }

    #[test]
    fn deleting_start_clears_it() {
        let mut fst = three_state();
        fst.delete_states(&[0]).unwrap();
        assert_eq!(fst.start(), None);
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.arcs(0), &[Arc::new(2, 2, 1.5, 1)]);
    }

    #[test]
    fn arc_sort_state_orders_arcs() {
        let mut fst = three_state();
        fst.arc_sort_state(0, |a, b| b.ilabel.cmp(&a.ilabel)).unwrap();
        let labels: Vec<Label> = fst.arcs(0).iter().map(|a| a.ilabel).collect();
        assert_eq!(labels, vec![3, 1]);
    }

    #[test]
    fn structural_equality() {
        let a = three_state();
        let mut b = three_state();
        assert_eq!(a, b);
        b.set_final(1, 0.0).unwrap();
        assert_ne!(a, b);
        let mut c = three_state();
        c.set_output_symbols(None);
        assert_ne!(a, c);
    }

    #[test]
    fn display_is_att_text() {
        let text = three_state().to_string();
        assert_eq!(text, "0\t1\ta\tx\t0.5\n0\t2\tc\tz\t2.5\n1\t2\tb\ty\t1.5\n2\t3.5\n");
    }
}
