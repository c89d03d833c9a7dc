// Reversal with a super-initial state.

use g2pfst_core::EPSILON;

use crate::fst::{Arc, Fst};
use crate::FstError;

/// The reverse of `fst`: every path read backwards.
///
/// State `s` of the input becomes state `s + 1`; state 0 is a new initial
/// state with an epsilon arc to every former final state, weighted by that
/// final weight. The former start state becomes the only final state.
pub fn reverse(fst: &Fst) -> Result<Fst, FstError> {
    let semiring = fst.semiring();
    let mut result = Fst::new(semiring);
    result.set_input_symbols(fst.input_symbols().cloned());
    result.set_output_symbols(fst.output_symbols().cloned());

    let initial = result.add_nonfinal_state();
    for _ in fst.state_ids() {
        result.add_nonfinal_state();
    }
    result.set_start(initial)?;

    if let Some(start) = fst.start() {
        result.set_final(start + 1, semiring.one())?;
    }

    for s in fst.state_ids() {
        for arc in fst.arcs(s) {
            result.add_arc(
                arc.nextstate + 1,
                Arc::new(arc.ilabel, arc.olabel, semiring.reverse(arc.weight), s + 1),
            )?;
        }
        if fst.is_final(s) {
            let w = fst.final_weight(s).unwrap_or(semiring.zero());
            result.add_arc(initial, Arc::new(EPSILON, EPSILON, semiring.reverse(w), s + 1))?;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use g2pfst_core::Semiring;

    #[test]
    fn reverses_a_chain() {
        let mut fst = Fst::new(Semiring::Tropical);
        let s0 = fst.add_nonfinal_state();
        let s1 = fst.add_nonfinal_state();
        let s2 = fst.add_state(0.5);
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, Arc::new(1, 1, 1.0, s1)).unwrap();
        fst.add_arc(s1, Arc::new(2, 2, 2.0, s2)).unwrap();

        let r = reverse(&fst).unwrap();
        assert_eq!(r.num_states(), 4);
        assert_eq!(r.start(), Some(0));
        assert_eq!(r.arcs(0), &[Arc::new(0, 0, 0.5, 3)]);
        assert_eq!(r.arcs(3), &[Arc::new(2, 2, 2.0, 2)]);
        assert_eq!(r.arcs(2), &[Arc::new(1, 1, 1.0, 1)]);
        assert!(r.is_final(1));
        assert!(!r.is_final(3));
    }
}
