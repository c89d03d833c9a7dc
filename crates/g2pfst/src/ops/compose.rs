// Composition with an implicit epsilon-matching filter.

use std::borrow::Cow;
use std::collections::VecDeque;

use g2pfst_core::{EPSILON, StateId};
use hashbrown::HashMap;

use super::arcsort::{ArcOrder, arc_sort};
use crate::fst::{Arc, Fst};
use crate::FstError;

/// Filter state after a real match or at the start. Any move is allowed.
const FILTER_ANY: u8 = 0;
/// Filter state after an epsilon move on the right operand alone.
const FILTER_RIGHT_EPS: u8 = 1;
/// Filter state after an epsilon move on the left operand alone.
const FILTER_LEFT_EPS: u8 = 2;

type PairKey = (StateId, StateId, u8);

/// Composition of `a` and `b`: the relation mapping `x` to `z` whenever `a`
/// maps `x` to some `y` and `b` maps that `y` to `z`.
///
/// Only state triples reachable from `(start_a, start_b, 0)` are built.
/// Matching looks up `b`'s arcs by input label with a binary search, so `b`
/// is input-sorted first if it is not already (on a private copy).
///
/// Epsilon moves are serialized by a three-state filter so every successful
/// path of the result corresponds to exactly one pair of paths in the
/// operands:
///
/// - a real match `a.olabel == b.ilabel != 0` is allowed from any filter
///   state and returns it to 0;
/// - simultaneous epsilon moves (`a.olabel == 0 == b.ilabel`) only from 0;
/// - an epsilon move of `b` alone (`a` stays) from 0 or 1, leading to 1;
/// - an epsilon move of `a` alone (`b` stays) from 0 or 2, leading to 2.
///
/// Fails when the semirings differ or when `a`'s output symbols and `b`'s
/// input symbols are both present and differ. A missing start on either side
/// yields an empty result.
pub fn compose(a: &Fst, b: &Fst) -> Result<Fst, FstError> {
    if a.semiring() != b.semiring() {
        return Err(FstError::SemiringMismatch {
            left: a.semiring(),
            right: b.semiring(),
        });
    }
    if let (Some(osyms), Some(isyms)) = (a.output_symbols(), b.input_symbols()) {
        if osyms != isyms {
            return Err(FstError::IncompatibleSymbols(
                "left output symbols differ from right input symbols",
            ));
        }
    }

    let semiring = a.semiring();
    let mut result = Fst::new(semiring);
    result.set_input_symbols(a.input_symbols().cloned());
    result.set_output_symbols(b.output_symbols().cloned());

    let (Some(start_a), Some(start_b)) = (a.start(), b.start()) else {
        return Ok(result);
    };

    let b: Cow<'_, Fst> = if ArcOrder::Input.is_sorted(b) {
        Cow::Borrowed(b)
    } else {
        tracing::debug!("input-sorting right compose operand");
        let mut sorted = b.clone();
        arc_sort(&mut sorted, ArcOrder::Input);
        Cow::Owned(sorted)
    };
    let b = b.as_ref();

    let mut memo: HashMap<PairKey, StateId> = HashMap::new();
    let mut queue: VecDeque<PairKey> = VecDeque::new();

    let mut lookup = |key: PairKey, result: &mut Fst, queue: &mut VecDeque<PairKey>| -> StateId {
        *memo.entry(key).or_insert_with(|| {
            let (q1, q2, _) = key;
            let fw = semiring.times(
                a.final_weight(q1).unwrap_or(semiring.zero()),
                b.final_weight(q2).unwrap_or(semiring.zero()),
            );
            queue.push_back(key);
            result.add_state(fw)
        })
    };

    let start = lookup((start_a, start_b, FILTER_ANY), &mut result, &mut queue);
    result.set_start(start)?;

    while let Some(key @ (q1, q2, filter)) = queue.pop_front() {
        let source = lookup(key, &mut result, &mut queue);
        let b_arcs = b.arcs(q2);
        let b_eps = matching(b_arcs, EPSILON);

        for a1 in a.arcs(q1) {
            if a1.olabel == EPSILON {
                if filter != FILTER_RIGHT_EPS {
                    let target = lookup((a1.nextstate, q2, FILTER_LEFT_EPS), &mut result, &mut queue);
                    result.add_arc(source, Arc::new(a1.ilabel, EPSILON, a1.weight, target))?;
                }
                if filter == FILTER_ANY {
                    for a2 in b_eps {
                        let target =
                            lookup((a1.nextstate, a2.nextstate, FILTER_ANY), &mut result, &mut queue);
                        let w = semiring.times(a1.weight, a2.weight);
                        result.add_arc(source, Arc::new(a1.ilabel, a2.olabel, w, target))?;
                    }
                }
            } else {
                for a2 in matching(b_arcs, a1.olabel) {
                    let target =
                        lookup((a1.nextstate, a2.nextstate, FILTER_ANY), &mut result, &mut queue);
                    let w = semiring.times(a1.weight, a2.weight);
                    result.add_arc(source, Arc::new(a1.ilabel, a2.olabel, w, target))?;
                }
            }
        }

        if filter != FILTER_LEFT_EPS {
            for a2 in b_eps {
                let target = lookup((q1, a2.nextstate, FILTER_RIGHT_EPS), &mut result, &mut queue);
                result.add_arc(source, Arc::new(EPSILON, a2.olabel, a2.weight, target))?;
            }
        }
    }

    tracing::debug!(
        left_states = a.num_states(),
        right_states = b.num_states(),
        states = result.num_states(),
        arcs = result.num_arcs(),
        "composed"
    );
    Ok(result)
}

/// The contiguous run of input-sorted `arcs` whose input label is `label`.
fn matching(arcs: &[Arc], label: g2pfst_core::Label) -> &[Arc] {
    let lo = arcs.partition_point(|arc| arc.ilabel < label);
    let hi = lo + arcs[lo..].partition_point(|arc| arc.ilabel == label);
    &arcs[lo..hi]
}

#[cfg(test)]
mod tests {
    use super::*;
    use g2pfst_core::{Semiring, SymbolTable};

    fn chain(semiring: Semiring, arcs: &[(u32, u32, f64)]) -> Fst {
        let mut fst = Fst::new(semiring);
        let mut prev = fst.add_nonfinal_state();
        fst.set_start(prev).unwrap();
        for &(i, o, w) in arcs {
            let next = fst.add_nonfinal_state();
            fst.add_arc(prev, Arc::new(i, o, w, next)).unwrap();
            prev = next;
        }
        fst.set_final(prev, 0.0).unwrap();
        fst
    }

    #[test]
    fn matching_finds_label_run() {
        let arcs = [
            Arc::new(0, 1, 0.0, 0),
            Arc::new(2, 1, 0.0, 0),
            Arc::new(2, 2, 0.0, 0),
            Arc::new(5, 1, 0.0, 0),
        ];
        assert_eq!(matching(&arcs, 2).len(), 2);
        assert_eq!(matching(&arcs, 0).len(), 1);
        assert!(matching(&arcs, 3).is_empty());
        assert!(matching(&arcs, 9).is_empty());
    }

    #[test]
    fn composes_simple_chains() {
        let a = chain(Semiring::Tropical, &[(1, 2, 0.5), (3, 4, 1.0)]);
        let b = chain(Semiring::Tropical, &[(2, 7, 0.25), (4, 8, 0.25)]);
        let c = compose(&a, &b).unwrap();
        assert_eq!(c.num_states(), 3);
        assert_eq!(c.arcs(0), &[Arc::new(1, 7, 0.75, 1)]);
        assert_eq!(c.arcs(1), &[Arc::new(3, 8, 1.25, 2)]);
        assert!(c.is_final(2));
    }

    #[test]
    fn mismatched_labels_give_no_final_state() {
        let a = chain(Semiring::Tropical, &[(1, 2, 0.0)]);
        let b = chain(Semiring::Tropical, &[(3, 3, 0.0)]);
        let c = compose(&a, &b).unwrap();
        assert_eq!(c.num_states(), 1);
        assert!(!c.is_final(0));
    }

    #[test]
    fn semiring_mismatch_is_an_error() {
        let a = chain(Semiring::Tropical, &[(1, 1, 0.0)]);
        let b = chain(Semiring::Log, &[(1, 1, 0.0)]);
        assert!(matches!(compose(&a, &b), Err(FstError::SemiringMismatch { .. })));
    }

    #[test]
    fn symbol_mismatch_is_an_error() {
        let mut a = chain(Semiring::Tropical, &[(1, 1, 0.0)]);
        let mut b = chain(Semiring::Tropical, &[(1, 1, 0.0)]);
        a.set_output_symbols(Some(SymbolTable::from_symbols(["<eps>", "x"]).unwrap()));
        b.set_input_symbols(Some(SymbolTable::from_symbols(["<eps>", "y"]).unwrap()));
        assert!(matches!(compose(&a, &b), Err(FstError::IncompatibleSymbols(_))));
    }

    #[test]
    fn missing_start_gives_empty_result() {
        let a = Fst::new(Semiring::Tropical);
        let b = chain(Semiring::Tropical, &[(1, 1, 0.0)]);
        let c = compose(&a, &b).unwrap();
        assert_eq!(c.num_states(), 0);
        assert_eq!(c.start(), None);
    }

    #[test]
    fn unsorted_right_operand_is_handled() {
        let a = chain(Semiring::Tropical, &[(1, 3, 0.0)]);
        let mut b = Fst::new(Semiring::Tropical);
        let s0 = b.add_nonfinal_state();
        let s1 = b.add_state(0.0);
        b.set_start(s0).unwrap();
        b.add_arc(s0, Arc::new(5, 5, 0.0, s1)).unwrap();
        b.add_arc(s0, Arc::new(3, 9, 2.0, s1)).unwrap();
        b.add_arc(s0, Arc::new(1, 1, 0.0, s1)).unwrap();
        let c = compose(&a, &b).unwrap();
        assert_eq!(c.arcs(0), &[Arc::new(1, 9, 2.0, 1)]);
    }
}
