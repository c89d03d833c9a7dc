// Epsilon removal.

use g2pfst_core::{EPSILON, StateId, Weight};

use super::connect::connect;
use super::shortest_distance::generic_distance;
use crate::fst::{Arc, Fst, merge_arc};
use crate::FstError;

/// Remove every `eps:eps` arc from `fst`, in place, without changing the
/// weighted relation it represents.
///
/// For each state the epsilon closure (all states reachable over `eps:eps`
/// arcs, with their accumulated weight) is computed with the generic shortest
/// distance. The state then receives every non-epsilon arc and the final
/// weight of each closure member, multiplied by the closure weight. States
/// left useless afterwards are trimmed with [`connect`].
pub fn rm_epsilon(fst: &mut Fst) -> Result<(), FstError> {
    let semiring = fst.semiring();
    let is_eps = |a: &Arc| a.ilabel == EPSILON && a.olabel == EPSILON;

    let mut new_states: Vec<(Weight, Vec<Arc>)> = Vec::with_capacity(fst.num_states());
    for s in fst.state_ids() {
        let closure = generic_distance(semiring, &[(s, semiring.one())], |q| {
            fst.arcs(q)
                .iter()
                .filter(|a| is_eps(a))
                .map(|a| (a.nextstate, a.weight))
                .collect::<Vec<_>>()
        })?;

        let mut members: Vec<(StateId, Weight)> = closure.into_iter().collect();
        members.sort_unstable_by_key(|&(q, _)| q);

        let mut final_weight = semiring.zero();
        let mut arcs: Vec<Arc> = Vec::new();
        for (q, dq) in members {
            if fst.is_final(q) {
                let fq = fst.final_weight(q).unwrap_or(semiring.zero());
                final_weight = semiring.plus(final_weight, semiring.times(dq, fq));
            }
            for arc in fst.arcs(q).iter().filter(|a| !is_eps(a)) {
                let w = semiring.times(dq, arc.weight);
                merge_arc(semiring, &mut arcs, Arc { weight: w, ..*arc });
            }
        }
        new_states.push((final_weight, arcs));
    }

    for (state, (final_weight, arcs)) in fst.states.iter_mut().zip(new_states) {
        state.final_weight = final_weight;
        state.arcs = arcs;
    }
    connect(fst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use g2pfst_core::Semiring;

    #[test]
    fn removes_epsilon_chain() {
        // 0 -eps/1-> 1 -a/2-> 2 -eps/0.5-> 3(final 0.25)
        let mut fst = Fst::new(Semiring::Tropical);
        for _ in 0..4 {
            fst.add_nonfinal_state();
        }
        fst.set_start(0).unwrap();
        fst.set_final(3, 0.25).unwrap();
        fst.add_arc(0, Arc::new(0, 0, 1.0, 1)).unwrap();
        fst.add_arc(1, Arc::new(1, 1, 2.0, 2)).unwrap();
        fst.add_arc(2, Arc::new(0, 0, 0.5, 3)).unwrap();

        rm_epsilon(&mut fst).unwrap();

        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.arcs(0), &[Arc::new(1, 1, 3.0, 1)]);
        assert_eq!(fst.final_weight(1), Some(Weight::new(0.75)));
        assert!(fst.states().iter().flat_map(|s| s.arcs()).all(|a| a.ilabel != 0));
    }

    #[test]
    fn keeps_one_sided_epsilons() {
        let mut fst = Fst::new(Semiring::Tropical);
        let s0 = fst.add_nonfinal_state();
        let s1 = fst.add_state(0.0);
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, Arc::new(0, 3, 1.0, s1)).unwrap();
        rm_epsilon(&mut fst).unwrap();
        assert_eq!(fst.arcs(0), &[Arc::new(0, 3, 1.0, 1)]);
    }

    #[test]
    fn epsilon_paths_to_final_merge_in_log() {
        // Two epsilon routes from 0 to final state 2.
        let mut fst = Fst::new(Semiring::Log);
        for _ in 0..3 {
            fst.add_nonfinal_state();
        }
        fst.set_start(0).unwrap();
        fst.set_final(2, 0.0).unwrap();
        fst.add_arc(0, Arc::new(0, 0, 1.0, 2)).unwrap();
        fst.add_arc(0, Arc::new(0, 0, 1.0, 1)).unwrap();
        fst.add_arc(1, Arc::new(0, 0, 1.0, 2)).unwrap();

        rm_epsilon(&mut fst).unwrap();
        assert_eq!(fst.num_states(), 1);
        let expected = Semiring::Log.plus(Weight::new(1.0), Weight::new(2.0));
        assert_eq!(fst.final_weight(0), Some(expected));
    }
}
