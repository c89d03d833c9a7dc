// Trimming of useless states.

use g2pfst_core::StateId;

use crate::fst::Fst;
use crate::FstError;

/// States reachable from `roots` following `successors`.
fn reachable(num_states: usize, roots: &[StateId], successors: impl Fn(StateId) -> Vec<StateId>) -> Vec<bool> {
    let mut seen = vec![false; num_states];
    let mut stack: Vec<StateId> = Vec::new();
    for &r in roots {
        if !seen[r] {
            seen[r] = true;
            stack.push(r);
        }
    }
    while let Some(s) = stack.pop() {
        for next in successors(s) {
            if !seen[next] {
                seen[next] = true;
                stack.push(next);
            }
        }
    }
    seen
}

/// Remove every state that is not both accessible (reachable from the start)
/// and coaccessible (able to reach a final state).
///
/// Without a start state nothing is accessible and the graph becomes empty.
pub fn connect(fst: &mut Fst) -> Result<(), FstError> {
    let n = fst.num_states();
    let roots: Vec<StateId> = fst.start().into_iter().collect();
    let accessible = reachable(n, &roots, |s| fst.arcs(s).iter().map(|a| a.nextstate).collect());

    let finals: Vec<StateId> = fst.state_ids().filter(|&s| fst.is_final(s)).collect();
    let preds = fst.predecessors();
    let coaccessible = reachable(n, &finals, |s| preds[s].clone());

    let dead: Vec<StateId> = fst
        .state_ids()
        .filter(|&s| !(accessible[s] && coaccessible[s]))
        .collect();
    if !dead.is_empty() {
        tracing::debug!(removed = dead.len(), kept = n - dead.len(), "connect");
    }
    fst.delete_states(&dead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::Arc;
    use g2pfst_core::Semiring;

    #[test]
    fn removes_dead_ends_and_unreachable_states() {
        let mut fst = Fst::new(Semiring::Tropical);
        for _ in 0..5 {
            fst.add_nonfinal_state();
        }
        fst.set_start(0).unwrap();
        fst.set_final(2, 0.0).unwrap();
        fst.add_arc(0, Arc::new(1, 1, 0.0, 1)).unwrap();
        fst.add_arc(1, Arc::new(2, 2, 0.0, 2)).unwrap();
        // dead end
        fst.add_arc(0, Arc::new(3, 3, 0.0, 3)).unwrap();
        // unreachable but coaccessible
        fst.add_arc(4, Arc::new(4, 4, 0.0, 2)).unwrap();

        connect(&mut fst).unwrap();
        assert_eq!(fst.num_states(), 3);
        assert_eq!(fst.arcs(0), &[Arc::new(1, 1, 0.0, 1)]);
        assert_eq!(fst.arcs(1), &[Arc::new(2, 2, 0.0, 2)]);
        assert!(fst.is_final(2));
    }

    #[test]
    fn no_start_empties_the_graph() {
        let mut fst = Fst::new(Semiring::Tropical);
        fst.add_state(0.0);
        connect(&mut fst).unwrap();
        assert_eq!(fst.num_states(), 0);
    }

    #[test]
    fn empty_language_removes_start() {
        let mut fst = Fst::new(Semiring::Tropical);
        let s0 = fst.add_nonfinal_state();
        fst.set_start(s0).unwrap();
        connect(&mut fst).unwrap();
        assert_eq!(fst.num_states(), 0);
        assert_eq!(fst.start(), None);
    }
}
