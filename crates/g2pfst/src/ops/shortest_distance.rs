// Single-source shortest distance over an arbitrary semiring.

use std::collections::VecDeque;

use g2pfst_core::{Semiring, StateId, Weight};
use hashbrown::{HashMap, HashSet};

use crate::fst::Fst;
use crate::{FstError, MAX_LOOP_COUNT};

/// Generic single-source shortest distance (queue-based relaxation).
///
/// `sources` seeds the distances; `successors(q)` yields `(next, weight)`
/// pairs. The result is sparse: states never reached are absent. Converges
/// for k-closed semirings; the five-digit rounding inside the semiring makes
/// Log distances on cycles with positive weight settle too. Runaway
/// relaxation is cut off at [`MAX_LOOP_COUNT`] queue pops.
pub(crate) fn generic_distance<F, I>(
    semiring: Semiring,
    sources: &[(StateId, Weight)],
    mut successors: F,
) -> Result<HashMap<StateId, Weight>, FstError>
where
    F: FnMut(StateId) -> I,
    I: IntoIterator<Item = (StateId, Weight)>,
{
    let zero = semiring.zero();
    let mut distance: HashMap<StateId, Weight> = HashMap::new();
    let mut residual: HashMap<StateId, Weight> = HashMap::new();
    let mut queue = VecDeque::new();
    let mut enqueued: HashSet<StateId> = HashSet::new();

    for &(s, w) in sources {
        let d = distance.entry(s).or_insert(zero);
        *d = semiring.plus(*d, w);
        let r = residual.entry(s).or_insert(zero);
        *r = semiring.plus(*r, w);
        if enqueued.insert(s) {
            queue.push_back(s);
        }
    }

    let mut pops = 0usize;
    while let Some(q) = queue.pop_front() {
        enqueued.remove(&q);
        pops += 1;
        if pops > MAX_LOOP_COUNT {
            return Err(FstError::LimitExceeded {
                operation: "shortest distance",
                limit: MAX_LOOP_COUNT,
            });
        }
        let rq = residual.insert(q, zero).unwrap_or(zero);
        if rq == zero {
            continue;
        }
        for (next, w) in successors(q) {
            let step = semiring.times(rq, w);
            if !semiring.is_member(step) || step == zero {
                continue;
            }
            let old = distance.get(&next).copied().unwrap_or(zero);
            let new = semiring.plus(old, step);
            if new != old {
                distance.insert(next, new);
                let r = residual.entry(next).or_insert(zero);
                *r = semiring.plus(*r, step);
                if enqueued.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    Ok(distance)
}

fn densify(semiring: Semiring, num_states: usize, sparse: HashMap<StateId, Weight>) -> Vec<Weight> {
    let mut dense = vec![semiring.zero(); num_states];
    for (s, w) in sparse {
        dense[s] = w;
    }
    dense
}

/// Distance from the start state to every state, indexed by state id.
///
/// Unreachable states (and every state, when there is no start) get `zero`.
pub fn shortest_distance(fst: &Fst) -> Result<Vec<Weight>, FstError> {
    let semiring = fst.semiring();
    let Some(start) = fst.start() else {
        return Ok(vec![semiring.zero(); fst.num_states()]);
    };
    let sparse = generic_distance(semiring, &[(start, semiring.one())], |q| {
        fst.arcs(q).iter().map(|a| (a.nextstate, a.weight))
    })?;
    Ok(densify(semiring, fst.num_states(), sparse))
}

/// Distance from every state to the final states (final weights included),
/// computed in `semiring` rather than the graph's own semiring.
pub(crate) fn distance_to_final_in(fst: &Fst, semiring: Semiring) -> Result<Vec<Weight>, FstError> {
    let mut reverse: Vec<Vec<(StateId, Weight)>> = vec![Vec::new(); fst.num_states()];
    for s in fst.state_ids() {
        for arc in fst.arcs(s) {
            reverse[arc.nextstate].push((s, arc.weight));
        }
    }
    let sources: Vec<(StateId, Weight)> = fst
        .state_ids()
        .filter(|&s| fst.is_final(s))
        .filter_map(|s| fst.final_weight(s).map(|w| (s, w)))
        .collect();
    let sparse = generic_distance(semiring, &sources, |q| reverse[q].iter().copied())?;
    Ok(densify(semiring, fst.num_states(), sparse))
}

/// Distance from every state to the final states, indexed by state id.
///
/// States that cannot reach a final state get `zero`.
pub fn shortest_distance_to_final(fst: &Fst) -> Result<Vec<Weight>, FstError> {
    distance_to_final_in(fst, fst.semiring())
}
