// Weighted subset construction for acceptors.

use std::collections::{BTreeMap, VecDeque};

use g2pfst_core::{Label, Semiring, SemiringError, StateId, Weight};
use hashbrown::HashMap;

use crate::fst::{Arc, Fst};
use crate::{FstError, MAX_LOOP_COUNT};

/// A weighted subset: original states with their residual weights, sorted by state.
type Subset = Vec<(StateId, Weight)>;
type SubsetKey = Vec<(StateId, u64)>;

fn subset_key(subset: &Subset) -> SubsetKey {
    subset.iter().map(|&(s, w)| (s, w.key())).collect()
}

/// Determinize a weighted acceptor.
///
/// Each result state is a weighted subset of input states. For every label
/// leaving a subset the new arc carries the `plus` of all matching path
/// weights, and the remainder is kept as residual weight on the target
/// subset's members (`divide`). The result is equivalent to the input and
/// has at most one arc per label per state.
///
/// Requires `divide`, so the Probability semiring is rejected. Inputs that
/// are not determinizable would produce unboundedly many subsets; the
/// construction stops with [`FstError::LimitExceeded`] after
/// [`MAX_LOOP_COUNT`] subsets.
pub fn determinize(fst: &Fst) -> Result<Fst, FstError> {
    let semiring = fst.semiring();
    if semiring == Semiring::Probability {
        return Err(SemiringError::Unsupported {
            semiring,
            operation: "divide",
        }
        .into());
    }
    if !fst.is_acceptor() {
        return Err(FstError::NotAnAcceptor {
            operation: "determinize",
        });
    }

    let mut result = Fst::new(semiring);
    result.set_input_symbols(fst.input_symbols().cloned());
    result.set_output_symbols(fst.output_symbols().cloned());
    let Some(start) = fst.start() else {
        return Ok(result);
    };

    let final_of = |subset: &Subset| -> Weight {
        subset.iter().fold(semiring.zero(), |acc, &(q, r)| {
            let fq = fst.final_weight(q).unwrap_or(semiring.zero());
            semiring.plus(acc, semiring.times(r, fq))
        })
    };

    let mut ids: HashMap<SubsetKey, StateId> = HashMap::new();
    let mut queue: VecDeque<(StateId, Subset)> = VecDeque::new();

    let initial: Subset = vec![(start, semiring.one())];
    let start_id = result.add_state(final_of(&initial));
    result.set_start(start_id)?;
    ids.insert(subset_key(&initial), start_id);
    queue.push_back((start_id, initial));

    while let Some((source, subset)) = queue.pop_front() {
        // label -> (arc weight sum, target -> weighted sum)
        let mut by_label: BTreeMap<Label, (Weight, BTreeMap<StateId, Weight>)> = BTreeMap::new();
        for &(q, residual) in &subset {
            for arc in fst.arcs(q) {
                let w = semiring.times(residual, arc.weight);
                let (total, targets) = by_label
                    .entry(arc.ilabel)
                    .or_insert_with(|| (semiring.zero(), BTreeMap::new()));
                *total = semiring.plus(*total, w);
                let t = targets.entry(arc.nextstate).or_insert(semiring.zero());
                *t = semiring.plus(*t, w);
            }
        }

        for (label, (total, targets)) in by_label {
            let mut next: Subset = Vec::with_capacity(targets.len());
            for (t, w) in targets {
                next.push((t, semiring.divide(w, total)?));
            }
            let key = subset_key(&next);
            let target = match ids.get(&key) {
                Some(&id) => id,
                None => {
                    if ids.len() >= MAX_LOOP_COUNT {
                        return Err(FstError::LimitExceeded {
                            operation: "determinize",
                            limit: MAX_LOOP_COUNT,
                        });
                    }
                    let id = result.add_state(final_of(&next));
                    ids.insert(key, id);
                    queue.push_back((id, next));
                    id
                }
            };
            result.add_arc(source, Arc::new(label, label, total, target))?;
        }
    }

    tracing::debug!(
        states_in = fst.num_states(),
        states_out = result.num_states(),
        "determinized"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_common_prefixes() {
        // 0 -a/1-> 1 -b/1-> 3, 0 -a/2-> 2 -b/3-> 3 (final)
        let mut fst = Fst::new(Semiring::Tropical);
        for _ in 0..4 {
            fst.add_nonfinal_state();
        }
        fst.set_start(0).unwrap();
        fst.set_final(3, 0.0).unwrap();
        fst.add_arc(0, Arc::new(1, 1, 1.0, 1)).unwrap();
        fst.add_arc(0, Arc::new(1, 1, 2.0, 2)).unwrap();
        fst.add_arc(1, Arc::new(2, 2, 1.0, 3)).unwrap();
        fst.add_arc(2, Arc::new(2, 2, 3.0, 3)).unwrap();

        let det = determinize(&fst).unwrap();
        assert_eq!(det.num_states(), 3);
        assert_eq!(det.arcs(0), &[Arc::new(1, 1, 1.0, 1)]);
        // residuals: state 1 -> 0, state 2 -> 1; best b continuation is 1.
        assert_eq!(det.arcs(1), &[Arc::new(2, 2, 1.0, 2)]);
        assert!(det.is_final(2));
        for s in det.state_ids() {
            let mut labels: Vec<_> = det.arcs(s).iter().map(|a| a.ilabel).collect();
            labels.dedup();
            assert_eq!(labels.len(), det.arcs(s).len());
        }
    }

    #[test]
    fn start_final_weight_is_kept() {
        let mut fst = Fst::new(Semiring::Log);
        let s0 = fst.add_state(0.5);
        fst.set_start(s0).unwrap();
        let det = determinize(&fst).unwrap();
        assert_eq!(det.final_weight(0), Some(Weight::new(0.5)));
    }

    #[test]
    fn rejects_transducers_and_probability() {
        let mut fst = Fst::new(Semiring::Tropical);
        let s0 = fst.add_nonfinal_state();
        let s1 = fst.add_state(0.0);
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, Arc::new(1, 2, 0.0, s1)).unwrap();
        assert!(matches!(determinize(&fst), Err(FstError::NotAnAcceptor { .. })));

        let p = Fst::new(Semiring::Probability);
        assert!(matches!(
            determinize(&p),
            Err(FstError::Semiring(SemiringError::Unsupported { .. }))
        ));
    }
}
