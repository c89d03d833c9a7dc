// N-best path search.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use g2pfst_core::{EPSILON, Label, Semiring, SemiringError, StateId, Weight};
use ordered_float::OrderedFloat;

use super::shortest_distance::distance_to_final_in;
use crate::fst::Fst;
use crate::{FstError, MAX_LOOP_COUNT};

/// One complete path: the non-epsilon labels read along it and its weight
/// (arc weights and the final weight multiplied together).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPath {
    pub ilabels: Vec<Label>,
    pub olabels: Vec<Label>,
    pub weight: Weight,
}

/// A search node. Nodes form back-pointer chains from which paths are read.
#[derive(Debug, Clone, Copy)]
struct Node {
    /// `None` marks a completed path (the final weight has been applied).
    state: Option<StateId>,
    cost: Weight,
    parent: Option<usize>,
    ilabel: Label,
    olabel: Label,
}

/// The `n` best complete paths of `fst`, best first.
///
/// Best-first search ordered by `cost so far + best completion cost`, where
/// the completion cost is the tropical shortest distance to a final state.
/// Each state is expanded at most `n` times. With `beam`, partial paths whose
/// estimated total exceeds the best total by more than `beam` are dropped.
/// Ties are broken by insertion order, so results are deterministic.
///
/// Weights are treated as costs, so the Probability semiring is rejected.
/// Paths are not deduplicated by label sequence; determinize first when
/// distinct strings are wanted.
pub fn n_shortest_paths(
    fst: &Fst,
    n: usize,
    beam: Option<f64>,
) -> Result<Vec<WeightedPath>, FstError> {
    let semiring = fst.semiring();
    if semiring == Semiring::Probability {
        return Err(SemiringError::Unsupported {
            semiring,
            operation: "n-shortest paths",
        }
        .into());
    }
    let Some(start) = fst.start() else {
        return Ok(Vec::new());
    };
    if n == 0 {
        return Ok(Vec::new());
    }

    let completion = distance_to_final_in(fst, Semiring::Tropical)?;
    let best_total = completion[start].value();
    if best_total.is_infinite() {
        return Ok(Vec::new());
    }
    let threshold = beam.map(|b| best_total + b);

    let mut nodes: Vec<Node> = Vec::new();
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, usize)>> = BinaryHeap::new();
    let mut pops = vec![0usize; fst.num_states()];
    let mut results = Vec::new();

    nodes.push(Node {
        state: Some(start),
        cost: semiring.one(),
        parent: None,
        ilabel: EPSILON,
        olabel: EPSILON,
    });
    heap.push(Reverse((OrderedFloat(best_total), 0)));

    let mut iterations = 0usize;
    while let Some(Reverse((_, index))) = heap.pop() {
        iterations += 1;
        if iterations > MAX_LOOP_COUNT {
            return Err(FstError::LimitExceeded {
                operation: "n-shortest paths",
                limit: MAX_LOOP_COUNT,
            });
        }
        let node = nodes[index];
        let Some(state) = node.state else {
            results.push(trace(&nodes, index));
            if results.len() == n {
                break;
            }
            continue;
        };

        pops[state] += 1;
        if pops[state] > n {
            continue;
        }

        let mut push = |node: Node, estimate: f64| {
            if threshold.is_some_and(|t| estimate > t) {
                return;
            }
            // The node index doubles as the insertion sequence number.
            let index = nodes.len();
            nodes.push(node);
            heap.push(Reverse((OrderedFloat(estimate), index)));
        };

        if fst.is_final(state) {
            let fw = fst.final_weight(state).unwrap_or(semiring.zero());
            let cost = semiring.times(node.cost, fw);
            push(
                Node {
                    state: None,
                    cost,
                    parent: Some(index),
                    ilabel: EPSILON,
                    olabel: EPSILON,
                },
                cost.value(),
            );
        }
        for arc in fst.arcs(state) {
            let rest = completion[arc.nextstate].value();
            if rest.is_infinite() {
                continue;
            }
            let cost = semiring.times(node.cost, arc.weight);
            if !semiring.is_member(cost) {
                continue;
            }
            push(
                Node {
                    state: Some(arc.nextstate),
                    cost,
                    parent: Some(index),
                    ilabel: arc.ilabel,
                    olabel: arc.olabel,
                },
                cost.value() + rest,
            );
        }
    }

    tracing::debug!(
        requested = n,
        found = results.len(),
        expanded = iterations,
        "n-shortest paths"
    );
    Ok(results)
}

/// Read the path ending at `index` by following parent links.
fn trace(nodes: &[Node], index: usize) -> WeightedPath {
    let weight = nodes[index].cost;
    let mut ilabels = Vec::new();
    let mut olabels = Vec::new();
    let mut cursor = Some(index);
    while let Some(i) = cursor {
        let node = &nodes[i];
        if node.ilabel != EPSILON {
            ilabels.push(node.ilabel);
        }
        if node.olabel != EPSILON {
            olabels.push(node.olabel);
        }
        cursor = node.parent;
    }
    ilabels.reverse();
    olabels.reverse();
    WeightedPath {
        ilabels,
        olabels,
        weight,
    }
}
