// Minimum Bayes risk rescoring of an N-best candidate pool.
//
// Candidates are rescored by their expected linear-BLEU gain against the
// pool's posterior distribution. Posteriors come from alpha-scaled path
// costs normalized in the log semiring; n-gram posteriors are the summed
// posteriors of the candidates containing each n-gram.

use std::cmp::Reverse;

use g2pfst_core::{Semiring, Weight};
use hashbrown::{HashMap, HashSet};
use ordered_float::OrderedFloat;

use crate::config::DecoderConfig;

/// A candidate's position in the pool and its expected gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MbrScore {
    pub index: usize,
    pub gain: f64,
}

/// Linear-BLEU weights: `theta[0]` per output symbol, `theta[n]` per n-gram match.
fn thetas(config: &DecoderConfig) -> Vec<f64> {
    let order = config.order as f64;
    let mut theta = Vec::with_capacity(config.order + 1);
    theta.push(-1.0);
    for n in 1..=config.order {
        let decay = config.ratio.powi(n as i32 - 1);
        theta.push(1.0 / (order * config.precision * decay));
    }
    theta
}

/// Posterior of every candidate, proportional to `exp(-alpha * cost)`.
pub fn posteriors(costs: &[Weight], alpha: f64) -> Vec<f64> {
    let scaled: Vec<Weight> = costs.iter().map(|c| Weight::new(alpha * c.value())).collect();
    let total = scaled
        .iter()
        .fold(Semiring::Log.zero(), |acc, &w| Semiring::Log.plus(acc, w));
    scaled
        .iter()
        .map(|w| (total.value() - w.value()).exp())
        .collect()
}

/// Rescore `candidates` (phone sequences with their path costs).
///
/// Returns one score per candidate, highest expected gain first. Ties keep
/// pool order, so the result is deterministic.
pub fn rescore(candidates: &[(Vec<String>, Weight)], config: &DecoderConfig) -> Vec<MbrScore> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let theta = thetas(config);
    let costs: Vec<Weight> = candidates.iter().map(|(_, c)| *c).collect();
    let posterior = posteriors(&costs, config.alpha);

    // Expected count of each n-gram: sum of posteriors of candidates containing it.
    let mut expected: HashMap<&[String], f64> = HashMap::new();
    for ((phones, _), &p) in candidates.iter().zip(&posterior) {
        let mut seen: HashSet<&[String]> = HashSet::new();
        for n in 1..=config.order.min(phones.len()) {
            for gram in phones.windows(n) {
                if seen.insert(gram) {
                    *expected.entry(gram).or_insert(0.0) += p;
                }
            }
        }
    }

    let mut scores: Vec<MbrScore> = candidates
        .iter()
        .enumerate()
        .map(|(index, (phones, _))| {
            let mut gain = theta[0] * phones.len() as f64;
            for n in 1..=config.order.min(phones.len()) {
                let matched: f64 = phones
                    .windows(n)
                    .map(|gram| expected.get(gram).copied().unwrap_or(0.0))
                    .sum();
                gain += theta[n] * matched;
            }
            MbrScore { index, gain }
        })
        .collect();
    scores.sort_by_key(|s| Reverse(OrderedFloat(s.gain)));

    tracing::debug!(
        candidates = candidates.len(),
        best_gain = scores[0].gain,
        "MBR rescoring"
    );
    scores
}
