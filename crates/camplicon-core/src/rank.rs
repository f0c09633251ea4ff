//! Overlap between in-group and out-group products, and the final ordering of pairs.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::result::{PairResult, ProductSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    /// Distinct product sequences found in both groups.
    pub shared: usize,
    /// `shared` over the number of distinct in-group sequences.
    pub fraction: f64,
}

pub fn overlap(in_group: &ProductSet, out_group: &ProductSet) -> Overlap {
    let inside = in_group.distinct_sequences();
    if inside.is_empty() {
        return Overlap::default();
    }
    let outside = out_group.distinct_sequences();
    let shared = inside.intersection(&outside).count();
    Overlap {
        shared,
        fraction: shared as f64 / inside.len() as f64,
    }
}

/// Weights of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingPolicy {
    pub in_hits: f64,
    pub out_hits: f64,
    pub overlap: f64,
    pub penalty: f64,
    pub stdev: f64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            in_hits: 1.0,
            out_hits: 1.0,
            overlap: 0.5,
            penalty: 0.1,
            stdev: 0.01,
        }
    }
}

impl RankingPolicy {
    pub fn score(&self, result: &PairResult) -> f64 {
        let stats = &result.stats;
        self.in_hits * stats.in_group.hit_count as f64
            - self.out_hits * stats.out_group.hit_count as f64
            - self.overlap * stats.overlap.shared as f64
            - self.penalty * result.pair.penalty
            - self.stdev * stats.in_group.stdev_length
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    /// 1-based position.
    pub rank: usize,
    pub score: f64,
    /// Genes around the first in-group product, `-` when unknown.
    pub context: String,
    pub result: PairResult,
}

/// Order pairs best first. Pairs amplifying no in-group genome are dropped.
pub fn rank(results: Vec<PairResult>, policy: &RankingPolicy) -> Vec<Ranked> {
    let total = results.len();
    let mut scored: Vec<(f64, PairResult)> = results
        .into_iter()
        .filter(|r| r.stats.in_group.hit_count > 0)
        .map(|r| (policy.score(&r), r))
        .collect();
    log::debug!(
        "ranking {} of {} pairs with in-group products",
        scored.len(),
        total
    );

    scored.sort_by(|(sa, a), (sb, b)| compare(*sa, a, *sb, b));
    scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, result))| Ranked {
            rank: i + 1,
            score,
            context: "-".to_string(),
            result,
        })
        .collect()
}

fn compare(sa: f64, a: &PairResult, sb: f64, b: &PairResult) -> Ordering {
    sb.total_cmp(&sa)
        .then_with(|| a.pair.key().cmp(&b.pair.key()))
        .then_with(|| a.pair.id.cmp(&b.pair.id))
}
