use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::kmer::{KmerPool, KmerRecord};

/// Picks the k-mers worth sending to the feasibility checker.
#[derive(Debug, Clone, Default)]
pub struct CandidateSelector {
    seed: Option<u64>,
}

impl CandidateSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible sampling.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Records with `genome_hit_count >= min_freq`.
    ///
    /// With `max_candidates == 0`, or when no more than `max_candidates` records
    /// are eligible, every eligible record is returned in descending-frequency
    /// order. Otherwise a uniform sample of `max_candidates` records is drawn
    /// without replacement and callers must not rely on its order.
    pub fn select(&self, pool: &KmerPool, min_freq: usize, max_candidates: usize) -> Vec<KmerRecord> {
        let eligible: Vec<KmerRecord> = pool.top_by_frequency(min_freq).collect();
        if max_candidates == 0 || eligible.len() <= max_candidates {
            return eligible;
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        log::debug!(
            "sampling {} of {} eligible k-mers",
            max_candidates,
            eligible.len()
        );
        let picked = index::sample(&mut rng, eligible.len(), max_candidates);
        let mut slots: Vec<Option<KmerRecord>> = eligible.into_iter().map(Some).collect();
        picked
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect()
    }
}
