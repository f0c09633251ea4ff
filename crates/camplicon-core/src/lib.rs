//! Domain model and algorithms for designing group-specific PCR primer pairs.
//!
//! The flow through this crate is: a [`KmerPool`] of k-mers unique to the
//! foreground genomes, a [`CandidateSelector`] picking primers from it, pairs
//! built by [`build_pairs`], products predicted by the [`PcrEngine`], summarized
//! by the [`ProductAggregator`] and finally ordered by [`rank::rank`].

pub mod context;
pub mod error;
pub mod external;
pub mod feature;
pub mod kmer;
pub mod operations;
pub mod pairs;
pub mod pcr;
pub mod primer;
pub mod rank;
pub mod result;
pub mod search;
pub mod select;
pub mod sequence;
pub mod stats;

pub use error::{Error, Result};
pub use external::{BackgroundAligner, BindingHit, FeasibilityChecker, KmerCounter};
pub use feature::*;
pub use kmer::{KmerPool, KmerRecord};
pub use pairs::{build_pairs, pair_combinations};
pub use pcr::{Orientation, PcrEngine, Product};
pub use primer::{Feasibility, PrimerCandidate, PrimerPair};
pub use rank::{Overlap, Ranked, RankingPolicy};
pub use result::{Group, PairAccumulator, PairResult, PairStats, ProductSet};
pub use select::CandidateSelector;
pub use sequence::*;
pub use stats::{GroupStats, ProductAggregator};
