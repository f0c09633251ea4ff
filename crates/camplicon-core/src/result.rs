use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::pcr::Product;
use crate::primer::PrimerPair;
use crate::rank::{overlap, Overlap};
use crate::stats::{GroupStats, ProductAggregator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    /// Foreground genomes the pair should amplify.
    In,
    /// Background genomes it should miss.
    Out,
}

impl Group {
    pub fn label(&self) -> &'static str {
        match self {
            Group::In => "FG",
            Group::Out => "BG",
        }
    }
}

/// Products of one pair over a set of genomes, keyed by genome id.
///
/// Every simulated genome has an entry, even when it produced nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSet {
    by_genome: BTreeMap<String, Vec<Product>>,
}

impl ProductSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_genome(&mut self, genome_id: impl Into<String>, products: Vec<Product>) {
        self.by_genome
            .entry(genome_id.into())
            .or_default()
            .extend(products);
    }

    pub fn genome_count(&self) -> usize {
        self.by_genome.len()
    }

    pub fn product_count(&self) -> usize {
        self.by_genome.values().map(Vec::len).sum()
    }

    pub fn genomes(&self) -> impl Iterator<Item = (&str, &[Product])> {
        self.by_genome
            .iter()
            .map(|(id, products)| (id.as_str(), products.as_slice()))
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.by_genome.values().flatten()
    }

    /// Genomes with at least one product.
    pub fn hit_count(&self) -> usize {
        self.by_genome.values().filter(|p| !p.is_empty()).count()
    }

    pub fn distinct_sequences(&self) -> BTreeSet<&str> {
        self.products().map(|p| p.sequence.as_str()).collect()
    }

    /// A copy keeping products with `min <= length <= max`; genome entries are kept.
    pub fn filter_length(&self, min: usize, max: usize) -> ProductSet {
        let by_genome = self
            .by_genome
            .iter()
            .map(|(id, products)| {
                let kept = products
                    .iter()
                    .filter(|p| (min..=max).contains(&p.length))
                    .cloned()
                    .collect();
                (id.clone(), kept)
            })
            .collect();
        ProductSet { by_genome }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStats {
    pub in_group: GroupStats,
    pub out_group: GroupStats,
    pub overlap: Overlap,
}

/// Outcome of simulating one pair against every genome in scope.
///
/// `in_group` and `out_group` hold the products inside the length bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    pub pair: PrimerPair,
    pub in_group: ProductSet,
    pub out_group: ProductSet,
    pub stats: PairStats,
}

/// Collects one pair's products genome by genome.
#[derive(Debug, Clone)]
pub struct PairAccumulator {
    pair: PrimerPair,
    in_group: ProductSet,
    out_group: ProductSet,
    expected_in: usize,
    expected_out: usize,
}

impl PairAccumulator {
    pub fn new(pair: PrimerPair, expected_in: usize, expected_out: usize) -> Self {
        Self {
            pair,
            in_group: ProductSet::new(),
            out_group: ProductSet::new(),
            expected_in,
            expected_out,
        }
    }

    pub fn pair(&self) -> &PrimerPair {
        &self.pair
    }

    pub fn add(&mut self, group: Group, genome_id: &str, products: Vec<Product>) {
        match group {
            Group::In => self.in_group.insert_genome(genome_id, products),
            Group::Out => self.out_group.insert_genome(genome_id, products),
        }
    }

    /// Every expected genome has reported.
    pub fn is_complete(&self) -> bool {
        self.in_group.genome_count() == self.expected_in
            && self.out_group.genome_count() == self.expected_out
    }

    pub fn finish(self, aggregator: &ProductAggregator) -> PairResult {
        debug_assert!(self.is_complete(), "pair {} finished early", self.pair.id);
        let in_group = aggregator.retain(&self.in_group);
        let out_group = aggregator.retain(&self.out_group);
        let stats = PairStats {
            in_group: aggregator.aggregate(&in_group),
            out_group: aggregator.aggregate(&out_group),
            overlap: overlap(&in_group, &out_group),
        };
        PairResult {
            pair: self.pair,
            in_group,
            out_group,
            stats,
        }
    }
}
