use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::result::ProductSet;

/// Summary of one pair's products over one genome group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Genomes simulated.
    pub genomes: usize,
    /// Genomes with at least one product inside the length bounds.
    pub hit_count: usize,
    pub product_count: usize,
    pub distinct_products: usize,
    /// Shannon entropy in bits of the product sequence distribution.
    pub information_content: f64,
    pub mean_length: f64,
    /// Sample standard deviation.
    pub stdev_length: f64,
}

/// Applies the accepted product length window and summarizes what survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAggregator {
    min_length: usize,
    max_length: usize,
}

impl ProductAggregator {
    pub fn new(min_length: usize, max_length: usize) -> Result<Self> {
        if min_length > max_length {
            return Err(Error::config(format!(
                "minimum product length {} exceeds maximum {}",
                min_length, max_length
            )));
        }
        Ok(Self {
            min_length,
            max_length,
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Products within bounds, both ends inclusive.
    pub fn retain(&self, set: &ProductSet) -> ProductSet {
        set.filter_length(self.min_length, self.max_length)
    }

    pub fn aggregate(&self, set: &ProductSet) -> GroupStats {
        let kept = self.retain(set);
        let lengths: Vec<f64> = kept.products().map(|p| p.length as f64).collect();
        let (mean_length, stdev_length) = mean_and_stdev(&lengths);

        GroupStats {
            genomes: kept.genome_count(),
            hit_count: kept.hit_count(),
            product_count: lengths.len(),
            distinct_products: kept.distinct_sequences().len(),
            information_content: shannon_entropy(kept.products().map(|p| p.sequence.as_str())),
            mean_length,
            stdev_length,
        }
    }
}

fn mean_and_stdev(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, var.sqrt())
}

/// Entropy in bits of the distribution of `items`, each occurrence counted.
pub fn shannon_entropy<'a, I>(items: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
        total += 1;
    }
    if counts.len() <= 1 {
        return 0.0;
    }
    let total = total as f64;
    -counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            p * p.log2()
        })
        .sum::<f64>()
}
