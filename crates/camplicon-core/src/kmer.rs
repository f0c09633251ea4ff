//! Global table of k-mers unique to the foreground genomes.
//!
//! A [`KmerPool`] is owned by the caller driving a run. Each foreground genome
//! contributes its unique k-mers once through [`KmerPool::ingest`]; background
//! genomes remove k-mers through [`KmerPool::mask`]. Pools filled on different
//! workers are combined with [`KmerPool::merge`].

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::operations::is_dna;

/// A k-mer and the number of genomes in which it occurs exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmerRecord {
    pub sequence: String,
    pub genome_hit_count: usize,
}

impl KmerRecord {
    pub fn new(sequence: impl Into<String>, genome_hit_count: usize) -> Self {
        Self {
            sequence: sequence.into(),
            genome_hit_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KmerPool {
    kmer_len: usize,
    counts: HashMap<String, usize>,
    genomes: HashSet<String>,
    /// Genomes represented by a restored table whose ids are unknown.
    restored_genomes: usize,
}

impl KmerPool {
    pub fn new(kmer_len: usize) -> Result<Self> {
        if kmer_len == 0 {
            return Err(Error::config("k-mer length must be greater than zero"));
        }
        Ok(Self {
            kmer_len,
            counts: HashMap::new(),
            genomes: HashSet::new(),
            restored_genomes: 0,
        })
    }

    /// Rebuild a pool from a persisted table covering `genome_total` genomes.
    pub fn from_records<I>(kmer_len: usize, genome_total: usize, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = KmerRecord>,
    {
        let mut pool = Self::new(kmer_len)?;
        pool.restored_genomes = genome_total;
        for record in records {
            let kmer = pool.validate("k-mer table", &record.sequence)?;
            if record.genome_hit_count > genome_total {
                return Err(Error::malformed(
                    "k-mer table",
                    format!(
                        "{} is counted in {} genomes but the table covers {}",
                        kmer, record.genome_hit_count, genome_total
                    ),
                ));
            }
            if record.genome_hit_count > 0 {
                pool.counts.insert(kmer, record.genome_hit_count);
            }
        }
        Ok(pool)
    }

    pub fn kmer_len(&self) -> usize {
        self.kmer_len
    }

    /// Number of genomes that contributed to the table.
    pub fn genome_count(&self) -> usize {
        self.genomes.len() + self.restored_genomes
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn get(&self, kmer: &str) -> Option<usize> {
        self.counts.get(&kmer.to_ascii_uppercase()).copied()
    }

    pub fn max_frequency(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    fn validate(&self, input: &str, kmer: &str) -> Result<String> {
        if kmer.len() != self.kmer_len {
            return Err(Error::malformed(
                input,
                format!(
                    "k-mer {} has length {}, expected {}",
                    kmer,
                    kmer.len(),
                    self.kmer_len
                ),
            ));
        }
        if !is_dna(kmer) {
            return Err(Error::malformed(
                input,
                format!("k-mer {} contains bases other than A, C, G, T", kmer),
            ));
        }
        Ok(kmer.to_ascii_uppercase())
    }

    /// Merge one genome's unique k-mers into the table.
    ///
    /// Each distinct k-mer is counted once for the genome no matter how often it
    /// appears in `kmers`. Ingesting a genome id a second time changes nothing.
    /// Returns the number of distinct k-mers counted.
    pub fn ingest<I, S>(&mut self, genome_id: &str, kmers: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.genomes.contains(genome_id) {
            log::warn!("genome {} already ingested, skipping", genome_id);
            return Ok(0);
        }

        let mut unique = HashSet::new();
        for kmer in kmers {
            unique.insert(self.validate(genome_id, kmer.as_ref())?);
        }

        let n = unique.len();
        for kmer in unique {
            *self.counts.entry(kmer).or_insert(0) += 1;
        }
        self.genomes.insert(genome_id.to_string());
        log::debug!("ingested {} unique k-mers from {}", n, genome_id);
        Ok(n)
    }

    /// Ingest counter output for one genome, keeping only k-mers seen exactly once.
    pub fn ingest_counts<I, S>(&mut self, genome_id: &str, counts: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let unique: Vec<S> = counts
            .into_iter()
            .filter(|(_, occurrences)| *occurrences == 1)
            .map(|(kmer, _)| kmer)
            .collect();
        self.ingest(genome_id, unique)
    }

    /// Remove every listed k-mer from the table. Returns how many were present.
    pub fn mask<I, S>(&mut self, kmers: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        kmers
            .into_iter()
            .filter(|k| self.counts.remove(&k.as_ref().to_ascii_uppercase()).is_some())
            .count()
    }

    /// Fold another pool into this one.
    pub fn merge(&mut self, other: KmerPool) -> Result<()> {
        if other.kmer_len != self.kmer_len {
            return Err(Error::malformed(
                "k-mer pool",
                format!(
                    "cannot merge pools of k = {} and k = {}",
                    self.kmer_len, other.kmer_len
                ),
            ));
        }
        if let Some(dup) = other.genomes.iter().find(|g| self.genomes.contains(*g)) {
            return Err(Error::malformed(
                dup.as_str(),
                "genome was ingested into both pools",
            ));
        }
        for (kmer, n) in other.counts {
            *self.counts.entry(kmer).or_insert(0) += n;
        }
        self.genomes.extend(other.genomes);
        self.restored_genomes += other.restored_genomes;
        Ok(())
    }

    /// Records with `genome_hit_count >= min_freq`, most frequent first, ties by sequence.
    pub fn top_by_frequency(&self, min_freq: usize) -> impl Iterator<Item = KmerRecord> + '_ {
        let mut eligible: Vec<(&String, usize)> = self
            .counts
            .iter()
            .filter(|(_, n)| **n >= min_freq)
            .map(|(k, n)| (k, *n))
            .collect();
        eligible.sort_by_key(|(k, n)| (Reverse(*n), *k));
        eligible
            .into_iter()
            .map(|(k, n)| KmerRecord::new(k.clone(), n))
    }
}
