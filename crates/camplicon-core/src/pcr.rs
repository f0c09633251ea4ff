//! In-silico PCR.
//!
//! Coordinates are 0-based and closed: a [`Product`] spans `start..=end`, where
//! `start` is the first base of the forward primer's site and `end` the last base
//! of the reverse primer's site, both on the sense strand. `length` is always
//! `end - start + 1`.
//!
//! A primer pair is simulated in both role assignments: the pair as built
//! (forward primer on the sense strand, reverse primer on the antisense strand)
//! and swapped. Either assignment amplifies the same template in a real reaction.

use serde::{Deserialize, Serialize};

use crate::external::BindingHit;
use crate::feature::Strand;
use crate::primer::PrimerPair;
use crate::search::{find_pattern, SequenceMatch};
use crate::sequence::{Genome, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// `pair.forward` primes the sense strand.
    AsBuilt,
    /// `pair.reverse` primes the sense strand.
    Swapped,
}

/// A predicted amplicon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub genome_id: String,
    pub contig: String,
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub length: usize,
    pub orientation: Orientation,
}

/// Sense-strand start positions of the two binding sites of one role assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSites {
    /// Where the forward primer itself occurs.
    pub forward: Vec<usize>,
    /// Where the reverse complement of the reverse primer occurs.
    pub reverse: Vec<usize>,
}

impl BindingSites {
    fn from_matches(forward: &[SequenceMatch], reverse: &[SequenceMatch]) -> Self {
        let mut sites = Self {
            forward: forward
                .iter()
                .filter(|m| !m.is_complement)
                .map(|m| m.start)
                .collect(),
            reverse: reverse
                .iter()
                .filter(|m| m.is_complement)
                .map(|m| m.start)
                .collect(),
        };
        sites.forward.sort_unstable();
        sites.forward.dedup();
        sites.reverse.sort_unstable();
        sites.reverse.dedup();
        sites
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PcrEngine {
    max_mismatches: usize,
    max_product_len: Option<usize>,
}

impl PcrEngine {
    /// Exact binding, no product length limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow up to `n` substitutions per binding site.
    pub fn with_mismatches(mut self, n: usize) -> Self {
        self.max_mismatches = n;
        self
    }

    /// Drop spans longer than `limit`.
    pub fn with_max_product_len(mut self, limit: Option<usize>) -> Self {
        self.max_product_len = limit;
        self
    }

    pub fn max_mismatches(&self) -> usize {
        self.max_mismatches
    }

    /// Predict the products of `pair` on every contig of `genome`.
    ///
    /// Each call scans the genome afresh; an empty iterator means no amplification.
    pub fn simulate<'a>(
        &'a self,
        pair: &'a PrimerPair,
        genome: &'a Genome,
    ) -> impl Iterator<Item = Product> + 'a {
        genome.contigs.iter().flat_map(move |contig| {
            let fwd = find_pattern(&contig.sequence, &pair.forward.sequence, self.max_mismatches);
            let rev = find_pattern(&contig.sequence, &pair.reverse.sequence, self.max_mismatches);
            self.amplify(pair, &genome.id, contig, &fwd, &rev)
        })
    }

    /// Predict products from binding coordinates reported by an aligner instead
    /// of scanning. Hits with more edits than the engine tolerates are ignored,
    /// and so are hits whose site would run past the end of the contig.
    pub fn simulate_from_hits<'a>(
        &'a self,
        pair: &'a PrimerPair,
        genome: &'a Genome,
        hits: &'a [BindingHit],
    ) -> impl Iterator<Item = Product> + 'a {
        genome.contigs.iter().flat_map(move |contig| {
            let fwd = self.hits_to_matches(hits, &genome.id, contig, &pair.forward.sequence);
            let rev = self.hits_to_matches(hits, &genome.id, contig, &pair.reverse.sequence);
            self.amplify(pair, &genome.id, contig, &fwd, &rev)
        })
    }

    fn hits_to_matches(
        &self,
        hits: &[BindingHit],
        genome_id: &str,
        contig: &Sequence,
        primer: &str,
    ) -> Vec<SequenceMatch> {
        hits.iter()
            .filter(|h| h.contig == contig.name && h.primer == primer)
            .filter(|h| h.edit_distance <= self.max_mismatches)
            .filter(|h| h.strand != Strand::None)
            .filter(|h| {
                let inside = h.position + primer.len() <= contig.len();
                if !inside {
                    log::warn!(
                        "{}: ignoring aligner hit of {} at {}:{}, past the contig end ({} bp)",
                        genome_id,
                        primer,
                        contig.name,
                        h.position,
                        contig.len()
                    );
                }
                inside
            })
            .map(|h| SequenceMatch {
                start: h.position,
                end: h.position + primer.len(),
                matched: String::new(),
                is_complement: h.strand == Strand::Reverse,
                mismatches: h.edit_distance,
            })
            .collect()
    }

    fn amplify<'a>(
        &self,
        pair: &PrimerPair,
        genome_id: &'a str,
        contig: &'a Sequence,
        fwd: &[SequenceMatch],
        rev: &[SequenceMatch],
    ) -> impl Iterator<Item = Product> + 'a {
        let as_built = Amplicons::new(
            genome_id,
            contig,
            Orientation::AsBuilt,
            BindingSites::from_matches(fwd, rev),
            pair.forward.len(),
            pair.reverse.len(),
            self.max_product_len,
        );
        let swapped = Amplicons::new(
            genome_id,
            contig,
            Orientation::Swapped,
            BindingSites::from_matches(rev, fwd),
            pair.reverse.len(),
            pair.forward.len(),
            self.max_product_len,
        );
        as_built.chain(swapped)
    }
}

/// Walks every forward site against every downstream reverse site.
struct Amplicons<'a> {
    genome_id: &'a str,
    contig: &'a Sequence,
    orientation: Orientation,
    sites: BindingSites,
    forward_len: usize,
    reverse_len: usize,
    max_len: Option<usize>,
    fi: usize,
    ri: usize,
}

impl<'a> Amplicons<'a> {
    fn new(
        genome_id: &'a str,
        contig: &'a Sequence,
        orientation: Orientation,
        sites: BindingSites,
        forward_len: usize,
        reverse_len: usize,
        max_len: Option<usize>,
    ) -> Self {
        let mut it = Self {
            genome_id,
            contig,
            orientation,
            sites,
            forward_len,
            reverse_len,
            max_len,
            fi: 0,
            ri: 0,
        };
        it.ri = it.first_downstream(0);
        it
    }

    /// Index of the first reverse site starting after the forward site `fi` ends.
    fn first_downstream(&self, fi: usize) -> usize {
        match self.sites.forward.get(fi) {
            Some(&f) => {
                let f_end = f + self.forward_len;
                self.sites.reverse.partition_point(|&r| r < f_end)
            }
            None => self.sites.reverse.len(),
        }
    }
}

impl Iterator for Amplicons<'_> {
    type Item = Product;

    fn next(&mut self) -> Option<Product> {
        while let Some(&start) = self.sites.forward.get(self.fi) {
            while let Some(&r) = self.sites.reverse.get(self.ri) {
                let end = r + self.reverse_len - 1;
                let length = end - start + 1;
                // reverse sites are sorted, so every later one is longer still
                if self.max_len.is_some_and(|max| length > max) {
                    break;
                }
                self.ri += 1;
                if let Some(sequence) = self.contig.sequence.get(start..=end) {
                    return Some(Product {
                        genome_id: self.genome_id.to_string(),
                        contig: self.contig.name.clone(),
                        sequence: sequence.to_string(),
                        start,
                        end,
                        length,
                        orientation: self.orientation,
                    });
                }
            }
            self.fi += 1;
            self.ri = self.first_downstream(self.fi);
        }
        None
    }
}
