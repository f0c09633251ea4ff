use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::kmer::KmerRecord;
use crate::operations::{is_dna, normalize, reverse_complement};

/// Verdict of an external feasibility checker for a primer or a primer pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Feasibility {
    pub pass: bool,
    pub penalty: f64,
    pub melting_temp: f64,
}

impl Feasibility {
    pub fn passed(penalty: f64, melting_temp: f64) -> Self {
        Self {
            pass: true,
            penalty,
            melting_temp,
        }
    }

    pub fn failed() -> Self {
        Self {
            pass: false,
            penalty: f64::INFINITY,
            melting_temp: f64::NAN,
        }
    }
}

/// A k-mer accepted as a primer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimerCandidate {
    pub id: String,
    pub sequence: String,
    /// Foreground genomes containing the k-mer once, 0 when unknown.
    pub genome_hit_count: usize,
    pub penalty: f64,
    pub melting_temp: f64,
}

impl PrimerCandidate {
    /// A primer given directly by the user, with no feasibility data.
    pub fn new(id: impl Into<String>, sequence: &str) -> Result<Self> {
        let id = id.into();
        let sequence = normalize(sequence);
        if sequence.is_empty() || !is_dna(&sequence) {
            return Err(Error::malformed(
                id,
                format!("primer '{}' is not an A/C/G/T sequence", sequence),
            ));
        }
        Ok(Self {
            id,
            sequence,
            genome_hit_count: 0,
            penalty: 0.0,
            melting_temp: f64::NAN,
        })
    }

    pub fn from_kmer(id: impl Into<String>, record: &KmerRecord, feasibility: &Feasibility) -> Self {
        Self {
            id: id.into(),
            sequence: record.sequence.clone(),
            genome_hit_count: record.genome_hit_count,
            penalty: feasibility.penalty,
            melting_temp: feasibility.melting_temp,
        }
    }

    /// The same primer read off the opposite strand; the id gains an `rc` suffix.
    pub fn reverse_complement(&self) -> Self {
        Self {
            id: format!("{}rc", self.id),
            sequence: reverse_complement(&self.sequence),
            ..self.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Two primers evaluated together.
///
/// `forward` and `reverse` are the roles as built; the PCR engine tries both
/// role assignments, so `{a, b}` and `{b, a}` describe the same candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimerPair {
    pub id: usize,
    pub forward: PrimerCandidate,
    pub reverse: PrimerCandidate,
    pub penalty: f64,
}

impl PrimerPair {
    pub fn new(id: usize, forward: PrimerCandidate, reverse: PrimerCandidate) -> Result<Self> {
        if forward.sequence == reverse.sequence {
            return Err(Error::malformed(
                format!("pair {}", id),
                format!("forward and reverse primer are both {}", forward.sequence),
            ));
        }
        let penalty = forward.penalty + reverse.penalty;
        Ok(Self {
            id,
            forward,
            reverse,
            penalty,
        })
    }

    /// Orientation-independent identity: the two sequences in lexical order.
    pub fn key(&self) -> (&str, &str) {
        let (a, b) = (self.forward.sequence.as_str(), self.reverse.sequence.as_str());
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// A primer paired with its own reverse complement can never give a product.
    pub fn is_self_complementary(&self) -> bool {
        crate::external::is_self_complementary(&self.forward, &self.reverse)
    }
}
