//! Capabilities provided by external programs.
//!
//! The pipeline only talks to k-mer counters, thermodynamic checkers and
//! aligners through these traits, so a run can be driven by the real tools or
//! by in-memory fakes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::feature::Strand;
use crate::primer::{Feasibility, PrimerCandidate};

pub trait KmerCounter: Send + Sync {
    /// Every k-mer of length `kmer_len` in the genome file with its occurrence count.
    fn count(&self, genome: &Path, kmer_len: usize) -> Result<Vec<(String, u64)>>;
}

pub trait FeasibilityChecker: Send + Sync {
    fn check(&self, sequence: &str) -> Result<Feasibility>;

    /// Pair verdict. Defaults to combining the two single-primer verdicts:
    /// penalties add up and the lower melting temperature wins.
    fn check_pair(&self, forward: &PrimerCandidate, reverse: &PrimerCandidate) -> Result<Feasibility> {
        if is_self_complementary(forward, reverse) {
            return Ok(Feasibility::failed());
        }
        let f = self.check(&forward.sequence)?;
        let r = self.check(&reverse.sequence)?;
        if !(f.pass && r.pass) {
            return Ok(Feasibility::failed());
        }
        Ok(Feasibility::passed(
            f.penalty + r.penalty,
            f.melting_temp.min(r.melting_temp),
        ))
    }
}

/// Shared by every checker, including ones that override `check_pair`.
pub fn is_self_complementary(forward: &PrimerCandidate, reverse: &PrimerCandidate) -> bool {
    crate::operations::reverse_complement(&forward.sequence) == reverse.sequence
}

/// Where a primer binds, as reported by an aligner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingHit {
    /// Primer sequence as submitted.
    pub primer: String,
    pub contig: String,
    /// `Forward` when the primer itself occurs on the sense strand, `Reverse`
    /// when its reverse complement does.
    pub strand: Strand,
    /// 0-based sense-strand start of the aligned bases.
    pub position: usize,
    pub edit_distance: usize,
}

pub trait BackgroundAligner: Send + Sync {
    fn align(&self, primers: &[PrimerCandidate], genome: &Path) -> Result<Vec<BindingHit>>;
}
