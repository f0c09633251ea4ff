use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::feature::Feature;

/// A named contig or record read from a sequence file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sequence: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Sequence {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            sequence: sequence.into().to_uppercase(),
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }
}

/// One genome: every contig of one sequence file, loaded in memory.
#[derive(Debug, Clone)]
pub struct Genome {
    /// Identifier used in reports, normally the file stem.
    pub id: String,
    /// File the genome was loaded from, when known.
    pub source: Option<PathBuf>,
    pub contigs: Vec<Sequence>,
}

impl Genome {
    pub fn new(id: impl Into<String>, contigs: Vec<Sequence>) -> Self {
        Self {
            id: id.into(),
            source: None,
            contigs,
        }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Total bases over all contigs.
    pub fn len(&self) -> usize {
        self.contigs.iter().map(Sequence::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.iter().all(Sequence::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sequence() {
        let seq = Sequence::new("test", "atcgatcg");
        assert_eq!(seq.name, "test");
        assert_eq!(seq.sequence, "ATCGATCG");
        assert_eq!(seq.len(), 8);
    }

    #[test]
    fn test_genome_contigs() {
        let genome = Genome::new(
            "g1",
            vec![Sequence::new("chr", "ACGT"), Sequence::new("plasmid", "GG")],
        )
        .with_source("fg/g1.fasta");
        assert_eq!(genome.len(), 6);
        assert!(!genome.is_empty());
        assert_eq!(genome.source, Some(PathBuf::from("fg/g1.fasta")));
        assert!(Genome::new("empty", vec![Sequence::new("c", "")]).is_empty());
    }
}
