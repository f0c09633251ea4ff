//! Genome discovery and loading.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use camplicon_core::{Error, Genome, Result};
use camplicon_formats::{detect, read_sequences};
use rayon::prelude::*;

use crate::evaluate::CancelToken;

/// Sequence files (`.fasta`, `.fa`, `.fna`) directly inside `dir`, sorted.
pub fn find_sequence_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let input = dir.display().to_string();
    if !dir.is_dir() {
        return Err(Error::malformed(input, "not a directory"));
    }
    let entries = fs::read_dir(dir).map_err(|e| Error::malformed(&input, e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::malformed(&input, e.to_string()))?.path();
        if path.is_file() && detect::is_sequence_file(&path) {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(Error::malformed(
            input,
            "no .fasta, .fa or .fna files in directory",
        ));
    }
    files.sort();
    Ok(files)
}

/// Genome id for a file: its name without the extension.
pub fn genome_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn load_genome(path: &Path) -> Result<Genome> {
    let contigs = read_sequences(path)?;
    let genome = Genome::new(genome_id(path), contigs).with_source(path);
    log::debug!(
        "loaded {} ({} contigs, {} bp)",
        path.display(),
        genome.contigs.len(),
        genome.len()
    );
    Ok(genome)
}

/// Parse every file in parallel on the current rayon pool, keeping input order.
///
/// Genome ids must be unique within the set.
pub fn load_genomes(paths: &[PathBuf], cancel: &CancelToken) -> Result<Vec<Genome>> {
    let genomes = paths
        .par_iter()
        .map(|path| {
            cancel.check()?;
            load_genome(path)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for genome in &genomes {
        if !seen.insert(genome.id.as_str()) {
            return Err(Error::malformed(
                genome.id.as_str(),
                "two genome files share this name",
            ));
        }
    }
    Ok(genomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_find_sequence_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.fna", ">b\nACGT\n");
        write(dir.path(), "a.fasta", ">a\nACGT\n");
        write(dir.path(), "c.fa", ">c\nACGT\n");
        write(dir.path(), "notes.txt", "ignored");
        fs::create_dir(dir.path().join("sub.fa")).unwrap();

        let files = find_sequence_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| genome_id(p)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_or_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_sequence_files(dir.path()),
            Err(Error::MalformedInput { .. })
        ));
        let missing = dir.path().join("nope");
        let err = find_sequence_files(&missing).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_load_genomes() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.fasta", ">chr1\nacgtac\n>plasmid\nGGCC\n");
        let b = write(dir.path(), "b.fa", ">chr\nTTTT\n");

        let genomes = load_genomes(&[a.clone(), b], &CancelToken::new()).unwrap();
        assert_eq!(genomes.len(), 2);
        assert_eq!(genomes[0].id, "a");
        assert_eq!(genomes[0].contigs.len(), 2);
        assert_eq!(genomes[0].contigs[0].sequence, "ACGTAC");
        assert_eq!(genomes[0].source.as_deref(), Some(a.as_path()));
        assert_eq!(genomes[1].id, "b");
    }

    #[test]
    fn test_malformed_genome_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "bad.fasta", "ACGT\n");
        let err = load_genomes(&[bad], &CancelToken::new()).unwrap_err();
        match err {
            Error::MalformedInput { input, .. } => assert!(input.ends_with("bad.fasta")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_genome_ids() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "x.fasta", ">1\nACGT\n");
        let b = write(dir.path(), "x.fa", ">2\nACGT\n");
        assert!(load_genomes(&[a, b], &CancelToken::new()).is_err());
    }

    #[test]
    fn test_cancelled_load() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.fasta", ">1\nACGT\n");
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(load_genomes(&[a], &cancel), Err(Error::Cancelled)));
    }
}
