use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use camplicon_core::operations::reverse_complement;
use camplicon_core::{Error, Feasibility, FeasibilityChecker, KmerCounter, PrimerCandidate, Result};
use camplicon_formats::{primers, read_sequences};
use camplicon_pipeline::{Inputs, Pipeline, RunConfig, Stage, StageError, Tools};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const M1: &str = "ACGGTCATGCAAGTCC";
const M2: &str = "TTGCAGGCATCGAAGT";
const K: usize = 16;

/// Counts forward-strand k-mers of every record in a genome file.
struct MemoryCounter;

impl KmerCounter for MemoryCounter {
    fn count(&self, genome: &Path, kmer_len: usize) -> Result<Vec<(String, u64)>> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for record in read_sequences(genome)? {
            let bases = record.sequence.as_bytes();
            for window in bases.windows(kmer_len) {
                let kmer = String::from_utf8_lossy(window).into_owned();
                *counts.entry(kmer).or_insert(0) += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }
}

struct AcceptAll;

impl FeasibilityChecker for AcceptAll {
    fn check(&self, _sequence: &str) -> Result<Feasibility> {
        Ok(Feasibility::passed(0.5, 60.0))
    }
}

struct RejectAll;

impl FeasibilityChecker for RejectAll {
    fn check(&self, _sequence: &str) -> Result<Feasibility> {
        Ok(Feasibility::failed())
    }
}

/// Accepts everything and counts the pair checks it was asked for.
#[derive(Default)]
struct CountingChecker {
    pair_checks: AtomicUsize,
}

impl FeasibilityChecker for CountingChecker {
    fn check(&self, _sequence: &str) -> Result<Feasibility> {
        Ok(Feasibility::passed(0.5, 60.0))
    }

    fn check_pair(&self, _forward: &PrimerCandidate, _reverse: &PrimerCandidate) -> Result<Feasibility> {
        self.pair_checks.fetch_add(1, Ordering::SeqCst);
        Ok(Feasibility::passed(1.0, 60.0))
    }
}

fn random_dna(seed: u64, len: usize) -> String {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b"ACGT"[(state >> 33) as usize % 4] as char
        })
        .collect()
}

struct Fixture {
    dir: TempDir,
    inputs: Inputs,
}

impl Fixture {
    /// Two foreground genomes sharing only the 16-mers M1 and M2, with
    /// different spacers between them, and one unrelated background genome.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fg = dir.path().join("fg");
        let bg = dir.path().join("bg");
        fs::create_dir(&fg).unwrap();
        fs::create_dir(&bg).unwrap();

        let a = format!("{}{}{}{}{}", random_dna(1, 60), M1, random_dna(2, 50), M2, random_dna(3, 40));
        let b = format!("{}{}{}{}{}", random_dna(4, 30), M1, random_dna(5, 80), M2, random_dna(6, 30));
        fs::write(fg.join("a.fasta"), format!(">a_chr\n{}\n", a)).unwrap();
        fs::write(fg.join("b.fna"), format!(">b_chr\n{}\n", b)).unwrap();
        fs::write(bg.join("x.fa"), format!(">x_chr\n{}\n", random_dna(7, 300))).unwrap();

        let inputs = Inputs {
            foreground: fg,
            background: bg,
            reference: None,
        };
        Self { dir, inputs }
    }

    fn config(&self) -> RunConfig {
        RunConfig {
            threads: 2,
            output_dir: self.dir.path().join("out"),
            kmer_len: K,
            min_length: 10,
            max_length: 1000,
            seed: Some(11),
            ..RunConfig::default()
        }
    }

    fn output(&self, suffix: &str) -> PathBuf {
        self.dir.path().join("out").join(format!("camplicon{}", suffix))
    }
}

#[test]
fn test_full_workflow_ranks_shared_markers() {
    let fx = Fixture::new();
    let pipeline = Pipeline::new(fx.config()).unwrap();
    let tools = Tools {
        counter: Some(&MemoryCounter),
        checker: Some(&AcceptAll),
        aligner: None,
    };

    let outcome = pipeline.run_full(&fx.inputs, tools).unwrap();
    assert!(outcome.diagnostic().is_none());
    assert_eq!(outcome.report.stage, Stage::Predict);
    assert_eq!(outcome.report.pairs.len(), 1);

    let best = &outcome.report.pairs[0];
    assert_eq!(best.rank, 1);
    assert_eq!(best.pair.forward.sequence, M1);
    assert_eq!(best.pair.reverse.sequence, reverse_complement(M2));
    assert_eq!(best.pair.forward.id, "0");
    assert_eq!(best.pair.reverse.id, "1rc");
    assert_eq!(best.stats.in_group.hit_count, 2);
    assert_eq!(best.stats.in_group.distinct_products, 2);
    assert!((best.stats.in_group.information_content - 1.0).abs() < 1e-9);
    assert_eq!(best.stats.out_group.hit_count, 0);

    let table = fs::read_to_string(fx.output("_kmers.tsv")).unwrap();
    assert!(table.starts_with("#genomes\t2\n#k\t16\n"));

    let written = primers::parse(&fs::read_to_string(fx.output("_primers.fasta")).unwrap()).unwrap();
    let mut seqs: Vec<&str> = written.iter().map(|p| p.sequence.as_str()).collect();
    seqs.sort_unstable();
    let (m1rc, m2rc) = (reverse_complement(M1), reverse_complement(M2));
    let mut expected = vec![M1, M2, m1rc.as_str(), m2rc.as_str()];
    expected.sort_unstable();
    assert_eq!(seqs, expected);

    let pairs = fs::read_to_string(fx.output("_pairs.tsv")).unwrap();
    assert_eq!(pairs.lines().count(), 2);
    assert!(pairs.lines().nth(1).unwrap().starts_with("1\t2\t0\t"));

    assert_eq!(
        fs::read_to_string(fx.output("_products.tab")).unwrap(),
        "a\ta_chr\tFG\tProduct0\t60\t141\nb\tb_chr\tFG\tProduct1\t30\t141\n"
    );
    let products = fs::read_to_string(fx.output("_products.fasta")).unwrap();
    assert!(products.starts_with(">Product0_82\n"));
    assert!(products.contains(">Product1_112\n"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outcome.report_path).unwrap()).unwrap();
    assert_eq!(report["command"], "full");
    assert_eq!(report["outputs"].as_array().map(Vec::len), Some(5));
}

#[test]
fn test_rejected_kmers_give_empty_report() {
    let fx = Fixture::new();
    let pipeline = Pipeline::new(fx.config()).unwrap();
    let tools = Tools {
        counter: Some(&MemoryCounter),
        checker: Some(&RejectAll),
        aligner: None,
    };

    let outcome = pipeline.run_full(&fx.inputs, tools).unwrap();
    let diagnostic = outcome.diagnostic().unwrap();
    assert_eq!(diagnostic.stage, Stage::Primers);
    assert!(diagnostic.message.contains("feasibility"));
    assert!(outcome.report.pairs.is_empty());
    assert!(outcome.report_path.exists());
    assert!(fx.output("_kmers.tsv").exists());
    assert!(!fx.output("_primers.fasta").exists());
}

#[test]
fn test_filter_with_reference_context() {
    let fx = Fixture::new();
    let primer_file = fx.dir.path().join("primers.fasta");
    let candidates = vec![
        PrimerCandidate::new("p1", M1).unwrap(),
        PrimerCandidate::new("p2", &reverse_complement(M2)).unwrap(),
    ];
    fs::write(&primer_file, primers::serialize(&candidates)).unwrap();

    let reference = fx.dir.path().join("a.gb");
    fs::write(
        &reference,
        "LOCUS       a_chr                   222 bp    DNA     linear\n\
FEATURES             Location/Qualifiers\n\
\x20    gene            41..200\n\
\x20                    /gene=\"abcX\"\n\
\x20                    /locus_tag=\"ga1\"\n\
\x20    gene            complement(180..220)\n\
\x20                    /locus_tag=\"ga2\"\n\
//\n",
    )
    .unwrap();

    let mut inputs = fx.inputs.clone();
    inputs.reference = Some(reference);
    let pipeline = Pipeline::new(fx.config()).unwrap();
    let tools = Tools {
        checker: Some(&AcceptAll),
        ..Tools::default()
    };

    let outcome = pipeline.run_filter(&primer_file, &inputs, tools).unwrap();
    assert_eq!(outcome.report.pairs.len(), 1);
    assert_eq!(outcome.report.pairs[0].context, "ga1,abcX");
    assert_eq!(outcome.report.pairs[0].pair.penalty, 1.0);
    assert_eq!(outcome.report.stage, Stage::Filter);
}

#[test]
fn test_predict_lists_products() {
    let fx = Fixture::new();
    let pipeline = Pipeline::new(fx.config()).unwrap();

    let outcome = pipeline
        .run_predict(M1, &reverse_complement(M2), &fx.inputs)
        .unwrap();
    assert!(outcome.diagnostic().is_none());
    let tab = fs::read_to_string(fx.output("_products.tab")).unwrap();
    assert_eq!(tab.lines().count(), 2);
    assert!(tab.lines().all(|l| l.contains("\tFG\t")));

    // the same primer twice is not a pair
    let err = pipeline.run_predict(M1, M1, &fx.inputs).unwrap_err();
    assert_eq!(err.stage, Stage::Predict);
    assert!(matches!(err.error, Error::MalformedInput { .. }));
}

#[test]
fn test_predict_without_product_is_diagnostic() {
    let fx = Fixture::new();
    let pipeline = Pipeline::new(fx.config()).unwrap();
    let outcome = pipeline.run_predict(M2, &reverse_complement(M1), &fx.inputs).unwrap();
    assert_eq!(outcome.diagnostic().map(|d| d.stage), Some(Stage::Predict));
    assert_eq!(fs::read_to_string(fx.output("_products.tab")).unwrap(), "");
}

#[test]
fn test_missing_directory_names_stage_and_path() {
    let fx = Fixture::new();
    let primer_file = fx.dir.path().join("primers.fasta");
    fs::write(&primer_file, ">p1\nACGTACGTAC\n>p2\nGGGTTTCCCA\n").unwrap();
    let mut inputs = fx.inputs.clone();
    inputs.foreground = fx.dir.path().join("missing");

    let pipeline = Pipeline::new(fx.config()).unwrap();
    let tools = Tools {
        checker: Some(&AcceptAll),
        ..Tools::default()
    };
    let err: StageError = pipeline.run_filter(&primer_file, &inputs, tools).unwrap_err();
    assert_eq!(err.stage, Stage::Filter);
    let message = err.to_string();
    assert!(message.starts_with("[filter] malformed input"));
    assert!(message.contains("missing"));
}

#[test]
fn test_bad_genome_directory_fails_before_pair_checks() {
    let fx = Fixture::new();
    let primer_file = fx.dir.path().join("primers.fasta");
    fs::write(&primer_file, ">p1\nACGTACGTAC\n>p2\nGGGTTTCCCA\n>p3\nTTGACCAGGT\n").unwrap();
    let empty = fx.dir.path().join("empty");
    fs::create_dir(&empty).unwrap();
    let mut inputs = fx.inputs.clone();
    inputs.foreground = empty;

    let checker = CountingChecker::default();
    let pipeline = Pipeline::new(fx.config()).unwrap();
    let tools = Tools {
        checker: Some(&checker),
        ..Tools::default()
    };
    let err = pipeline.run_filter(&primer_file, &inputs, tools).unwrap_err();
    assert_eq!(err.stage, Stage::Filter);
    assert!(matches!(err.error, Error::MalformedInput { .. }));
    assert_eq!(checker.pair_checks.load(Ordering::SeqCst), 0);
    assert!(!fx.output("_pairs.tsv").exists());
}

#[test]
fn test_cancelled_run() {
    let fx = Fixture::new();
    let pipeline = Pipeline::new(fx.config()).unwrap();
    pipeline.cancel_token().cancel();
    let tools = Tools {
        counter: Some(&MemoryCounter),
        checker: Some(&AcceptAll),
        aligner: None,
    };
    let err = pipeline.run_full(&fx.inputs, tools).unwrap_err();
    assert_eq!(err.stage, Stage::Kmers);
    assert!(matches!(err.error, Error::Cancelled));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = RunConfig {
        min_length: 900,
        max_length: 100,
        ..RunConfig::default()
    };
    assert!(matches!(Pipeline::new(config), Err(Error::Configuration(_))));
}
