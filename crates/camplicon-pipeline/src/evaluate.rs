//! Parallel in-silico PCR of every pair against every genome.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use camplicon_core::{
    BackgroundAligner, BindingHit, Error, Genome, Group, PairAccumulator, PairResult, PcrEngine,
    PrimerCandidate, PrimerPair, Product, ProductAggregator, Result,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the flag is set.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

pub fn thread_pool(threads: usize) -> Result<ThreadPool> {
    let n = if threads == 0 { num_cpus::get() } else { threads }.max(1);
    ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map_err(|e| Error::config(format!("cannot start {} worker threads: {}", n, e)))
}

/// In-group and out-group genomes loaded for one run.
#[derive(Debug, Clone, Default)]
pub struct GenomeSets {
    pub in_group: Vec<Genome>,
    pub out_group: Vec<Genome>,
}

impl GenomeSets {
    fn groups(&self) -> [(Group, &[Genome]); 2] {
        [
            (Group::In, self.in_group.as_slice()),
            (Group::Out, self.out_group.as_slice()),
        ]
    }
}

/// Runs the PCR engine over (pair, genome) units and folds each pair's
/// products into a [`PairResult`].
///
/// Call [`Evaluator::evaluate`] inside `ThreadPool::install` to bound the
/// worker count.
pub struct Evaluator<'a> {
    engine: PcrEngine,
    aggregator: ProductAggregator,
    aligner: Option<&'a dyn BackgroundAligner>,
    cancel: CancelToken,
}

impl<'a> Evaluator<'a> {
    pub fn new(engine: PcrEngine, aggregator: ProductAggregator, cancel: CancelToken) -> Self {
        Self {
            engine,
            aggregator,
            aligner: None,
            cancel,
        }
    }

    /// Take binding sites from an aligner instead of scanning genome sequences.
    pub fn with_aligner(mut self, aligner: &'a dyn BackgroundAligner) -> Self {
        self.aligner = Some(aligner);
        self
    }

    pub fn evaluate(&self, pairs: &[PrimerPair], genomes: &GenomeSets) -> Result<Vec<PairResult>> {
        let hits = match self.aligner {
            Some(aligner) => Some(self.binding_sites(aligner, pairs, genomes)?),
            None => None,
        };

        let results = pairs
            .par_iter()
            .map(|pair| {
                let mut acc = PairAccumulator::new(
                    pair.clone(),
                    genomes.in_group.len(),
                    genomes.out_group.len(),
                );
                for (g, (group, members)) in genomes.groups().into_iter().enumerate() {
                    let products = members
                        .par_iter()
                        .enumerate()
                        .map(|(i, genome)| {
                            self.cancel.check()?;
                            let sites = hits.as_ref().map(|h| h[g][i].as_slice());
                            Ok((genome.id.as_str(), self.products(pair, genome, sites)))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    for (genome_id, found) in products {
                        acc.add(group, genome_id, found);
                    }
                }
                Ok(acc.finish(&self.aggregator))
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "simulated {} pairs against {} in-group and {} out-group genomes",
            results.len(),
            genomes.in_group.len(),
            genomes.out_group.len()
        );
        Ok(results)
    }

    fn products(&self, pair: &PrimerPair, genome: &Genome, hits: Option<&[BindingHit]>) -> Vec<Product> {
        match hits {
            Some(hits) => self.engine.simulate_from_hits(pair, genome, hits).collect(),
            None => self.engine.simulate(pair, genome).collect(),
        }
    }

    /// Align every distinct primer once per genome file.
    fn binding_sites(
        &self,
        aligner: &dyn BackgroundAligner,
        pairs: &[PrimerPair],
        genomes: &GenomeSets,
    ) -> Result<[Vec<Vec<BindingHit>>; 2]> {
        let mut seen = HashSet::new();
        let primers: Vec<PrimerCandidate> = pairs
            .iter()
            .flat_map(|p| [&p.forward, &p.reverse])
            .filter(|c| seen.insert(c.sequence.as_str()))
            .cloned()
            .collect();

        let align_group = |members: &[Genome]| -> Result<Vec<Vec<BindingHit>>> {
            members
                .par_iter()
                .map(|genome| {
                    self.cancel.check()?;
                    let path = genome.source.as_deref().ok_or_else(|| {
                        Error::malformed(genome.id.as_str(), "no source file to align against")
                    })?;
                    aligner.align(&primers, path)
                })
                .collect()
        };
        Ok([align_group(&genomes.in_group)?, align_group(&genomes.out_group)?])
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use camplicon_core::search::find_pattern;
    use camplicon_core::{Sequence, Strand};

    use super::*;

    const FWD: &str = "CCGGTCGCGT";
    const REV_SITE: &str = "AGGCATTGCA";

    fn genome(id: &str, spacer: &str) -> Genome {
        let seq = format!("AAAA{}{}{}TTTT", FWD, spacer, REV_SITE);
        Genome::new(id, vec![Sequence::new(format!("{}_chr", id), seq)])
            .with_source(format!("{}.fasta", id))
    }

    fn pair() -> PrimerPair {
        let fwd = PrimerCandidate::new("f", FWD).unwrap();
        let rev = PrimerCandidate::new("r", REV_SITE).unwrap().reverse_complement();
        PrimerPair::new(0, fwd, rev).unwrap()
    }

    fn sets() -> GenomeSets {
        GenomeSets {
            in_group: vec![genome("a", "GATTACA"), genome("b", "GATTACAGATTACA")],
            out_group: vec![
                genome("x", "GATTACA"),
                Genome::new("y", vec![Sequence::new("y1", "ACGTACGT")]).with_source("y.fasta"),
            ],
        }
    }

    fn evaluator<'a>(cancel: CancelToken) -> Evaluator<'a> {
        Evaluator::new(
            PcrEngine::new(),
            ProductAggregator::new(1, 1000).unwrap(),
            cancel,
        )
    }

    /// Finds binding sites by exact search, the way an aligner would report them.
    struct ScanAligner {
        genomes: GenomeSets,
    }

    impl BackgroundAligner for ScanAligner {
        fn align(&self, primers: &[PrimerCandidate], genome: &Path) -> Result<Vec<BindingHit>> {
            let genome = self
                .genomes
                .in_group
                .iter()
                .chain(&self.genomes.out_group)
                .find(|g| g.source.as_deref() == Some(genome))
                .ok_or_else(|| Error::tool("scan", genome.display().to_string(), "unknown genome"))?;
            let mut hits = Vec::new();
            for primer in primers {
                for contig in &genome.contigs {
                    for m in find_pattern(&contig.sequence, &primer.sequence, 0) {
                        hits.push(BindingHit {
                            primer: primer.sequence.clone(),
                            contig: contig.name.clone(),
                            strand: if m.is_complement { Strand::Reverse } else { Strand::Forward },
                            position: m.start,
                            edit_distance: m.mismatches,
                        });
                    }
                }
            }
            Ok(hits)
        }
    }

    #[test]
    fn test_evaluate_groups() {
        let pool = thread_pool(2).unwrap();
        let results = pool
            .install(|| evaluator(CancelToken::new()).evaluate(&[pair()], &sets()))
            .unwrap();
        assert_eq!(results.len(), 1);

        let stats = &results[0].stats;
        assert_eq!(stats.in_group.genomes, 2);
        assert_eq!(stats.in_group.hit_count, 2);
        assert_eq!(stats.in_group.distinct_products, 2);
        assert_eq!(stats.out_group.genomes, 2);
        assert_eq!(stats.out_group.hit_count, 1);
        assert_eq!(stats.overlap.shared, 1);

        let lengths: Vec<usize> = results[0].in_group.products().map(|p| p.length).collect();
        assert_eq!(lengths, vec![27, 34]);
    }

    #[test]
    fn test_aligner_path_matches_scan() {
        let genomes = sets();
        let aligner = ScanAligner { genomes: genomes.clone() };
        let pool = thread_pool(2).unwrap();
        let scanned = pool
            .install(|| evaluator(CancelToken::new()).evaluate(&[pair()], &genomes))
            .unwrap();
        let aligned = pool
            .install(|| {
                evaluator(CancelToken::new())
                    .with_aligner(&aligner)
                    .evaluate(&[pair()], &genomes)
            })
            .unwrap();
        assert_eq!(scanned[0].in_group, aligned[0].in_group);
        assert_eq!(scanned[0].out_group, aligned[0].out_group);
        assert_eq!(scanned[0].stats, aligned[0].stats);
    }

    #[test]
    fn test_cancelled_run_returns_nothing() {
        let cancel = CancelToken::new();
        let worker = cancel.clone();
        worker.cancel();
        assert!(cancel.is_cancelled());

        let pool = thread_pool(1).unwrap();
        let result = pool.install(|| evaluator(cancel).evaluate(&[pair()], &sets()));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_aligner_needs_source_files() {
        let genomes = GenomeSets {
            in_group: vec![Genome::new("mem", vec![Sequence::new("c", "ACGT")])],
            out_group: vec![],
        };
        let aligner = ScanAligner { genomes: genomes.clone() };
        let result = evaluator(CancelToken::new())
            .with_aligner(&aligner)
            .evaluate(&[pair()], &genomes);
        assert!(matches!(result, Err(Error::MalformedInput { .. })));
    }
}
