//! The stages of a run and the commands chaining them.
//!
//! Stage methods (`kmers`, `primers`, `filter`, `predict`) do the work and
//! write their own output files. Command methods (`run_*`) wrap them the way
//! the command line does: they always write `{prefix}_report.json` and turn
//! running out of candidates into a diagnostic instead of an error.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use camplicon_core::rank::rank;
use camplicon_core::{
    build_pairs, context, BackgroundAligner, CandidateSelector, Error, FeasibilityChecker,
    KmerCounter, KmerPool, PairResult, PcrEngine, PrimerCandidate, PrimerPair, ProductAggregator,
    Ranked, Result,
};
use camplicon_formats::{kmers, primers, read_sequences, report};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::RunConfig;
use crate::evaluate::{thread_pool, CancelToken, Evaluator, GenomeSets};
use crate::genomes::{find_sequence_files, genome_id, load_genomes};
use crate::report::{Diagnostic, RunReport};
use crate::stage::{InStage, Stage, StageError, StageResult};

/// Genome directories of a run and the optional annotated reference.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub foreground: PathBuf,
    pub background: PathBuf,
    /// GenBank file used to name the genes a pair amplifies.
    pub reference: Option<PathBuf>,
}

/// The external capabilities a command may need.
#[derive(Clone, Copy, Default)]
pub struct Tools<'a> {
    pub counter: Option<&'a dyn KmerCounter>,
    pub checker: Option<&'a dyn FeasibilityChecker>,
    pub aligner: Option<&'a dyn BackgroundAligner>,
}

impl<'a> Tools<'a> {
    fn counter(&self, stage: Stage) -> StageResult<&'a dyn KmerCounter> {
        self.counter
            .ok_or_else(|| Error::config("no k-mer counter configured"))
            .in_stage(stage)
    }

    fn checker(&self, stage: Stage) -> StageResult<&'a dyn FeasibilityChecker> {
        self.checker
            .ok_or_else(|| Error::config("no feasibility checker configured"))
            .in_stage(stage)
    }
}

/// What a command left behind.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    pub report_path: PathBuf,
}

impl RunOutcome {
    /// Set when a stage ran out of candidates.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.report.diagnostics.first()
    }
}

pub struct Pipeline {
    config: RunConfig,
    pool: ThreadPool,
    cancel: CancelToken,
}

impl Pipeline {
    /// Validate the configuration and start the worker pool.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let pool = thread_pool(config.threads)?;
        log::debug!("worker pool of {} threads", pool.current_num_threads());
        Ok(Self {
            config,
            pool,
            cancel: CancelToken::new(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Token that stops the run at the next (pair, genome) unit or file.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn write_output(&self, stage: Stage, suffix: &str, content: &str) -> StageResult<PathBuf> {
        let path = self.config.output_path(suffix);
        let write = || -> Result<()> {
            fs::create_dir_all(&self.config.output_dir)
                .map_err(|e| Error::output(self.config.output_dir.display().to_string(), e.to_string()))?;
            fs::write(&path, content).map_err(|e| Error::output(path.display().to_string(), e.to_string()))
        };
        write().in_stage(stage)?;
        log::info!("[{}] wrote {}", stage, path.display());
        Ok(path)
    }

    fn load_groups(&self, stage: Stage, inputs: &Inputs) -> StageResult<GenomeSets> {
        let fg = find_sequence_files(&inputs.foreground).in_stage(stage)?;
        let bg = find_sequence_files(&inputs.background).in_stage(stage)?;
        let genomes = self
            .pool
            .install(|| -> Result<GenomeSets> {
                Ok(GenomeSets {
                    in_group: load_genomes(&fg, &self.cancel)?,
                    out_group: load_genomes(&bg, &self.cancel)?,
                })
            })
            .in_stage(stage)?;
        log::info!(
            "[{}] loaded {} in-group and {} out-group genomes",
            stage,
            genomes.in_group.len(),
            genomes.out_group.len()
        );
        Ok(genomes)
    }

    /// Count k-mers occurring once in each foreground genome, drop every k-mer
    /// found in a background genome and write `{prefix}_kmers.tsv`.
    pub fn kmers(&self, inputs: &Inputs, counter: &dyn KmerCounter) -> StageResult<KmerPool> {
        let stage = Stage::Kmers;
        let k = self.config.kmer_len;
        let fg = find_sequence_files(&inputs.foreground).in_stage(stage)?;
        let bg = find_sequence_files(&inputs.background).in_stage(stage)?;
        log::info!(
            "[{}] counting {}-mers in {} foreground and {} background files",
            stage,
            k,
            fg.len(),
            bg.len()
        );

        let pool = self
            .pool
            .install(|| -> Result<KmerPool> {
                let partial = fg
                    .par_iter()
                    .map(|path| {
                        self.cancel.check()?;
                        let counts = counter.count(path, k)?;
                        let mut pool = KmerPool::new(k)?;
                        pool.ingest_counts(&genome_id(path), counts)?;
                        Ok(pool)
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut pool = KmerPool::new(k)?;
                for other in partial {
                    pool.merge(other)?;
                }
                log::info!("[{}] {} k-mers unique within a foreground genome", stage, pool.len());

                let masked = bg
                    .par_iter()
                    .map(|path| {
                        self.cancel.check()?;
                        counter.count(path, k)
                    })
                    .collect::<Result<Vec<_>>>()?;
                for (path, counts) in bg.iter().zip(masked) {
                    let removed = pool.mask(counts.into_iter().map(|(kmer, _)| kmer));
                    log::debug!("masked {} k-mers found in {}", removed, path.display());
                }
                Ok(pool)
            })
            .in_stage(stage)?;

        log::info!("[{}] {} k-mers left after masking", stage, pool.len());
        if pool.is_empty() {
            log::warn!("[{}] no foreground-specific k-mers", stage);
        }
        self.write_output(stage, "_kmers.tsv", &kmers::serialize(&pool))?;
        Ok(pool)
    }

    /// Pick k-mers, keep those the checker accepts, add their reverse
    /// complements and write `{prefix}_primers.fasta`.
    pub fn primers(
        &self,
        pool: &KmerPool,
        checker: &dyn FeasibilityChecker,
    ) -> StageResult<Vec<PrimerCandidate>> {
        let stage = Stage::Primers;
        if pool.is_empty() {
            return Err(StageError::new(
                stage,
                Error::NoViableCandidates("the k-mer table is empty".to_string()),
            ));
        }
        let min_freq = self.config.min_freq.unwrap_or_else(|| pool.max_frequency());
        let selector = self
            .config
            .seed
            .map(CandidateSelector::seeded)
            .unwrap_or_default();
        let selected = selector.select(pool, min_freq, self.config.max_candidates);
        log::info!(
            "[{}] checking {} k-mers present in at least {} of {} genomes",
            stage,
            selected.len(),
            min_freq,
            pool.genome_count()
        );
        if selected.is_empty() {
            return Err(StageError::new(
                stage,
                Error::NoViableCandidates(format!(
                    "no k-mer is present in {} or more genomes",
                    min_freq
                )),
            ));
        }

        let verdicts = self
            .pool
            .install(|| {
                selected
                    .par_iter()
                    .map(|record| {
                        self.cancel.check()?;
                        checker.check(&record.sequence)
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .in_stage(stage)?;

        let passing: Vec<PrimerCandidate> = selected
            .iter()
            .zip(&verdicts)
            .enumerate()
            .filter(|(_, (_, verdict))| verdict.pass)
            .map(|(i, (record, verdict))| PrimerCandidate::from_kmer(i.to_string(), record, verdict))
            .collect();
        if passing.is_empty() {
            return Err(StageError::new(
                stage,
                Error::NoViableCandidates("no k-mer passed the feasibility check".to_string()),
            ));
        }
        let mut seen = HashSet::new();
        let candidates: Vec<PrimerCandidate> = passing
            .iter()
            .cloned()
            .chain(passing.iter().map(PrimerCandidate::reverse_complement))
            .filter(|p| seen.insert(p.sequence.clone()))
            .collect();
        log::info!(
            "[{}] {} of {} k-mers passed, {} primers with reverse complements",
            stage,
            passing.len(),
            selected.len(),
            candidates.len()
        );
        self.write_output(stage, "_primers.fasta", &primers::serialize(&candidates))?;
        Ok(candidates)
    }

    /// Pair primers, keep feasible pairs, simulate them against both genome
    /// groups, rank them and write `{prefix}_pairs.tsv`.
    pub fn filter(
        &self,
        candidates: &[PrimerCandidate],
        inputs: &Inputs,
        checker: &dyn FeasibilityChecker,
        aligner: Option<&dyn BackgroundAligner>,
    ) -> StageResult<Vec<Ranked>> {
        let stage = Stage::Filter;
        let no_viable = |reason: &str| {
            StageError::new(stage, Error::NoViableCandidates(reason.to_string()))
        };
        let aggregator =
            ProductAggregator::new(self.config.min_length, self.config.max_length).in_stage(stage)?;
        let reference = match &inputs.reference {
            Some(path) => Some(read_sequences(path).in_stage(stage)?),
            None => None,
        };
        let genomes = self.load_groups(stage, inputs)?;

        let limit = match self.config.max_primers {
            0 => candidates.len(),
            n => n.min(candidates.len()),
        };
        let candidates = &candidates[..limit];
        let pairs = build_pairs(candidates);
        log::info!(
            "[{}] {} primers give {} pairs",
            stage,
            candidates.len(),
            pairs.len()
        );
        if pairs.is_empty() {
            return Err(no_viable("fewer than two distinct primers"));
        }

        let pairs = self
            .pool
            .install(|| {
                pairs
                    .into_par_iter()
                    .map(|mut pair| {
                        self.cancel.check()?;
                        let verdict = checker.check_pair(&pair.forward, &pair.reverse)?;
                        pair.penalty = verdict.penalty;
                        Ok(verdict.pass.then_some(pair))
                    })
                    .collect::<Result<Vec<Option<PrimerPair>>>>()
            })
            .in_stage(stage)?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        log::info!("[{}] {} pairs passed the pair check", stage, pairs.len());
        if pairs.is_empty() {
            return Err(no_viable("no primer pair passed the pair feasibility check"));
        }

        let results = self.evaluate(stage, &pairs, &genomes, aggregator, aligner)?;
        let mut ranked = rank(results, &self.config.ranking);
        if ranked.is_empty() {
            return Err(no_viable("no pair amplifies an in-group genome within the length bounds"));
        }
        if let Some(records) = &reference {
            for r in &mut ranked {
                r.context = context::locate(records, &r.result.in_group);
            }
        }
        log::info!(
            "[{}] {} pairs ranked, best score {:.4}",
            stage,
            ranked.len(),
            ranked[0].score
        );
        self.write_output(stage, "_pairs.tsv", &report::pairs_tsv(&ranked))?;
        Ok(ranked)
    }

    fn evaluate(
        &self,
        stage: Stage,
        pairs: &[PrimerPair],
        genomes: &GenomeSets,
        aggregator: ProductAggregator,
        aligner: Option<&dyn BackgroundAligner>,
    ) -> StageResult<Vec<PairResult>> {
        let engine = PcrEngine::new()
            .with_mismatches(self.config.max_mismatches)
            .with_max_product_len(self.config.max_product_len);
        let mut evaluator = Evaluator::new(engine, aggregator, self.cancel.clone());
        if let Some(aligner) = aligner {
            evaluator = evaluator.with_aligner(aligner);
        }
        self.pool
            .install(|| evaluator.evaluate(pairs, genomes))
            .in_stage(stage)
    }

    /// Simulate one primer pair and write `{prefix}_products.fasta` and
    /// `{prefix}_products.tab`.
    pub fn predict(&self, pair: PrimerPair, genomes: &GenomeSets) -> StageResult<PairResult> {
        let stage = Stage::Predict;
        let aggregator =
            ProductAggregator::new(self.config.min_length, self.config.max_length).in_stage(stage)?;
        let mut results = self.evaluate(stage, std::slice::from_ref(&pair), genomes, aggregator, None)?;
        let result = results.pop().ok_or_else(|| {
            StageError::new(stage, Error::NoViableCandidates("nothing simulated".to_string()))
        })?;
        self.write_products(&result)?;
        if result.stats.in_group.hit_count == 0 {
            return Err(StageError::new(
                stage,
                Error::NoViableCandidates(format!(
                    "{} / {} amplifies no in-group genome",
                    pair.forward.sequence, pair.reverse.sequence
                )),
            ));
        }
        Ok(result)
    }

    fn write_products(&self, result: &PairResult) -> StageResult<()> {
        let listing = report::products(&result.in_group, &result.out_group);
        self.write_output(Stage::Predict, "_products.fasta", &listing.fasta)?;
        self.write_output(Stage::Predict, "_products.tab", &listing.tab)?;
        log::info!(
            "[{}] {} in-group and {} out-group products",
            Stage::Predict,
            result.in_group.product_count(),
            result.out_group.product_count()
        );
        Ok(())
    }

    /// Write the report, recording an empty result as a diagnostic.
    fn conclude(&self, mut report: RunReport, result: StageResult<()>) -> StageResult<RunOutcome> {
        match result {
            Ok(()) => {}
            Err(StageError {
                stage,
                error: Error::NoViableCandidates(message),
            }) => {
                log::warn!("[{}] no viable candidates: {}", stage, message);
                report.stage = stage;
                report.diagnostics.push(Diagnostic { stage, message });
            }
            Err(e) => return Err(e),
        }
        let report_path = self.config.output_path("_report.json");
        let json = report.to_json().in_stage(report.stage)?;
        self.write_output(report.stage, "_report.json", &json)?;
        Ok(RunOutcome {
            report,
            report_path,
        })
    }

    fn record(&self, report: &mut RunReport, stage: Stage, suffix: &str) {
        report.stage = stage;
        report.outputs.push(self.config.output_path(suffix));
    }

    pub fn run_kmers(&self, inputs: &Inputs, tools: Tools<'_>) -> StageResult<RunOutcome> {
        let mut report = RunReport::new("kmers", Stage::Kmers, &self.config);
        let result = tools.counter(Stage::Kmers).and_then(|counter| {
            self.kmers(inputs, counter)?;
            self.record(&mut report, Stage::Kmers, "_kmers.tsv");
            Ok(())
        });
        self.conclude(report, result)
    }

    pub fn run_primers(&self, kmer_file: &Path, tools: Tools<'_>) -> StageResult<RunOutcome> {
        let mut report = RunReport::new("primers", Stage::Primers, &self.config);
        let result = (|| -> StageResult<()> {
            let checker = tools.checker(Stage::Primers)?;
            let pool = read_kmer_table(kmer_file).in_stage(Stage::Primers)?;
            self.primers(&pool, checker)?;
            self.record(&mut report, Stage::Primers, "_primers.fasta");
            Ok(())
        })();
        self.conclude(report, result)
    }

    pub fn run_filter(
        &self,
        primer_file: &Path,
        inputs: &Inputs,
        tools: Tools<'_>,
    ) -> StageResult<RunOutcome> {
        let mut report = RunReport::new("filter", Stage::Filter, &self.config);
        let result = (|| -> StageResult<()> {
            let checker = tools.checker(Stage::Filter)?;
            let candidates = read_primers(primer_file).in_stage(Stage::Filter)?;
            let ranked = self.filter(&candidates, inputs, checker, tools.aligner)?;
            self.record(&mut report, Stage::Filter, "_pairs.tsv");
            report.set_pairs(&ranked);
            Ok(())
        })();
        self.conclude(report, result)
    }

    pub fn run_predict(
        &self,
        forward: &str,
        reverse: &str,
        inputs: &Inputs,
    ) -> StageResult<RunOutcome> {
        let mut report = RunReport::new("predict", Stage::Predict, &self.config);
        let result = (|| -> StageResult<()> {
            let pair = user_pair(forward, reverse).in_stage(Stage::Predict)?;
            let genomes = self.load_groups(Stage::Predict, inputs)?;
            self.record(&mut report, Stage::Predict, "_products.fasta");
            self.record(&mut report, Stage::Predict, "_products.tab");
            self.predict(pair, &genomes)?;
            Ok(())
        })();
        self.conclude(report, result)
    }

    /// kmers, primers, filter, then the products of the best pair.
    pub fn run_full(&self, inputs: &Inputs, tools: Tools<'_>) -> StageResult<RunOutcome> {
        let mut report = RunReport::new("full", Stage::Kmers, &self.config);
        let result = (|| -> StageResult<()> {
            let counter = tools.counter(Stage::Kmers)?;
            let checker = tools.checker(Stage::Primers)?;
            let pool = self.kmers(inputs, counter)?;
            self.record(&mut report, Stage::Kmers, "_kmers.tsv");
            self.search(&mut report, &pool, inputs, checker, tools.aligner)
        })();
        self.conclude(report, result)
    }

    /// The full workflow starting from an existing k-mer table.
    pub fn run_pfp(&self, kmer_file: &Path, inputs: &Inputs, tools: Tools<'_>) -> StageResult<RunOutcome> {
        let mut report = RunReport::new("pfp", Stage::Primers, &self.config);
        let result = (|| -> StageResult<()> {
            let checker = tools.checker(Stage::Primers)?;
            let pool = read_kmer_table(kmer_file).in_stage(Stage::Primers)?;
            self.search(&mut report, &pool, inputs, checker, tools.aligner)
        })();
        self.conclude(report, result)
    }

    fn search(
        &self,
        report: &mut RunReport,
        pool: &KmerPool,
        inputs: &Inputs,
        checker: &dyn FeasibilityChecker,
        aligner: Option<&dyn BackgroundAligner>,
    ) -> StageResult<()> {
        report.stage = Stage::Primers;
        let candidates = self.primers(pool, checker)?;
        self.record(report, Stage::Primers, "_primers.fasta");

        report.stage = Stage::Filter;
        let ranked = self.filter(&candidates, inputs, checker, aligner)?;
        self.record(report, Stage::Filter, "_pairs.tsv");
        report.set_pairs(&ranked);

        // the best pair was already simulated with the same bounds
        let best = &ranked[0].result;
        report.stage = Stage::Predict;
        self.write_products(best)?;
        self.record(report, Stage::Predict, "_products.fasta");
        self.record(report, Stage::Predict, "_products.tab");
        Ok(())
    }
}

/// Load a k-mer table written by the kmers stage, or a plain `kmc_dump` listing.
pub fn read_kmer_table(path: &Path) -> Result<KmerPool> {
    let text = fs::read_to_string(path).map_err(|e| Error::malformed(path.display().to_string(), e.to_string()))?;
    let table = kmers::parse(&text).map_err(|e| e.at(path.display()))?;
    table.into_pool().map_err(|e| match e {
        Error::MalformedInput { reason, .. } => Error::malformed(path.display().to_string(), reason),
        other => other,
    })
}

pub fn read_primers(path: &Path) -> Result<Vec<PrimerCandidate>> {
    let text = fs::read_to_string(path).map_err(|e| Error::malformed(path.display().to_string(), e.to_string()))?;
    primers::parse(&text).map_err(|e| e.at(path.display()))
}

/// The pair given on the command line to `predict`.
pub fn user_pair(forward: &str, reverse: &str) -> Result<PrimerPair> {
    PrimerPair::new(
        0,
        PrimerCandidate::new("fwd", forward)?,
        PrimerCandidate::new("rev", reverse)?,
    )
}
