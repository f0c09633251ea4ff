pub mod filter;
pub mod kmers;
pub mod predict;
pub mod primers;
pub mod workflow;

use anyhow::{Context, Result};
use camplicon_core::{BackgroundAligner, FeasibilityChecker, KmerCounter};
use camplicon_pipeline::{InStage, Inputs, RunConfig, RunOutcome, Stage, Tools};
use camplicon_tools::{Bwa, Kmc, Primer3};

use crate::cli::{
    Cli, Commands, FilterArgs, GenomeDirs, KmerArgs, Primer3Args, ProductArgs, SelectionArgs,
};

pub fn run(cli: Cli) -> Result<RunOutcome> {
    let config = base_config(&cli)?;
    match &cli.command {
        Commands::Kmers { genomes, kmers } => kmers::run(genomes, kmers, config),
        Commands::Primers {
            kmer_file,
            selection,
            primer3,
        } => primers::run(kmer_file, selection, primer3, config),
        Commands::Filter {
            primer_file,
            genomes,
            filter,
            primer3,
        } => filter::run(primer_file, genomes, filter, primer3, config),
        Commands::Predict {
            genomes,
            forward,
            reverse,
            products,
        } => predict::run(genomes, forward, reverse, products, config),
        Commands::Full {
            genomes,
            kmers,
            selection,
            filter,
            primer3,
        } => workflow::full(genomes, kmers, selection, filter, primer3, config),
        Commands::Pfp {
            kmer_file,
            genomes,
            selection,
            filter,
            primer3,
        } => workflow::pfp(kmer_file, genomes, selection, filter, primer3, config),
    }
}

/// Settings from `--config`, then the global flags.
pub fn base_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    if let Some(prefix) = &cli.prefix {
        config.prefix = prefix.clone();
    }
    if let Some(dir) = &cli.out_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

impl GenomeDirs {
    pub fn inputs(&self, filter: Option<&FilterArgs>) -> Inputs {
        Inputs {
            foreground: self.foreground.clone(),
            background: self.background.clone(),
            reference: filter.and_then(|f| f.reference.clone()),
        }
    }
}

impl KmerArgs {
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(dir) = &self.kmc_dir {
            config.tools.kmc_dir = Some(dir.clone());
        }
        if let Some(k) = self.kmer_len {
            config.kmer_len = k;
        }
    }
}

impl SelectionArgs {
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(n) = self.max_candidates {
            config.max_candidates = n;
        }
        if self.min_freq.is_some() {
            config.min_freq = self.min_freq;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

impl Primer3Args {
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(dir) = &self.primer3_dir {
            config.tools.primer3_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.primer3_config {
            config.tools.primer3_config = Some(dir.clone());
        }
    }
}

impl ProductArgs {
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(min) = self.min {
            config.min_length = min;
        }
        if let Some(max) = self.max {
            config.max_length = max;
        }
        if let Some(n) = self.mismatches {
            config.max_mismatches = n;
        }
    }
}

impl FilterArgs {
    pub fn apply(&self, config: &mut RunConfig) {
        self.products.apply(config);
        if let Some(n) = self.max_primers {
            config.max_primers = n;
        }
        if let Some(len) = self.max_product_len {
            config.max_product_len = Some(len);
        }
        if self.bwa {
            config.tools.use_bwa = true;
        }
        if let Some(dir) = &self.bwa_dir {
            config.tools.bwa_dir = Some(dir.clone());
        }
    }
}

/// The external programs a command uses, checked before any work starts.
/// A missing program is reported against the first stage that needs it.
#[derive(Default)]
pub struct Toolbox {
    kmc: Option<Kmc>,
    primer3: Option<Primer3>,
    bwa: Option<Bwa>,
}

impl Toolbox {
    pub fn with_kmc(mut self, config: &RunConfig) -> Result<Self> {
        let kmc = Kmc::new(config.tools.kmc_dir.as_deref()).with_threads(config.effective_threads());
        kmc.check().in_stage(Stage::Kmers)?;
        self.kmc = Some(kmc);
        Ok(self)
    }

    pub fn with_primer3(mut self, config: &RunConfig, stage: Stage) -> Result<Self> {
        let primer3 = Primer3::new(
            config.tools.primer3_dir.as_deref(),
            config.tools.primer3_config.clone(),
        );
        primer3.check_tool().in_stage(stage)?;
        self.primer3 = Some(primer3);
        Ok(self)
    }

    /// BWA only when the run asks for it.
    pub fn with_bwa(mut self, config: &RunConfig) -> Result<Self> {
        if config.tools.use_bwa {
            let bwa = Bwa::new(config.tools.bwa_dir.as_deref(), config.max_mismatches);
            bwa.check().in_stage(Stage::Filter)?;
            self.bwa = Some(bwa);
        }
        Ok(self)
    }

    pub fn tools(&self) -> Tools<'_> {
        Tools {
            counter: self.kmc.as_ref().map(|t| t as &dyn KmerCounter),
            checker: self.primer3.as_ref().map(|t| t as &dyn FeasibilityChecker),
            aligner: self.bwa.as_ref().map(|t| t as &dyn BackgroundAligner),
        }
    }
}
