use std::path::Path;

use anyhow::Result;
use camplicon_pipeline::{Pipeline, RunConfig, RunOutcome, Stage};

use super::Toolbox;
use crate::cli::{FilterArgs, GenomeDirs, KmerArgs, Primer3Args, SelectionArgs};

pub fn full(
    genomes: &GenomeDirs,
    kmers: &KmerArgs,
    selection: &SelectionArgs,
    filter: &FilterArgs,
    primer3: &Primer3Args,
    mut config: RunConfig,
) -> Result<RunOutcome> {
    kmers.apply(&mut config);
    selection.apply(&mut config);
    filter.apply(&mut config);
    primer3.apply(&mut config);
    let pipeline = Pipeline::new(config)?;
    let toolbox = Toolbox::default()
        .with_kmc(pipeline.config())?
        .with_primer3(pipeline.config(), Stage::Primers)?
        .with_bwa(pipeline.config())?;
    log::info!("running the full workflow");
    Ok(pipeline.run_full(&genomes.inputs(Some(filter)), toolbox.tools())?)
}

pub fn pfp(
    kmer_file: &Path,
    genomes: &GenomeDirs,
    selection: &SelectionArgs,
    filter: &FilterArgs,
    primer3: &Primer3Args,
    mut config: RunConfig,
) -> Result<RunOutcome> {
    selection.apply(&mut config);
    filter.apply(&mut config);
    primer3.apply(&mut config);
    let pipeline = Pipeline::new(config)?;
    let toolbox = Toolbox::default()
        .with_primer3(pipeline.config(), Stage::Primers)?
        .with_bwa(pipeline.config())?;
    log::info!("running primers, filter and predict from {}", kmer_file.display());
    Ok(pipeline.run_pfp(kmer_file, &genomes.inputs(Some(filter)), toolbox.tools())?)
}
