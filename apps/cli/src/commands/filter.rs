use std::path::Path;

use anyhow::Result;
use camplicon_pipeline::{Pipeline, RunConfig, RunOutcome, Stage};

use super::Toolbox;
use crate::cli::{FilterArgs, GenomeDirs, Primer3Args};

pub fn run(
    primer_file: &Path,
    genomes: &GenomeDirs,
    filter: &FilterArgs,
    primer3: &Primer3Args,
    mut config: RunConfig,
) -> Result<RunOutcome> {
    filter.apply(&mut config);
    primer3.apply(&mut config);
    let pipeline = Pipeline::new(config)?;
    let toolbox = Toolbox::default()
        .with_primer3(pipeline.config(), Stage::Filter)?
        .with_bwa(pipeline.config())?;
    log::info!(
        "filtering primers from {}: products of {}-{} bp in {}, avoiding {}",
        primer_file.display(),
        pipeline.config().min_length,
        pipeline.config().max_length,
        genomes.foreground.display(),
        genomes.background.display()
    );
    Ok(pipeline.run_filter(primer_file, &genomes.inputs(Some(filter)), toolbox.tools())?)
}
