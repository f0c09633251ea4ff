use anyhow::Result;
use camplicon_pipeline::{Pipeline, RunConfig, RunOutcome};

use super::Toolbox;
use crate::cli::{GenomeDirs, KmerArgs};

pub fn run(genomes: &GenomeDirs, kmers: &KmerArgs, mut config: RunConfig) -> Result<RunOutcome> {
    kmers.apply(&mut config);
    let pipeline = Pipeline::new(config)?;
    let toolbox = Toolbox::default().with_kmc(pipeline.config())?;
    log::info!(
        "finding {}-mers in {} absent from {}",
        pipeline.config().kmer_len,
        genomes.foreground.display(),
        genomes.background.display()
    );
    Ok(pipeline.run_kmers(&genomes.inputs(None), toolbox.tools())?)
}
