use anyhow::Result;
use camplicon_pipeline::{Pipeline, RunConfig, RunOutcome};

use crate::cli::{GenomeDirs, ProductArgs};

pub fn run(
    genomes: &GenomeDirs,
    forward: &str,
    reverse: &str,
    products: &ProductArgs,
    mut config: RunConfig,
) -> Result<RunOutcome> {
    products.apply(&mut config);
    let pipeline = Pipeline::new(config)?;
    log::info!(
        "predicting products of {}:{} in {} and {}",
        forward,
        reverse,
        genomes.foreground.display(),
        genomes.background.display()
    );
    Ok(pipeline.run_predict(forward, reverse, &genomes.inputs(None))?)
}
