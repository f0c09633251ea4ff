use std::path::Path;

use anyhow::Result;
use camplicon_pipeline::{Pipeline, RunConfig, RunOutcome, Stage};

use super::Toolbox;
use crate::cli::{Primer3Args, SelectionArgs};

pub fn run(
    kmer_file: &Path,
    selection: &SelectionArgs,
    primer3: &Primer3Args,
    mut config: RunConfig,
) -> Result<RunOutcome> {
    selection.apply(&mut config);
    primer3.apply(&mut config);
    let pipeline = Pipeline::new(config)?;
    let toolbox = Toolbox::default().with_primer3(pipeline.config(), Stage::Primers)?;
    match pipeline.config().max_candidates {
        0 => log::info!("finding primers among all k-mers in {}", kmer_file.display()),
        n => log::info!(
            "finding primers among at most {} k-mers in {}",
            n,
            kmer_file.display()
        ),
    }
    Ok(pipeline.run_primers(kmer_file, toolbox.tools())?)
}
