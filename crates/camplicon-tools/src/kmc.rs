use std::path::Path;

use camplicon_core::{Error, KmerCounter, Result};
use camplicon_formats::kmers;

use crate::{scratch_dir, Tool};

/// Counts saturate here; only "once" versus "more than once" matters downstream.
const COUNTER_CAP: u32 = 255;

/// KMC k-mer counter. `kmc` builds a database per genome, `kmc_dump` lists it.
#[derive(Debug, Clone)]
pub struct Kmc {
    kmc: Tool,
    dump: Tool,
    threads: usize,
}

impl Kmc {
    pub fn new(dir: Option<&Path>) -> Self {
        Self {
            kmc: Tool::new("kmc", dir),
            dump: Tool::new("kmc_dump", dir),
            threads: 1,
        }
    }

    /// Threads given to each `kmc` call.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn check(&self) -> Result<()> {
        self.kmc.check()?;
        self.dump.check()?;
        Ok(())
    }

    fn count_args(&self, kmer_len: usize, genome: &Path, db: &Path, tmp: &Path) -> Vec<String> {
        vec![
            format!("-k{}", kmer_len),
            format!("-t{}", self.threads),
            "-ci1".to_string(),
            format!("-cs{}", COUNTER_CAP),
            "-fm".to_string(),
            genome.display().to_string(),
            db.display().to_string(),
            tmp.display().to_string(),
        ]
    }
}

impl KmerCounter for Kmc {
    fn count(&self, genome: &Path, kmer_len: usize) -> Result<Vec<(String, u64)>> {
        let input = genome.display().to_string();
        let scratch = scratch_dir(self.kmc.name(), &input)?;
        let db = scratch.path().join("db");
        let tmp = scratch.path().join("tmp");
        let listing = scratch.path().join("kmers.txt");
        std::fs::create_dir(&tmp)
            .map_err(|e| Error::tool(self.kmc.name(), &input, e.to_string()))?;

        self.kmc
            .run(self.count_args(kmer_len, genome, &db, &tmp), &input, None)?;
        self.dump.run([db.as_os_str(), listing.as_os_str()], &input, None)?;

        let text = std::fs::read_to_string(&listing)
            .map_err(|e| Error::tool(self.dump.name(), &input, e.to_string()))?;
        let counts = kmers::parse_counts(&text)
            .map_err(|e| Error::tool(self.dump.name(), &input, e.to_string()))?;
        log::debug!("{}: {} distinct {}-mers", input, counts.len(), kmer_len);
        Ok(counts)
    }
}
