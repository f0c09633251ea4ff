use std::fs;
use std::path::{Path, PathBuf};

use camplicon_core::{Error, RankingPolicy, Result};
use serde::{Deserialize, Serialize};

/// Settings for one run. Every field has a default, so a TOML file only needs
/// the values it changes; command-line flags are applied on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Worker threads, 0 for one per logical CPU.
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_kmer_len")]
    pub kmer_len: usize,
    /// Minimum foreground genome count for a k-mer to be tried, defaults to
    /// the highest count in the table.
    #[serde(default)]
    pub min_freq: Option<usize>,
    /// K-mers sent to the feasibility checker, sampled at random; 0 for all.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default)]
    pub seed: Option<u64>,

    /// Primers read from the primer file before pairing; 0 for all.
    #[serde(default)]
    pub max_primers: usize,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub max_mismatches: usize,
    /// Longest span reported as a product at all, before the length filter.
    #[serde(default = "default_max_product_len")]
    pub max_product_len: Option<usize>,

    #[serde(default)]
    pub ranking: RankingPolicy,
    #[serde(default)]
    pub tools: ToolConfig,
}

/// Where the external programs live. `None` means `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub kmc_dir: Option<PathBuf>,
    #[serde(default)]
    pub primer3_dir: Option<PathBuf>,
    /// Primer3 thermodynamic parameter directory.
    #[serde(default)]
    pub primer3_config: Option<PathBuf>,
    /// Find binding sites with BWA instead of scanning the genomes.
    #[serde(default)]
    pub use_bwa: bool,
    #[serde(default)]
    pub bwa_dir: Option<PathBuf>,
}

fn default_threads() -> usize {
    8
}

fn default_prefix() -> String {
    "camplicon".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_kmer_len() -> usize {
    20
}

fn default_max_candidates() -> usize {
    1000
}

fn default_min_length() -> usize {
    300
}

fn default_max_length() -> usize {
    500
}

fn default_max_product_len() -> Option<usize> {
    Some(10_000)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            prefix: default_prefix(),
            output_dir: default_output_dir(),
            kmer_len: default_kmer_len(),
            min_freq: None,
            max_candidates: default_max_candidates(),
            seed: None,
            max_primers: 0,
            min_length: default_min_length(),
            max_length: default_max_length(),
            max_mismatches: 0,
            max_product_len: default_max_product_len(),
            ranking: RankingPolicy::default(),
            tools: ToolConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid TOML: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Reject settings no stage could run with.
    pub fn validate(&self) -> Result<()> {
        if self.kmer_len == 0 {
            return Err(Error::config("k-mer length must be at least 1"));
        }
        if self.min_length > self.max_length {
            return Err(Error::config(format!(
                "minimum product length {} exceeds maximum {}",
                self.min_length, self.max_length
            )));
        }
        if self.max_product_len == Some(0) {
            return Err(Error::config("maximum product span must be at least 1"));
        }
        if self.prefix.trim().is_empty() {
            return Err(Error::config("output prefix is empty"));
        }
        if self.prefix.contains('/') {
            return Err(Error::config(format!(
                "output prefix '{}' must not contain a path separator",
                self.prefix
            )));
        }
        let weights = &self.ranking;
        if [
            weights.in_hits,
            weights.out_hits,
            weights.overlap,
            weights.penalty,
            weights.stdev,
        ]
        .iter()
        .any(|w| !w.is_finite())
        {
            return Err(Error::config("ranking weights must be finite"));
        }
        Ok(())
    }

    /// Worker count after resolving 0 to the number of CPUs.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.threads
        }
    }

    /// `{output_dir}/{prefix}{suffix}`.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.prefix, suffix))
    }
}
