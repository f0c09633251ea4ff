use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Design PCR primer pairs that amplify a foreground genome set and miss a
/// background set.
#[derive(Parser, Debug)]
#[command(name = "camplicon")]
#[command(version)]
#[command(about = "Group-specific PCR primer design from unique k-mers", long_about = None)]
pub struct Cli {
    /// Worker threads, 0 for all CPUs [default: 8]
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Output file prefix [default: camplicon]
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Directory receiving the output files [default: .]
    #[arg(long, global = true)]
    pub out_dir: Option<PathBuf>,

    /// TOML file with run settings; flags override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find k-mers unique to every foreground genome and absent from the background, using KMC
    Kmers {
        #[command(flatten)]
        genomes: GenomeDirs,
        #[command(flatten)]
        kmers: KmerArgs,
    },

    /// Turn k-mers into primers with Primer3
    Primers {
        /// K-mer table from the kmers command, or a kmc_dump listing
        #[arg(long)]
        kmer_file: PathBuf,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        primer3: Primer3Args,
    },

    /// Pair primers, predict products in both genome sets and rank the pairs
    Filter {
        /// Primer FASTA from the primers command
        #[arg(long)]
        primer_file: PathBuf,
        #[command(flatten)]
        genomes: GenomeDirs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        primer3: Primer3Args,
    },

    /// Predict the PCR products of one primer pair
    Predict {
        #[command(flatten)]
        genomes: GenomeDirs,
        /// Forward primer sequence
        #[arg(long = "fp", visible_alias = "fwd-primer")]
        forward: String,
        /// Reverse primer sequence
        #[arg(long = "rp", visible_alias = "rev-primer")]
        reverse: String,
        #[command(flatten)]
        products: ProductArgs,
    },

    /// Run kmers, primers, filter and predict in one go
    Full {
        #[command(flatten)]
        genomes: GenomeDirs,
        #[command(flatten)]
        kmers: KmerArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        primer3: Primer3Args,
    },

    /// Run primers, filter and predict starting from a k-mer table
    Pfp {
        /// K-mer table from the kmers command, or a kmc_dump listing
        #[arg(long)]
        kmer_file: PathBuf,
        #[command(flatten)]
        genomes: GenomeDirs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        primer3: Primer3Args,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenomeDirs {
    /// Directory of foreground genomes (.fasta, .fa, .fna)
    #[arg(long = "fg", visible_alias = "foreground")]
    pub foreground: PathBuf,

    /// Directory of background genomes (.fasta, .fa, .fna)
    #[arg(long = "bg", visible_alias = "background")]
    pub background: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct KmerArgs {
    /// Directory holding the kmc and kmc_dump executables [default: PATH]
    #[arg(long = "kmc-dir", visible_alias = "kmc")]
    pub kmc_dir: Option<PathBuf>,

    /// K-mer and primer length [default: 20]
    #[arg(long)]
    pub kmer_len: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// K-mers tried with Primer3, sampled at random; 0 tries all [default: 1000]
    #[arg(long)]
    pub max_candidates: Option<usize>,

    /// Fewest foreground genomes a k-mer must occur in [default: the highest count]
    #[arg(long)]
    pub min_freq: Option<usize>,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct Primer3Args {
    /// Directory holding primer3_core [default: PATH]
    #[arg(long = "p3-dir")]
    pub primer3_dir: Option<PathBuf>,

    /// Primer3 thermodynamic parameter directory
    #[arg(long = "p3", visible_alias = "p3-config")]
    pub primer3_config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ProductArgs {
    /// Shortest accepted product [default: 300]
    #[arg(long)]
    pub min: Option<usize>,

    /// Longest accepted product [default: 500]
    #[arg(long)]
    pub max: Option<usize>,

    /// Substitutions tolerated in a primer binding site [default: 0]
    #[arg(long)]
    pub mismatches: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    #[command(flatten)]
    pub products: ProductArgs,

    /// Primers read from the primer file before pairing; 0 uses all [default: 0]
    #[arg(long)]
    pub max_primers: Option<usize>,

    /// Spans longer than this are never products [default: 10000]
    #[arg(long)]
    pub max_product_len: Option<usize>,

    /// GenBank file of one foreground genome, for naming amplified genes
    #[arg(long = "ref")]
    pub reference: Option<PathBuf>,

    /// Locate primer binding sites with BWA instead of scanning
    #[arg(long)]
    pub bwa: bool,

    /// Directory holding the bwa executable [default: PATH]
    #[arg(long)]
    pub bwa_dir: Option<PathBuf>,
}
