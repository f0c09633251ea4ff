//! Runs the camplicon stages: k-mer counting, primer selection, pair
//! filtering and product prediction, over a bounded rayon pool.

pub mod config;
pub mod evaluate;
pub mod genomes;
pub mod report;
pub mod stage;
pub mod workflow;

pub use config::{RunConfig, ToolConfig};
pub use evaluate::{CancelToken, Evaluator, GenomeSets};
pub use report::{Diagnostic, PairSummary, RunReport};
pub use stage::{InStage, Stage, StageError, StageResult};
pub use workflow::{Inputs, Pipeline, RunOutcome, Tools};
