use std::fmt;

use camplicon_core::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Kmers,
    Primers,
    Filter,
    Predict,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Kmers => "kmers",
            Stage::Primers => "primers",
            Stage::Filter => "filter",
            Stage::Predict => "predict",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure tagged with the stage that hit it.
#[derive(Debug, thiserror::Error)]
#[error("[{stage}] {error}")]
pub struct StageError {
    pub stage: Stage,
    pub error: Error,
}

impl StageError {
    pub fn new(stage: Stage, error: Error) -> Self {
        Self { stage, error }
    }
}

pub type StageResult<T> = std::result::Result<T, StageError>;

/// `.in_stage(Stage::Filter)` on any core result.
pub trait InStage<T> {
    fn in_stage(self, stage: Stage) -> StageResult<T>;
}

impl<T> InStage<T> for camplicon_core::Result<T> {
    fn in_stage(self, stage: Stage) -> StageResult<T> {
        self.map_err(|error| StageError::new(stage, error))
    }
}
