//! `{prefix}_report.json`: what a run was asked to do and what it found.

use std::path::PathBuf;

use camplicon_core::{Error, PairStats, PrimerPair, Ranked, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::stage::Stage;

/// Why a stage produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub message: String,
}

/// One row of the ranking, without the product listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub rank: usize,
    pub score: f64,
    pub context: String,
    pub pair: PrimerPair,
    pub stats: PairStats,
}

impl From<&Ranked> for PairSummary {
    fn from(r: &Ranked) -> Self {
        Self {
            rank: r.rank,
            score: r.score,
            context: r.context.clone(),
            pair: r.result.pair.clone(),
            stats: r.result.stats.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Subcommand that was run.
    pub command: String,
    /// Last stage entered.
    pub stage: Stage,
    pub config: RunConfig,
    pub diagnostics: Vec<Diagnostic>,
    pub pairs: Vec<PairSummary>,
    pub outputs: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(command: &str, stage: Stage, config: &RunConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            command: command.to_string(),
            stage,
            config: config.clone(),
            diagnostics: Vec::new(),
            pairs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn set_pairs(&mut self, ranked: &[Ranked]) {
        self.pairs = ranked.iter().map(PairSummary::from).collect();
    }

    /// True when a stage ran out of candidates.
    pub fn is_empty(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::output("report", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use camplicon_core::{
        Group, Orientation, PairAccumulator, PrimerCandidate, Product, ProductAggregator,
    };

    use super::*;

    fn ranked() -> Ranked {
        let mut fwd = PrimerCandidate::new("0", "ACGTACGGTT").unwrap();
        fwd.melting_temp = 60.1;
        let mut rev = PrimerCandidate::new("3rc", "TTGACCATGG").unwrap();
        rev.melting_temp = 59.7;
        let pair = PrimerPair::new(2, fwd, rev).unwrap();
        let mut acc = PairAccumulator::new(pair, 1, 0);
        acc.add(
            Group::In,
            "a",
            vec![Product {
                genome_id: "a".to_string(),
                contig: "chr".to_string(),
                sequence: "ACGTACGGTTAAAACCATGGTCAA".to_string(),
                start: 0,
                end: 23,
                length: 24,
                orientation: Orientation::AsBuilt,
            }],
        );
        Ranked {
            rank: 1,
            score: 1.0,
            context: "-".to_string(),
            result: acc.finish(&ProductAggregator::new(1, 100).unwrap()),
        }
    }

    #[test]
    fn test_report_json() {
        let mut report = RunReport::new("filter", Stage::Filter, &RunConfig::default());
        report.set_pairs(&[ranked()]);
        assert!(!report.is_empty());

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["command"], "filter");
        assert_eq!(value["stage"], "filter");
        assert_eq!(value["config"]["prefix"], "camplicon");
        assert_eq!(value["pairs"][0]["rank"], 1);
        assert_eq!(value["pairs"][0]["pair"]["reverse"]["id"], "3rc");
        assert_eq!(value["pairs"][0]["stats"]["in_group"]["hit_count"], 1);
        assert_eq!(value["run_id"].as_str().map(str::len), Some(36));
    }

    #[test]
    fn test_diagnostic_marks_empty_report() {
        let mut report = RunReport::new("primers", Stage::Primers, &RunConfig::default());
        report.diagnostics.push(Diagnostic {
            stage: Stage::Primers,
            message: "no k-mer passed the feasibility check".to_string(),
        });
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["diagnostics"][0]["stage"], "primers");
        assert_eq!(value["pairs"].as_array().map(Vec::len), Some(0));
        assert!(report.is_empty());
    }
}
