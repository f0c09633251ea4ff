//! `primer3_core` in `check_primers` mode.
//!
//! Requests and replies are Boulder-IO records: `KEY=VALUE` lines closed by a
//! lone `=` line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use camplicon_core::external::is_self_complementary;
use camplicon_core::{Error, Feasibility, FeasibilityChecker, PrimerCandidate, Result};
use nom::{
    bytes::complete::{tag, take_till, take_till1},
    character::complete::{char, line_ending},
    combinator::opt,
    multi::many0,
    sequence::{separated_pair, terminated},
    IResult,
};

const TOOL: &str = "primer3_core";

#[derive(Debug, Clone)]
pub struct Primer3 {
    tool: crate::Tool,
    thermo_params: Option<PathBuf>,
}

impl Primer3 {
    pub fn new(dir: Option<&Path>, thermo_params: Option<PathBuf>) -> Self {
        Self {
            tool: crate::Tool::new(TOOL, dir),
            thermo_params,
        }
    }

    pub fn check_tool(&self) -> Result<()> {
        self.tool.check().map(|_| ())
    }

    fn request(&self, primer: &str, revcomp: Option<&str>) -> String {
        let mut record = format!(
            "SEQUENCE_ID=camplicon\nPRIMER_TASK=check_primers\nSEQUENCE_PRIMER={}\n",
            primer
        );
        if let Some(rev) = revcomp {
            record.push_str(&format!("SEQUENCE_PRIMER_REVCOMP={}\n", rev));
        }
        if let Some(path) = &self.thermo_params {
            record.push_str(&format!(
                "PRIMER_THERMODYNAMIC_PARAMETERS_PATH={}\n",
                path.display()
            ));
        }
        record.push_str("=\n");
        record
    }

    fn query(&self, input: &str, request: &str) -> Result<BoulderRecord> {
        let reply = self.tool.run(std::iter::empty::<&str>(), input, Some(request))?;
        let record = parse_record(&reply).map_err(|reason| Error::tool(TOOL, input, reason))?;
        if let Some(msg) = record.get("PRIMER_ERROR") {
            return Err(Error::tool(TOOL, input, msg.clone()));
        }
        Ok(record)
    }
}

impl FeasibilityChecker for Primer3 {
    fn check(&self, sequence: &str) -> Result<Feasibility> {
        let record = self.query(sequence, &self.request(sequence, None))?;
        if record.number::<usize>("PRIMER_LEFT_NUM_RETURNED", sequence)? == 0 {
            return Ok(Feasibility::failed());
        }
        Ok(Feasibility::passed(
            record.number("PRIMER_LEFT_0_PENALTY", sequence)?,
            record.number("PRIMER_LEFT_0_TM", sequence)?,
        ))
    }

    fn check_pair(&self, forward: &PrimerCandidate, reverse: &PrimerCandidate) -> Result<Feasibility> {
        // primer3 rejects a primer paired with its own reverse complement
        if is_self_complementary(forward, reverse) {
            return Ok(Feasibility::failed());
        }
        let input = format!("{}/{}", forward.sequence, reverse.sequence);
        let record = self.query(
            &input,
            &self.request(&forward.sequence, Some(&reverse.sequence)),
        )?;
        if record.number::<usize>("PRIMER_PAIR_NUM_RETURNED", &input)? == 0 {
            return Ok(Feasibility::failed());
        }
        let left: f64 = record.number("PRIMER_LEFT_0_TM", &input).unwrap_or(f64::NAN);
        let right: f64 = record.number("PRIMER_RIGHT_0_TM", &input).unwrap_or(f64::NAN);
        Ok(Feasibility::passed(
            record.number("PRIMER_PAIR_0_PENALTY", &input)?,
            left.min(right),
        ))
    }
}

/// One parsed Boulder-IO record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoulderRecord(HashMap<String, String>);

impl BoulderRecord {
    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }

    fn number<T: std::str::FromStr>(&self, key: &str, input: &str) -> Result<T> {
        let value = self
            .0
            .get(key)
            .ok_or_else(|| Error::tool(TOOL, input, format!("reply lacks {}", key)))?;
        value
            .trim()
            .parse()
            .map_err(|_| Error::tool(TOOL, input, format!("{}={} is not a number", key, value)))
    }
}

fn field(input: &str) -> IResult<&str, (&str, &str)> {
    terminated(
        separated_pair(
            take_till1(|c: char| c == '=' || c == '\n' || c == '\r'),
            char('='),
            take_till(|c: char| c == '\n' || c == '\r'),
        ),
        line_ending,
    )(input)
}

fn record(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    terminated(many0(field), terminated(tag("="), opt(line_ending)))(input)
}

pub fn parse_record(input: &str) -> std::result::Result<BoulderRecord, String> {
    let (_, fields) = record(input).map_err(|e| format!("unreadable Boulder-IO reply: {}", e))?;
    Ok(BoulderRecord(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    ))
}
