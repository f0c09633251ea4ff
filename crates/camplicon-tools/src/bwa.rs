//! Primer binding sites from `bwa aln` / `bwa samse`.

use std::ffi::OsStr;
use std::path::Path;

use camplicon_core::{
    BackgroundAligner, BindingHit, Error, PrimerCandidate, Result, Sequence, Strand,
};
use camplicon_formats::fasta;
use regex::Regex;

use crate::{scratch_dir, Tool};

const TOOL: &str = "bwa";
const FLAG_UNMAPPED: u32 = 0x4;
const FLAG_REVERSE: u32 = 0x10;
/// `bwa samse -n`: alternative hits listed in `XA:Z`. Reads with more hits
/// than this get no `XA` tag at all, so only their primary hit is seen.
pub const MAX_ALT_HITS: usize = 200;

#[derive(Debug, Clone)]
pub struct Bwa {
    tool: Tool,
    /// `bwa aln -n`: edits allowed per primer.
    max_diff: usize,
}

impl Bwa {
    pub fn new(dir: Option<&Path>, max_diff: usize) -> Self {
        Self {
            tool: Tool::new(TOOL, dir),
            max_diff,
        }
    }

    pub fn check(&self) -> Result<()> {
        self.tool.check().map(|_| ())
    }
}

impl BackgroundAligner for Bwa {
    fn align(&self, primers: &[PrimerCandidate], genome: &Path) -> Result<Vec<BindingHit>> {
        let input = genome.display().to_string();
        let io_err = |e: std::io::Error| Error::tool(TOOL, &input, e.to_string());
        let scratch = scratch_dir(TOOL, &input)?;

        // index a copy so the input directory stays untouched
        let reference = scratch.path().join("genome.fa");
        std::fs::copy(genome, &reference).map_err(io_err)?;
        let queries = scratch.path().join("primers.fa");
        let records: Vec<Sequence> = primers
            .iter()
            .enumerate()
            .map(|(i, p)| Sequence::new(format!("p{}", i), p.sequence.as_str()))
            .collect();
        std::fs::write(&queries, fasta::serialize(&records)).map_err(io_err)?;
        let sai = scratch.path().join("primers.sai");

        self.tool
            .run([OsStr::new("index"), reference.as_os_str()], &input, None)?;
        let n = self.max_diff.to_string();
        // gap opens disabled: edit distance is then a substitution count and
        // every site spans exactly the primer length, as in the sequence scan
        self.tool.run(
            [
                OsStr::new("aln"),
                OsStr::new("-n"),
                OsStr::new(&n),
                OsStr::new("-o"),
                OsStr::new("0"),
                OsStr::new("-f"),
                sai.as_os_str(),
                reference.as_os_str(),
                queries.as_os_str(),
            ],
            &input,
            None,
        )?;
        let alt = MAX_ALT_HITS.to_string();
        let sam = self.tool.run(
            [
                OsStr::new("samse"),
                OsStr::new("-n"),
                OsStr::new(&alt),
                reference.as_os_str(),
                sai.as_os_str(),
                queries.as_os_str(),
            ],
            &input,
            None,
        )?;

        let sequences: Vec<&str> = primers.iter().map(|p| p.sequence.as_str()).collect();
        let hits = parse_sam(&sam, &sequences).map_err(|reason| Error::tool(TOOL, &input, reason))?;
        log::debug!("{}: {} primer binding sites", input, hits.len());
        Ok(hits)
    }
}

/// Binding sites from SAM text. Query names are `p{index}` into `primers`;
/// alternative hits listed in `XA:Z` tags are reported too. Gapped alignments
/// are skipped since their sites do not span the primer length.
pub fn parse_sam(sam: &str, primers: &[&str]) -> std::result::Result<Vec<BindingHit>, String> {
    let nm = Regex::new(r"\bNM:i:(\d+)").map_err(|e| e.to_string())?;
    let xa = Regex::new(r"XA:Z:(\S+)").map_err(|e| e.to_string())?;
    let best = Regex::new(r"\bX0:i:(\d+)").map_err(|e| e.to_string())?;
    let suboptimal = Regex::new(r"\bX1:i:(\d+)").map_err(|e| e.to_string())?;
    let alt = Regex::new(r"([^,;]+),([+-])(\d+),([^,]*),(\d+)").map_err(|e| e.to_string())?;
    let strand_of = |reverse: bool| if reverse { Strand::Reverse } else { Strand::Forward };

    let mut hits = Vec::new();
    for (n, line) in sam.lines().enumerate() {
        if line.starts_with('@') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 11 {
            return Err(format!("SAM line {} has {} fields", n + 1, fields.len()));
        }
        let primer = fields[0]
            .strip_prefix('p')
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| primers.get(i))
            .ok_or_else(|| format!("SAM line {}: unknown query {}", n + 1, fields[0]))?;
        let flag: u32 = fields[1]
            .parse()
            .map_err(|_| format!("SAM line {}: bad flag {}", n + 1, fields[1]))?;
        if flag & FLAG_UNMAPPED != 0 {
            continue;
        }
        let pos: usize = fields[3]
            .parse()
            .map_err(|_| format!("SAM line {}: bad position {}", n + 1, fields[3]))?;
        let tags = fields[11..].join("\t");
        let count = |re: &Regex| {
            re.captures(&tags)
                .and_then(|c| c[1].parse::<usize>().ok())
                .unwrap_or(0)
        };

        let mut site = |contig: &str, reverse: bool, pos: usize, cigar: &str, edits: usize| {
            if !ungapped(cigar, primer.len()) {
                log::debug!("skipping gapped hit of {} at {}:{} ({})", primer, contig, pos, cigar);
                return;
            }
            hits.push(BindingHit {
                primer: primer.to_string(),
                contig: contig.to_string(),
                strand: strand_of(reverse),
                position: pos.saturating_sub(1),
                edit_distance: edits,
            });
        };
        site(fields[2], flag & FLAG_REVERSE != 0, pos, fields[5], count(&nm));

        let mut listed = 1;
        if let Some(list) = xa.captures(&tags) {
            for c in alt.captures_iter(&list[1]) {
                listed += 1;
                site(
                    &c[1],
                    &c[2] == "-",
                    c[3].parse().unwrap_or(1),
                    &c[4],
                    c[5].parse().unwrap_or(0),
                );
            }
        }
        let reported = count(&best) + count(&suboptimal);
        if reported > listed {
            log::warn!(
                "primer {} has {} hits but only {} are listed, the rest are not simulated",
                primer,
                reported,
                listed
            );
        }
    }
    Ok(hits)
}

/// Whether a CIGAR string is a single run of aligned bases covering `len`.
fn ungapped(cigar: &str, len: usize) -> bool {
    let mut covered = 0;
    let mut digits = 0usize;
    for c in cigar.chars() {
        match c {
            '0'..='9' => digits = digits * 10 + c.to_digit(10).map_or(0, |d| d as usize),
            'M' | '=' | 'X' => {
                covered += digits;
                digits = 0;
            }
            _ => return false,
        }
    }
    digits == 0 && covered == len
}
