//! Tab-separated k-mer tables.
//!
//! ```text
//! #genomes	12
//! #k	20
//! ACGT...	12
//! ```
//!
//! The header lines are optional, so a plain `kmc_dump` listing is accepted too.

use camplicon_core::{Error, KmerPool, KmerRecord};

use crate::ParseError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KmerTable {
    pub kmer_len: Option<usize>,
    pub genome_total: Option<usize>,
    pub records: Vec<KmerRecord>,
}

impl KmerTable {
    /// Rebuild the pool this table was written from.
    ///
    /// Without headers, k is the length of the first k-mer and the genome total
    /// is the largest count.
    pub fn into_pool(self) -> camplicon_core::Result<KmerPool> {
        let kmer_len = self
            .kmer_len
            .or_else(|| self.records.first().map(|r| r.sequence.len()))
            .ok_or_else(|| Error::malformed("k-mer table", "no k-mers and no #k header"))?;
        let genome_total = self.genome_total.unwrap_or_else(|| {
            self.records
                .iter()
                .map(|r| r.genome_hit_count)
                .max()
                .unwrap_or(0)
        });
        KmerPool::from_records(kmer_len, genome_total, self.records)
    }
}

fn parse_line(n: usize, line: &str) -> Result<(String, u64), ParseError> {
    let invalid = |reason: &str| ParseError::InvalidLine {
        line: n + 1,
        reason: reason.to_string(),
    };
    let mut fields = line.split_whitespace();
    let kmer = fields.next().ok_or_else(|| invalid("missing k-mer"))?;
    let count = fields
        .next()
        .ok_or_else(|| invalid("missing count"))?
        .parse::<u64>()
        .map_err(|_| invalid("count is not a non-negative integer"))?;
    if fields.next().is_some() {
        return Err(invalid("expected two columns"));
    }
    Ok((kmer.to_ascii_uppercase(), count))
}

fn parse_header(n: usize, value: &str) -> Result<usize, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidLine {
        line: n + 1,
        reason: format!("header value '{}' is not a number", value.trim()),
    })
}

pub fn parse(input: &str) -> Result<KmerTable, ParseError> {
    let mut table = KmerTable::default();

    for (n, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            let (key, value) = header.split_once(char::is_whitespace).unwrap_or((header, ""));
            match key {
                "genomes" => table.genome_total = Some(parse_header(n, value)?),
                "k" => table.kmer_len = Some(parse_header(n, value)?),
                _ => {}
            }
            continue;
        }
        let (kmer, count) = parse_line(n, line)?;
        table
            .records
            .push(KmerRecord::new(kmer, count as usize));
    }

    Ok(table)
}

/// `SEQUENCE COUNT` pairs from `kmc_dump`.
pub fn parse_counts(input: &str) -> Result<Vec<(String, u64)>, ParseError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| parse_line(n, line))
        .collect()
}

/// Write a pool, most frequent k-mers first.
pub fn serialize(pool: &KmerPool) -> String {
    let mut out = format!("#genomes\t{}\n#k\t{}\n", pool.genome_count(), pool.kmer_len());
    for record in pool.top_by_frequency(0) {
        out.push_str(&record.sequence);
        out.push('\t');
        out.push_str(&record.genome_hit_count.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_with_header() {
        let table = parse("#genomes\t3\n#k\t4\nACGT\t3\ntttt\t1\n").unwrap();
        assert_eq!(table.kmer_len, Some(4));
        assert_eq!(table.genome_total, Some(3));
        assert_eq!(
            table.records,
            vec![KmerRecord::new("ACGT", 3), KmerRecord::new("TTTT", 1)]
        );
    }

    #[test]
    fn test_plain_dump_becomes_pool() {
        let pool = parse("ACGT\t2\nTTTT\t1\n").unwrap().into_pool().unwrap();
        assert_eq!(pool.kmer_len(), 4);
        assert_eq!(pool.genome_count(), 2);
        assert_eq!(pool.get("ACGT"), Some(2));
    }

    #[test]
    fn test_empty_table_has_no_pool() {
        assert!(parse("").unwrap().into_pool().is_err());
        let pool = parse("#k\t5\n").unwrap().into_pool().unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_bad_lines() {
        assert!(matches!(
            parse("ACGT\t2\nACGT\tmany\n"),
            Err(ParseError::InvalidLine { line: 2, .. })
        ));
        assert!(parse("ACGT\n").is_err());
        assert!(parse("#k\tfour\n").is_err());
        assert!(parse_counts("ACGT 1 2\n").is_err());
    }

    #[test]
    fn test_serialized_pool_reads_back() {
        let mut pool = KmerPool::new(4).unwrap();
        pool.ingest("g1", ["ACGT", "TTTT"]).unwrap();
        pool.ingest("g2", ["ACGT"]).unwrap();

        let text = serialize(&pool);
        assert_eq!(text, "#genomes\t2\n#k\t4\nACGT\t2\nTTTT\t1\n");

        let restored = parse(&text).unwrap().into_pool().unwrap();
        assert_eq!(restored.genome_count(), 2);
        assert_eq!(restored.get("TTTT"), Some(1));
    }

    #[test]
    fn test_parse_counts() {
        let counts = parse_counts("AAAA\t1\n\nCCCC\t7\n").unwrap();
        assert_eq!(counts, vec![("AAAA".to_string(), 1), ("CCCC".to_string(), 7)]);
    }
}
