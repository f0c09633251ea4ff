//! Primer FASTA: one record per primer, feasibility data in the header.
//!
//! `>12rc tm=59.81 penalty=0.1934 freq=14`

use camplicon_core::PrimerCandidate;
use nom::{
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::space0,
    multi::many0,
    sequence::{preceded, separated_pair},
    IResult,
};

use crate::{fasta, ParseError};

fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    preceded(
        space0,
        separated_pair(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            tag("="),
            take_till1(char::is_whitespace),
        ),
    )(input)
}

fn attributes(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    many0(attribute)(input)
}

fn number<T: std::str::FromStr>(name: &str, key: &str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| {
        ParseError::InvalidFormat(format!("primer {}: {}={} is not a number", name, key, value))
    })
}

/// Read primers. Headers without attributes are accepted; a primer given only
/// by id and sequence has no feasibility data.
pub fn parse(input: &str) -> Result<Vec<PrimerCandidate>, ParseError> {
    fasta::parse(input)?
        .into_iter()
        .map(|record| {
            let mut primer = PrimerCandidate::new(record.name.as_str(), &record.sequence)
                .map_err(|e| ParseError::InvalidFormat(e.to_string()))?;
            let (_, attrs) = attributes(&record.description)
                .map_err(|e| ParseError::InvalidFormat(e.to_string()))?;
            for (key, value) in attrs {
                match key {
                    "tm" => primer.melting_temp = number(&record.name, key, value)?,
                    "penalty" => primer.penalty = number(&record.name, key, value)?,
                    "freq" => primer.genome_hit_count = number(&record.name, key, value)?,
                    _ => log::debug!("ignoring primer attribute {}={}", key, value),
                }
            }
            Ok(primer)
        })
        .collect()
}

pub fn serialize(primers: &[PrimerCandidate]) -> String {
    primers
        .iter()
        .map(|p| {
            format!(
                ">{} tm={:.2} penalty={:.4} freq={}\n{}\n",
                p.id, p.melting_temp, p.penalty, p.genome_hit_count, p.sequence
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_attributes() {
        let (rest, attrs) = attributes("tm=59.81 penalty=0.1934 freq=14").unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            attrs,
            vec![("tm", "59.81"), ("penalty", "0.1934"), ("freq", "14")]
        );
    }

    #[test]
    fn test_parse_primers() {
        let text = ">0 tm=60.12 penalty=0.5000 freq=3\nACGTACGTAC\n>0rc tm=60.12 penalty=0.5000 freq=3\nGTACGTACGT\n";
        let primers = parse(text).unwrap();
        assert_eq!(primers.len(), 2);
        assert_eq!(primers[1].id, "0rc");
        assert_eq!(primers[1].sequence, "GTACGTACGT");
        assert_eq!(primers[0].genome_hit_count, 3);
        assert!((primers[0].melting_temp - 60.12).abs() < 1e-9);
        assert!((primers[0].penalty - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_plain_fasta_primers() {
        let primers = parse(">fwd\nACGTTGCA\n").unwrap();
        assert_eq!(primers[0].id, "fwd");
        assert_eq!(primers[0].penalty, 0.0);
        assert!(primers[0].melting_temp.is_nan());
    }

    #[test]
    fn test_invalid_primers() {
        assert!(parse(">p tm=hot\nACGT\n").is_err());
        assert!(parse(">p\nACGN\n").is_err());
    }

    #[test]
    fn test_written_primers_read_back() {
        let mut p = PrimerCandidate::new("7", "AACCGGTT").unwrap();
        p.melting_temp = 58.5;
        p.penalty = 1.25;
        p.genome_hit_count = 9;
        let text = serialize(&[p.clone()]);
        assert_eq!(text, ">7 tm=58.50 penalty=1.2500 freq=9\nAACCGGTT\n");
        assert_eq!(parse(&text).unwrap(), vec![p]);
    }
}
