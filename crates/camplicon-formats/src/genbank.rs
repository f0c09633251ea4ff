use camplicon_core::{
    feature::{Feature, FeatureType, Location, Qualifier, Strand},
    sequence::Sequence,
};

use crate::ParseError;

const QUALIFIER_INDENT: &str = "                     ";

/// Parse the first record of a GenBank format string
pub fn parse(input: &str) -> Result<Sequence, ParseError> {
    parse_all(input)?
        .into_iter()
        .next()
        .ok_or(ParseError::UnexpectedEnd)
}

/// Parse every `LOCUS ... //` record of a GenBank file
pub fn parse_all(input: &str) -> Result<Vec<Sequence>, ParseError> {
    let lines: Vec<&str> = input.lines().collect();
    let mut records = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("LOCUS") {
            records.push(parse_record(&lines, &mut i)?);
        } else {
            i += 1;
        }
    }

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No LOCUS record found in GenBank input".to_string(),
        ));
    }
    Ok(records)
}

fn parse_record(lines: &[&str], i: &mut usize) -> Result<Sequence, ParseError> {
    let name = lines[*i]
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ParseError::InvalidFormat("LOCUS line without a name".to_string()))?;
    let mut seq = Sequence::new(name, "");
    *i += 1;

    while *i < lines.len() {
        let line = lines[*i];

        if line.starts_with("//") {
            *i += 1;
            return Ok(seq);
        } else if line.starts_with("LOCUS") {
            // a record without terminator; let the caller start the next one
            return Ok(seq);
        } else if line.starts_with("DEFINITION") {
            let mut def = line.get(12..).unwrap_or_default().trim().to_string();
            *i += 1;
            while *i < lines.len() && lines[*i].starts_with("            ") {
                def.push(' ');
                def.push_str(lines[*i].trim());
                *i += 1;
            }
            seq.description = def.trim_end_matches('.').to_string();
            continue;
        } else if line.starts_with("FEATURES") {
            *i += 1;
            parse_features(lines, i, &mut seq.features);
            continue;
        } else if line.starts_with("ORIGIN") {
            *i += 1;
            seq.sequence = parse_origin(lines, i);
            continue;
        }

        *i += 1;
    }

    Ok(seq)
}

fn parse_features(lines: &[&str], i: &mut usize, features: &mut Vec<Feature>) {
    while *i < lines.len() {
        let line = lines[*i];

        // any top-level keyword ends the table
        if line.starts_with(|c: char| c.is_ascii_alphabetic()) || line.starts_with("//") {
            break;
        }

        let header = match (line.get(5..21), line.get(21..)) {
            (Some(key), Some(rest)) if line.starts_with("     ") && !key.starts_with(' ') => {
                Some((key.trim(), rest))
            }
            _ => None,
        };
        if let Some((key, rest)) = header {
            let mut location_str = rest.trim().to_string();

            // Read continuation lines for location
            *i += 1;
            while *i < lines.len() && is_continuation(lines[*i]) && !is_qualifier(lines[*i]) {
                location_str.push_str(value_column(lines[*i]));
                *i += 1;
            }

            let mut qualifiers = Vec::new();
            while *i < lines.len() && is_qualifier(lines[*i]) {
                let qual_content = &value_column(lines[*i])[1..];

                if let Some((qkey, qval)) = qual_content.split_once('=') {
                    let mut qval = qval.to_string();
                    *i += 1;
                    while *i < lines.len() && is_continuation(lines[*i]) && !is_qualifier(lines[*i])
                    {
                        qval.push(' ');
                        qval.push_str(value_column(lines[*i]));
                        *i += 1;
                    }
                    qualifiers.push(Qualifier {
                        key: qkey.to_string(),
                        value: qval.trim_matches('"').to_string(),
                    });
                } else {
                    // Flag qualifier (no value)
                    qualifiers.push(Qualifier {
                        key: qual_content.to_string(),
                        value: String::new(),
                    });
                    *i += 1;
                }
            }

            let (location, strand) = match parse_location(&location_str) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::warn!("skipping {} feature: {}", key, e);
                    continue;
                }
            };

            let name = ["label", "gene", "locus_tag", "product", "note"]
                .iter()
                .find_map(|k| qualifiers.iter().find(|q| q.key == *k))
                .map(|q| q.value.clone())
                .unwrap_or_else(|| key.to_string());

            features.push(Feature {
                name,
                feature_type: FeatureType::from_genbank_key(key),
                location,
                strand,
                qualifiers,
            });
        } else {
            *i += 1;
        }
    }
}

fn is_continuation(line: &str) -> bool {
    line.len() > 21 && line.starts_with(QUALIFIER_INDENT)
}

fn is_qualifier(line: &str) -> bool {
    is_continuation(line) && value_column(line).starts_with('/')
}

/// Text from column 22 on, trimmed.
fn value_column(line: &str) -> &str {
    line.get(21..).unwrap_or("").trim()
}

fn parse_location(loc_str: &str) -> Result<(Location, Strand), ParseError> {
    let trimmed = loc_str.trim();

    if let Some(inner) = trimmed
        .strip_prefix("complement(")
        .and_then(|s| s.strip_suffix(')'))
    {
        let (loc, _) = parse_location(inner)?;
        return Ok((loc, Strand::Reverse));
    }

    let joined = trimmed
        .strip_prefix("join(")
        .or_else(|| trimmed.strip_prefix("order("))
        .and_then(|s| s.strip_suffix(')'));
    if let Some(inner) = joined {
        let ranges = inner
            .split(',')
            .map(|part| {
                parse_simple_range(part.trim())
                    .ok_or_else(|| ParseError::InvalidLocation(loc_str.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok((Location::Join { ranges }, Strand::Forward));
    }

    if let Some((start, end)) = parse_simple_range(trimmed) {
        return Ok((Location::simple(start, end), Strand::Forward));
    }

    // Single position
    if let Ok(pos) = trimmed.replace(['<', '>'], "").parse::<usize>() {
        let pos = pos.saturating_sub(1); // GenBank is 1-based
        return Ok((Location::simple(pos, pos + 1), Strand::Forward));
    }

    Err(ParseError::InvalidLocation(loc_str.to_string()))
}

fn parse_simple_range(s: &str) -> Option<(usize, usize)> {
    // Handle formats like: 100..200, <100..>200
    let cleaned = s.replace(['<', '>'], "");
    let (start, end) = cleaned.split_once("..")?;
    let start = start.trim().parse::<usize>().ok()?;
    let end = end.trim().parse::<usize>().ok()?;
    // Convert from 1-based inclusive to 0-based exclusive
    Some((start.saturating_sub(1), end))
}

fn parse_origin(lines: &[&str], i: &mut usize) -> String {
    let mut seq = String::new();

    while *i < lines.len() && !lines[*i].starts_with("//") {
        // Origin lines: "        1 atcgatcg atcgatcg ..."
        seq.extend(
            lines[*i]
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .map(|c| c.to_ascii_uppercase()),
        );
        *i += 1;
    }

    seq
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI_GENBANK: &str = r#"LOCUS       NC_test           100 bp    DNA     linear   BCT 01-JAN-2026
DEFINITION  Test chromosome,
            complete sequence.
ACCESSION   .
FEATURES             Location/Qualifiers
     source          1..100
                     /organism="Escherichia coli"
     gene            1..20
                     /locus_tag="b0001"
                     /gene="thrL"
     CDS             1..20
                     /locus_tag="b0001"
                     /product="thr operon leader
                     peptide"
     gene            complement(30..90)
                     /locus_tag="b0002"
                     /pseudo
ORIGIN
        1 atcgatcgat cgatcgatcg atcgatcgat cgatcgatcg atcgatcgat
       51 cgatcgatcg atcgatcgat cgatcgatcg atcgatcgat cgatcgatcg
//
"#;

    #[test]
    fn test_parse_mini_genbank() {
        let seq = parse(MINI_GENBANK).unwrap();
        assert_eq!(seq.name, "NC_test");
        assert_eq!(seq.description, "Test chromosome, complete sequence");
        assert_eq!(seq.len(), 100);
        assert_eq!(seq.features.len(), 4);
    }

    #[test]
    fn test_parse_features() {
        let seq = parse(MINI_GENBANK).unwrap();

        let gene = &seq.features[1];
        assert_eq!(gene.name, "thrL");
        assert_eq!(gene.feature_type, FeatureType::Gene);
        assert_eq!(gene.start(), 0);
        assert_eq!(gene.end(), 20);
        assert_eq!(gene.get_qualifier("locus_tag"), Some("b0001"));

        let cds = &seq.features[2];
        assert_eq!(cds.feature_type, FeatureType::Cds);
        assert_eq!(
            cds.get_qualifier("product"),
            Some("thr operon leader peptide")
        );

        let pseudo = &seq.features[3];
        assert_eq!(pseudo.name, "b0002");
        assert_eq!(pseudo.start(), 29);
        assert_eq!(pseudo.end(), 90);
        assert_eq!(pseudo.strand, Strand::Reverse);
        assert_eq!(pseudo.get_qualifier("pseudo"), Some(""));
        assert_eq!(pseudo.get_qualifier("gene"), None);
    }

    #[test]
    fn test_multibyte_text_in_key_columns_is_skipped() {
        // 'é' straddles the boundary between key and location columns
        let odd = MINI_GENBANK.replace(
            "     gene            1..20\n",
            "     abcdefghijklmnoé1..5\n     gene            1..20\n",
        );
        let seq = parse(&odd).unwrap();
        assert_eq!(seq.features.len(), 4);
        assert_eq!(seq.features[1].get_qualifier("gene"), Some("thrL"));
    }

    #[test]
    fn test_parse_origin() {
        let seq = parse(MINI_GENBANK).unwrap();
        assert!(seq.sequence.starts_with("ATCGATCG"));
        assert_eq!(seq.len(), 100);
    }

    #[test]
    fn test_parse_multiple_records() {
        let two = format!("{}{}", MINI_GENBANK, MINI_GENBANK.replace("NC_test", "NC_other"));
        let records = parse_all(&two).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "NC_other");
        assert_eq!(records[1].features.len(), 4);
    }

    #[test]
    fn test_not_genbank() {
        assert!(parse_all(">seq\nACGT\n").is_err());
    }

    #[test]
    fn test_parse_location_simple() {
        let (loc, strand) = parse_location("100..200").unwrap();
        assert_eq!(loc.start(), 99);
        assert_eq!(loc.end(), 200);
        assert_eq!(strand, Strand::Forward);
    }

    #[test]
    fn test_parse_location_complement() {
        let (loc, strand) = parse_location("complement(<100..>200)").unwrap();
        assert_eq!(loc.start(), 99);
        assert_eq!(loc.end(), 200);
        assert_eq!(strand, Strand::Reverse);
    }

    #[test]
    fn test_parse_location_join() {
        let (loc, strand) = parse_location("join(100..200,300..400)").unwrap();
        assert_eq!(strand, Strand::Forward);
        if let Location::Join { ranges } = loc {
            assert_eq!(ranges, vec![(99, 200), (299, 400)]);
        } else {
            panic!("Expected Join location");
        }
    }

    #[test]
    fn test_parse_location_invalid() {
        assert!(matches!(
            parse_location("gap(unk100)"),
            Err(ParseError::InvalidLocation(_))
        ));
    }
}
