use camplicon_core::Sequence;

use crate::ParseError;

/// Parse a FASTA format string into one or more Sequences
pub fn parse(input: &str) -> Result<Vec<Sequence>, ParseError> {
    let mut sequences = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut current_seq = String::new();

    for (n, line) in input.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('>') {
            if let Some((name, desc)) = current.take() {
                push_record(&mut sequences, name, desc, std::mem::take(&mut current_seq));
            }
            let mut parts = header.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or_default().to_string();
            let desc = parts.next().unwrap_or_default().trim().to_string();
            current = Some((name, desc));
        } else if current.is_none() {
            return Err(ParseError::InvalidLine {
                line: n + 1,
                reason: "sequence data before the first '>' header".to_string(),
            });
        } else {
            current_seq.extend(
                trimmed
                    .chars()
                    .filter(|c| c.is_ascii_alphabetic())
                    .map(|c| c.to_ascii_uppercase()),
            );
        }
    }

    if let Some((name, desc)) = current {
        push_record(&mut sequences, name, desc, current_seq);
    }

    if sequences.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA input".to_string(),
        ));
    }

    Ok(sequences)
}

fn push_record(out: &mut Vec<Sequence>, name: String, desc: String, bases: String) {
    if name.is_empty() || bases.is_empty() {
        log::warn!("skipping empty FASTA record '{}'", name);
        return;
    }
    let mut seq = Sequence::new(name, bases);
    seq.description = desc;
    out.push(seq);
}

/// Serialize sequences to FASTA format
pub fn serialize(sequences: &[Sequence]) -> String {
    let mut out = String::new();

    for seq in sequences {
        out.push('>');
        out.push_str(&seq.name);
        if !seq.description.is_empty() {
            out.push(' ');
            out.push_str(&seq.description);
        }
        out.push('\n');

        // Sequence in 80-character lines
        for chunk in seq.sequence.as_bytes().chunks(80) {
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
    }

    out
}
