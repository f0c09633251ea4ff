use crate::operations::{hamming_within, reverse_complement};

/// A primer binding site on the sense strand of a contig
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SequenceMatch {
    /// First base of the site (0-based, inclusive).
    pub start: usize,
    /// One past the last base of the site (0-based, exclusive).
    pub end: usize,
    /// Sense-strand text of the site.
    pub matched: String,
    /// `true` when the reverse complement of the pattern was found.
    pub is_complement: bool,
    pub mismatches: usize,
}

/// Find every start position where `pattern` occurs in `sequence` with at most
/// `max_mismatches` substitutions. Occurrences may overlap. Case-insensitive.
pub fn find_occurrences(sequence: &str, pattern: &str, max_mismatches: usize) -> Vec<usize> {
    let seq = sequence.as_bytes();
    let pat = pattern.as_bytes();
    if pat.is_empty() || seq.len() < pat.len() {
        return Vec::new();
    }

    if max_mismatches == 0 {
        let upper_seq = sequence.to_ascii_uppercase();
        let upper_pat = pattern.to_ascii_uppercase();
        let mut hits = Vec::new();
        let mut pos = 0;
        while let Some(idx) = upper_seq[pos..].find(&upper_pat) {
            let abs_pos = pos + idx;
            hits.push(abs_pos);
            pos = abs_pos + 1;
        }
        return hits;
    }

    seq.windows(pat.len())
        .enumerate()
        .filter(|(_, w)| hamming_within(w, pat, max_mismatches) <= max_mismatches)
        .map(|(i, _)| i)
        .collect()
}

/// Find a primer's binding sites on both strands of a contig.
///
/// Forward-strand sites are reported with `is_complement == false`; sites where
/// the reverse complement of the primer occurs on the sense strand are reported
/// with `is_complement == true`. A palindromic primer produces both kinds at the
/// same positions.
pub fn find_pattern(sequence: &str, pattern: &str, max_mismatches: usize) -> Vec<SequenceMatch> {
    let upper_pat = pattern.to_ascii_uppercase();
    let rc_pat = reverse_complement(&upper_pat);
    let bytes = sequence.as_bytes();

    let mut matches = Vec::new();
    for (pat, is_complement) in [(&upper_pat, false), (&rc_pat, true)] {
        for start in find_occurrences(sequence, pat, max_mismatches) {
            let end = start + pat.len();
            let site = &bytes[start..end];
            matches.push(SequenceMatch {
                start,
                end,
                matched: String::from_utf8_lossy(site).to_ascii_uppercase(),
                is_complement,
                mismatches: hamming_within(site, pat.as_bytes(), pat.len()),
            });
        }
    }

    matches.sort_by_key(|m| (m.start, m.is_complement));
    matches
}
