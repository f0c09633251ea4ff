use std::collections::HashSet;

use crate::primer::{PrimerCandidate, PrimerPair};

/// Lazily yield every unordered pair of distinct candidate sequences, once.
///
/// Candidates repeating an earlier sequence are ignored. Pair ids follow
/// generation order; the earlier candidate takes the forward role.
pub fn pair_combinations(candidates: &[PrimerCandidate]) -> impl Iterator<Item = PrimerPair> + '_ {
    let mut seen = HashSet::new();
    let distinct: Vec<&PrimerCandidate> = candidates
        .iter()
        .filter(|c| seen.insert(c.sequence.as_str()))
        .collect();

    let n = distinct.len();
    (0..n)
        .flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
        .enumerate()
        .filter_map(move |(id, (i, j))| {
            PrimerPair::new(id, distinct[i].clone(), distinct[j].clone()).ok()
        })
}

/// All pairs from `candidates`; N distinct sequences give N·(N−1)/2 pairs.
pub fn build_pairs(candidates: &[PrimerCandidate]) -> Vec<PrimerPair> {
    pair_combinations(candidates).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn candidates(seqs: &[&str]) -> Vec<PrimerCandidate> {
        seqs.iter()
            .enumerate()
            .map(|(i, s)| PrimerCandidate::new(i.to_string(), s).unwrap())
            .collect()
    }

    #[test]
    fn test_pair_count_is_n_choose_2() {
        let cands = candidates(&["AAAAA", "CCCCC", "GGGGG", "TTTTT", "ACACA"]);
        let pairs = build_pairs(&cands);
        assert_eq!(pairs.len(), 5 * 4 / 2);

        let keys: HashSet<_> = pairs.iter().map(|p| p.key()).collect();
        assert_eq!(keys.len(), pairs.len());
        assert!(pairs.iter().all(|p| p.forward.sequence != p.reverse.sequence));
    }

    #[test]
    fn test_duplicate_candidates_collapse() {
        let cands = candidates(&["AAAAA", "CCCCC", "AAAAA"]);
        let pairs = build_pairs(&cands);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].forward.id, "0");
        assert_eq!(pairs[0].reverse.id, "1");
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(build_pairs(&[]).is_empty());
        assert!(build_pairs(&candidates(&["AAAAA"])).is_empty());
    }

    #[test]
    fn test_ids_are_sequential() {
        let cands = candidates(&["AAAAA", "CCCCC", "GGGGG"]);
        let ids: Vec<_> = pair_combinations(&cands).map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
