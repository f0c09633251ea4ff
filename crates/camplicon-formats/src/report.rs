//! Tabular outputs: the ranked pair table and the predicted product listings.

use std::collections::HashMap;

use camplicon_core::{Group, ProductSet, Ranked};

pub const PAIR_COLUMNS: [&str; 19] = [
    "rank",
    "pair_id",
    "fwd_id",
    "fwd_seq",
    "fwd_tm",
    "rev_id",
    "rev_seq",
    "rev_tm",
    "context",
    "n_targets",
    "n_seqs",
    "info",
    "penalty",
    "mean_len",
    "std_len",
    "off_targets",
    "off_seqs",
    "overlap",
    "score",
];

pub fn pairs_tsv(ranked: &[Ranked]) -> String {
    let mut out = PAIR_COLUMNS.join("\t");
    out.push('\n');
    for r in ranked {
        let pair = &r.result.pair;
        let stats = &r.result.stats;
        let row = [
            r.rank.to_string(),
            pair.id.to_string(),
            pair.forward.id.clone(),
            pair.forward.sequence.clone(),
            format!("{:.2}", pair.forward.melting_temp),
            pair.reverse.id.clone(),
            pair.reverse.sequence.clone(),
            format!("{:.2}", pair.reverse.melting_temp),
            r.context.clone(),
            stats.in_group.hit_count.to_string(),
            stats.in_group.distinct_products.to_string(),
            format!("{:.4}", stats.in_group.information_content),
            format!("{:.4}", pair.penalty),
            format!("{:.1}", stats.in_group.mean_length),
            format!("{:.2}", stats.in_group.stdev_length),
            stats.out_group.hit_count.to_string(),
            stats.out_group.distinct_products.to_string(),
            stats.overlap.shared.to_string(),
            format!("{:.4}", r.score),
        ];
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

/// `{prefix}_products.fasta` and `{prefix}_products.tab` contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListing {
    pub fasta: String,
    pub tab: String,
}

/// Number every distinct product sequence, in-group first, and list where each
/// one was predicted.
pub fn products(in_group: &ProductSet, out_group: &ProductSet) -> ProductListing {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut listing = ProductListing::default();

    for (group, set) in [(Group::In, in_group), (Group::Out, out_group)] {
        for product in set.products() {
            let next = index.len();
            let i = *index.entry(product.sequence.as_str()).or_insert_with(|| {
                listing
                    .fasta
                    .push_str(&format!(">Product{}_{}\n{}\n", next, product.length, product.sequence));
                next
            });
            listing.tab.push_str(&format!(
                "{}\t{}\t{}\tProduct{}\t{}\t{}\n",
                product.genome_id,
                product.contig,
                group.label(),
                i,
                product.start,
                product.end
            ));
        }
    }
    listing
}
