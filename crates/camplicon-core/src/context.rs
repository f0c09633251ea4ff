use crate::feature::FeatureType;
use crate::result::ProductSet;
use crate::sequence::Sequence;

/// Label the genes a pair amplifies in an annotated reference.
///
/// Takes the first product lying on a reference record (matched by contig name)
/// and lists every gene overlapping it as `locus_tag,gene`, with `-` for a
/// missing gene name. Returns `-` when no product falls on the reference.
pub fn locate(reference: &[Sequence], products: &ProductSet) -> String {
    let hit = products.products().find_map(|p| {
        reference
            .iter()
            .find(|record| record.name == p.contig)
            .map(|record| (record, p))
    });
    let Some((record, product)) = hit else {
        return "-".to_string();
    };

    let mut labels = Vec::new();
    for feature in record
        .features
        .iter()
        .filter(|f| f.feature_type == FeatureType::Gene)
        .filter(|f| f.location.overlaps(product.start, product.end))
    {
        if let Some(tag) = feature.get_qualifier("locus_tag") {
            labels.push(tag);
        }
        labels.push(feature.get_qualifier("gene").unwrap_or("-"));
    }

    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(",")
    }
}
