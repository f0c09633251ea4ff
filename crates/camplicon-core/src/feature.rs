use serde::{Deserialize, Serialize};

/// Feature keys the gene context lookup distinguishes; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Gene,
    Cds,
    Rrna,
    Trna,
    Source,
    #[serde(other)]
    Other,
}

impl FeatureType {
    pub fn from_genbank_key(key: &str) -> Self {
        match key.to_lowercase().as_str() {
            "gene" => FeatureType::Gene,
            "cds" => FeatureType::Cds,
            "rrna" => FeatureType::Rrna,
            "trna" => FeatureType::Trna,
            "source" => FeatureType::Source,
            _ => FeatureType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strand {
    Forward,
    Reverse,
    None,
}

/// Represents the location of a feature on the sequence, 0-based half-open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    /// Simple range: start..end
    Simple { start: usize, end: usize },
    /// Join of multiple ranges: join(1..100, 200..300)
    Join { ranges: Vec<(usize, usize)> },
}

impl Location {
    pub fn simple(start: usize, end: usize) -> Self {
        Location::Simple { start, end }
    }

    pub fn start(&self) -> usize {
        match self {
            Location::Simple { start, .. } => *start,
            Location::Join { ranges } => ranges.iter().map(|r| r.0).min().unwrap_or(0),
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Location::Simple { end, .. } => *end,
            Location::Join { ranges } => ranges.iter().map(|r| r.1).max().unwrap_or(0),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Location::Simple { start, end } => end.saturating_sub(*start),
            Location::Join { ranges } => ranges.iter().map(|(s, e)| e.saturating_sub(*s)).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any base of the closed interval `first..=last` lies inside this location.
    pub fn overlaps(&self, first: usize, last: usize) -> bool {
        let hit = |s: usize, e: usize| s <= last && first < e;
        match self {
            Location::Simple { start, end } => hit(*start, *end),
            Location::Join { ranges } => ranges.iter().any(|(s, e)| hit(*s, *e)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Qualifier {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub feature_type: FeatureType,
    pub location: Location,
    pub strand: Strand,
    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,
}

impl Feature {
    pub fn new(
        name: impl Into<String>,
        feature_type: FeatureType,
        start: usize,
        end: usize,
        strand: Strand,
    ) -> Self {
        Self {
            name: name.into(),
            feature_type,
            location: Location::simple(start, end),
            strand,
            qualifiers: Vec::new(),
        }
    }

    pub fn start(&self) -> usize {
        self.location.start()
    }

    pub fn end(&self) -> usize {
        self.location.end()
    }

    pub fn get_qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|q| q.key == key)
            .map(|q| q.value.as_str())
    }

    pub fn add_qualifier(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.qualifiers.push(Qualifier {
            key: key.into(),
            value: value.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_type_from_genbank() {
        assert_eq!(FeatureType::from_genbank_key("CDS"), FeatureType::Cds);
        assert_eq!(FeatureType::from_genbank_key("gene"), FeatureType::Gene);
        assert_eq!(FeatureType::from_genbank_key("tRNA"), FeatureType::Trna);
        assert_eq!(
            FeatureType::from_genbank_key("unknown_type"),
            FeatureType::Other
        );
    }

    #[test]
    fn test_location_simple() {
        let loc = Location::simple(100, 500);
        assert_eq!(loc.start(), 100);
        assert_eq!(loc.end(), 500);
        assert_eq!(loc.len(), 400);
    }

    #[test]
    fn test_location_join() {
        let loc = Location::Join {
            ranges: vec![(100, 200), (300, 400)],
        };
        assert_eq!(loc.start(), 100);
        assert_eq!(loc.end(), 400);
        assert_eq!(loc.len(), 200);
    }

    #[test]
    fn test_location_overlaps_closed_interval() {
        let loc = Location::simple(100, 200);
        assert!(loc.overlaps(50, 100));
        assert!(loc.overlaps(199, 250));
        assert!(!loc.overlaps(200, 250));
        assert!(!loc.overlaps(10, 99));

        let join = Location::Join {
            ranges: vec![(0, 10), (50, 60)],
        };
        assert!(!join.overlaps(20, 40));
        assert!(join.overlaps(20, 55));
    }

    #[test]
    fn test_feature_qualifiers() {
        let mut f = Feature::new("dnaA", FeatureType::Gene, 100, 800, Strand::Forward);
        f.add_qualifier("locus_tag", "b0001");
        assert_eq!(f.get_qualifier("locus_tag"), Some("b0001"));
        assert_eq!(f.get_qualifier("gene"), None);
        assert_eq!(f.start(), 100);
        assert_eq!(f.end(), 800);
    }
}
